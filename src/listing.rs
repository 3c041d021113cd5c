use chrono::{NaiveDate, NaiveTime};

pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const TIME_FORMAT: &str = "%H:%M";

/// Column headers of both exported files.
pub const HEADERS: [&str; 4] = ["Puesto", "Link", "Fecha", "Hora"];

/// What the detail page told us about when an offer expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiration {
    /// Fewer than two underline nodes on the detail page.
    Missing,
    /// Underline text was found but did not normalize to a date.
    Unparsed(String),
    Parsed { date: NaiveDate, time: NaiveTime },
}

/// One job offer taken from the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobListing {
    pub title: String,
    /// The href exactly as it appeared on the listing page.
    pub detail_url: String,
    /// Absolute address of the detail page.
    pub link: String,
    pub expiration: Expiration,
}

impl JobListing {
    pub fn new(title: impl Into<String>, detail_url: impl Into<String>, expiration: Expiration) -> Self {
        let detail_url = detail_url.into();
        JobListing {
            title: title.into(),
            link: detail_url.clone(),
            detail_url,
            expiration,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Positional record as written to the delimited files.
    ///
    /// A listing without underline nodes yields a single trailing empty field;
    /// an unparseable date yields empty date and time fields.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![self.title.clone(), self.detail_url.clone()];
        match &self.expiration {
            Expiration::Missing => record.push(String::new()),
            Expiration::Unparsed(_) => {
                record.push(String::new());
                record.push(String::new());
            }
            Expiration::Parsed { date, time } => {
                record.push(date.format(DATE_FORMAT).to_string());
                record.push(time.format(TIME_FORMAT).to_string());
            }
        }
        record
    }

    /// Expiration date as `DD/MM/YYYY`, empty when there is none.
    pub fn date_text(&self) -> String {
        match &self.expiration {
            Expiration::Parsed { date, .. } => date.format(DATE_FORMAT).to_string(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_expiration_has_one_trailing_empty_field() {
        let job = JobListing::new("Tecnico", "http://jobs.test/1", Expiration::Missing);
        assert_eq!(job.to_record(), vec!["Tecnico", "http://jobs.test/1", ""]);
        assert_eq!(job.date_text(), "");
    }

    #[test]
    fn record_keeps_raw_href_while_link_is_resolved() {
        let job = JobListing::new("Tecnico", "/empleo/1", Expiration::Missing)
            .with_link("http://jobs.test/empleo/1");
        assert_eq!(job.to_record()[1], "/empleo/1");
        assert_eq!(job.link, "http://jobs.test/empleo/1");
    }

    #[test]
    fn parsed_expiration_renders_date_and_time() {
        let job = JobListing::new(
            "Tecnico",
            "http://jobs.test/1",
            Expiration::Parsed {
                date: NaiveDate::from_ymd_opt(2030, 1, 5).unwrap(),
                time: NaiveTime::from_hms_opt(9, 5, 0).unwrap(),
            },
        );
        assert_eq!(job.to_record(), vec!["Tecnico", "http://jobs.test/1", "05/01/2030", "09:05"]);
        assert_eq!(job.date_text(), "05/01/2030");
    }

    #[test]
    fn unparsed_expiration_keeps_no_date() {
        let job = JobListing::new("Tecnico", "http://jobs.test/1", Expiration::Unparsed("pronto".into()));
        assert_eq!(job.to_record(), vec!["Tecnico", "http://jobs.test/1", "", ""]);
        assert_eq!(job.date_text(), "");
    }
}
