use askama::Template;
use chrono::{Local, NaiveDate, NaiveDateTime};
use log::info;
use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::export::{self, ACTIVE_FILE, LAST_PAGE_FILE};
use crate::extractor::Extractor;
use crate::fetcher::PageSource;
use crate::filter::ActiveFilter;
use crate::listing::{JobListing, HEADERS};
use crate::mailer::{Credentials, Digest, Newsletter, Outbox};

/// What a run produced.
#[derive(Debug)]
pub struct RunReport {
    pub all: Vec<JobListing>,
    pub active: Vec<JobListing>,
    pub last_page_file: PathBuf,
    pub active_file: PathBuf,
}

/// Fetch the listing page and every offer behind it.
pub fn collect<S>(settings: &Settings, source: &S, extractor: &Extractor) -> Result<Vec<JobListing>>
where
    S: PageSource + ?Sized,
{
    info!("PARSED WEB: {}", settings.source_url);
    let listing = source.fetch(&settings.source_url)?;
    let jobs = extractor.extract_listings(source, &settings.source_url, &listing)?;
    info!("DATA EXTRACTED");
    Ok(jobs)
}

/// Write the full listing and the active offers. Returns both paths, in
/// that order.
pub fn export_listings(settings: &Settings, all: &[JobListing], active: &[JobListing]) -> Result<(PathBuf, PathBuf)> {
    export::ensure_output_dir(&settings.output_dir)?;
    let last_page_file = settings.output_dir.join(LAST_PAGE_FILE);
    let active_file = settings.output_dir.join(ACTIVE_FILE);

    info!("EXPORT LAST PAGE OFFERS TO: {}", last_page_file.display());
    export::write_delimited(&last_page_file, all.iter().map(JobListing::to_record), Some(&HEADERS[..]))?;

    info!("EXPORT ACTIVE OFFERS TO: {}", active_file.display());
    export::write_delimited(&active_file, active.iter().map(JobListing::to_record), Some(&HEADERS[..]))?;

    Ok((last_page_file, active_file))
}

/// The whole run: scrape, filter against `today`, export and mail.
///
/// `connect` opens the outbox once credentials are known.
pub fn run<S, O, F>(settings: &Settings, source: &S, today: NaiveDate, connect: F) -> Result<RunReport>
where
    S: PageSource + ?Sized,
    O: Outbox,
    F: FnOnce(&Settings, &Credentials) -> Result<O>,
{
    let extractor = Extractor::default();
    let all = collect(settings, source, &extractor)?;

    info!("FILTER ACTIVE OFFERS");
    let active = ActiveFilter::new().active_offers(&all, today);
    info!("{} offers found, {} still open", all.len(), active.len());

    let (last_page_file, active_file) = export_listings(settings, &all, &active)?;

    info!("SEND RESULTS BY MAIL");
    let credentials = Credentials::load(&settings.cred_path)?;

    let [(header_cid, _), (logo_cid, _)] = settings.images.as_slice() else {
        return Err(Error::Config("expected a header and a logo image".to_string()));
    };
    let html = Newsletter::new(header_cid, logo_cid, &active).render()?;

    let attachments = vec![active_file.clone(), last_page_file.clone()];
    let message = Digest {
        from: &credentials.user,
        to: &settings.receivers,
        html,
        inline_images: &settings.images,
        attachments: &attachments,
    }
    .build()?;

    let outbox = connect(settings, &credentials)?;
    info!("SEND IT TO {:?}", settings.receivers);
    outbox.deliver(&message)?;

    Ok(RunReport {
        all,
        active,
        last_page_file,
        active_file,
    })
}

/// Human readable run length, e.g. `"2 minutes and 5 seconds (125 seconds total)."`.
pub fn describe_duration(total_secs: i64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!(
            "{} hours and {} minutes and {} seconds ({} seconds total).",
            hours, minutes, seconds, total_secs
        )
    } else {
        format!("{} minutes and {} seconds ({} seconds total).", minutes, seconds, total_secs)
    }
}

pub struct RunClock {
    started: NaiveDateTime,
}

impl RunClock {
    pub fn start() -> Self {
        RunClock {
            started: Local::now().naive_local(),
        }
    }

    pub fn finish(self) {
        let stopped = Local::now().naive_local();
        let total = (stopped - self.started).num_seconds();
        info!("Start={}", self.started.format("%Y-%m-%d %H:%M:%S"));
        info!("Stop ={}", stopped.format("%Y-%m-%d %H:%M:%S"));
        info!("Processing ended after {}", describe_duration(total));
        info!("-------------------  END  -------------------");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::StaticPages;
    use lettre::Message;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Default, Clone)]
    struct RecordingOutbox {
        sent: Rc<RefCell<Vec<String>>>,
    }

    impl Outbox for RecordingOutbox {
        fn deliver(&self, message: &Message) -> Result<()> {
            self.sent
                .borrow_mut()
                .push(String::from_utf8_lossy(&message.formatted()).into_owned());
            Ok(())
        }
    }

    struct RefusingOutbox;

    impl Outbox for RefusingOutbox {
        fn deliver(&self, _message: &Message) -> Result<()> {
            Err(Error::Mail("relay refused the message".to_string()))
        }
    }

    fn settings_in(dir: &TempDir) -> Settings {
        let root = dir.path();
        fs::write(root.join("squares.gif"), b"GIF89a").unwrap();
        fs::write(root.join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        fs::write(
            root.join("cred.json"),
            r#"{"User": "bot@example.com", "Password": "secret"}"#,
        )
        .unwrap();

        Settings {
            source_url: "http://jobs.test/empleo/".to_string(),
            output_dir: root.join("output"),
            cred_path: root.join("cred.json"),
            receivers: vec!["seeker@example.com".to_string()],
            log_dir: root.join("logging"),
            images: vec![
                ("header".to_string(), root.join("squares.gif")),
                ("logo".to_string(), root.join("logo.png")),
            ],
            ..Settings::default()
        }
    }

    const LISTING: &str = r#"
        <html><body>
          <a href="http://jobs.test/empleo/sin-titulo">Sin titulo</a>
          <a title="Becario" href="abc">Corto</a>
          <a title="Técnico de laboratorio" href="http://jobs.test/empleo/tecnico">Oferta</a>
        </body></html>
    "#;

    const EXPIRED_DETAIL: &str = r#"
        <html><body>
          <p><u>Referencia</u></p>
          <p><u>Plazo: hasta las 14:00 horas del 5 de enero de 2030</u></p>
        </body></html>
    "#;

    #[test]
    fn expired_offer_is_listed_but_not_active() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(&dir);
        let pages = StaticPages::new()
            .with_page("http://jobs.test/empleo/", LISTING)
            .with_page("http://jobs.test/empleo/tecnico", EXPIRED_DETAIL);
        let outbox = RecordingOutbox::default();
        let sent = outbox.sent.clone();
        let today = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();

        let report = run(&settings, &pages, today, |_, _| Ok(outbox)).unwrap();

        assert_eq!(report.all.len(), 1);
        assert_eq!(report.all[0].title, "Tecnico de laboratorio");
        assert!(report.active.is_empty());

        let full = fs::read_to_string(&report.last_page_file).unwrap();
        assert_eq!(
            full.lines().collect::<Vec<_>>(),
            vec![
                "Puesto;Link;Fecha;Hora",
                "Tecnico de laboratorio;http://jobs.test/empleo/tecnico;05/01/2030;14:00",
            ]
        );
        let active = fs::read_to_string(&report.active_file).unwrap();
        assert_eq!(active.lines().collect::<Vec<_>>(), vec!["Puesto;Link;Fecha;Hora"]);

        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Subject: Daily Newsletter"));
        assert!(sent[0].contains("fisevi_scraper_update.csv"));
    }

    #[test]
    fn open_offer_is_active() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(&dir);
        let pages = StaticPages::new()
            .with_page("http://jobs.test/empleo/", LISTING)
            .with_page("http://jobs.test/empleo/tecnico", EXPIRED_DETAIL);
        let today = NaiveDate::from_ymd_opt(2030, 1, 5).unwrap();

        let report = run(&settings, &pages, today, |_, _| Ok(RecordingOutbox::default())).unwrap();
        assert_eq!(report.active.len(), 1);
    }

    #[test]
    fn listing_fetch_failure_aborts_before_export() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(&dir);
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        let err = run(&settings, &StaticPages::new(), today, |_, _| Ok(RecordingOutbox::default())).unwrap_err();
        assert!(matches!(err, Error::Status { status: 404, .. }));
        assert!(!settings.output_dir.exists());
    }

    #[test]
    fn missing_credentials_abort_after_export() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings_in(&dir);
        settings.cred_path = dir.path().join("absent.json");
        let pages = StaticPages::new().with_page("http://jobs.test/empleo/", LISTING).with_page(
            "http://jobs.test/empleo/tecnico",
            "<p>sin fecha</p>",
        );
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        let err = run(&settings, &pages, today, |_, _| Ok(RecordingOutbox::default())).unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        let full = fs::read_to_string(settings.output_dir.join(LAST_PAGE_FILE)).unwrap();
        assert!(full.ends_with("Tecnico de laboratorio;http://jobs.test/empleo/tecnico;\n"));
    }

    #[test]
    fn failed_send_aborts_after_both_files_are_written() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(&dir);
        let pages = StaticPages::new()
            .with_page("http://jobs.test/empleo/", LISTING)
            .with_page("http://jobs.test/empleo/tecnico", EXPIRED_DETAIL);
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        let err = run(&settings, &pages, today, |_, _| Ok(RefusingOutbox)).unwrap_err();
        assert!(matches!(err, Error::Mail(ref m) if m == "relay refused the message"));
        assert!(settings.output_dir.join(LAST_PAGE_FILE).is_file());
        assert!(settings.output_dir.join(ACTIVE_FILE).is_file());
    }

    #[test]
    fn digest_links_relative_offers_absolutely() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(&dir);
        let pages = StaticPages::new()
            .with_page(
                "http://jobs.test/empleo/",
                r#"<a title="Oferta" href="/empleo/oferta-1">Oferta</a>"#,
            )
            .with_page(
                "http://jobs.test/empleo/oferta-1",
                "<u>Ref</u><u>vence a las 10:30 el 5 de enero de 2030</u>",
            );
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        let all = collect(&settings, &pages, &Extractor::default()).unwrap();
        assert_eq!(all[0].to_record(), vec!["Oferta", "/empleo/oferta-1", "05/01/2030", "10:30"]);

        let active = ActiveFilter::new().active_offers(&all, today);
        let html = Newsletter::new("header", "logo", &active).render().unwrap();
        assert!(html.contains(r#"<a href="http://jobs.test/empleo/oferta-1""#));
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(describe_duration(125), "2 minutes and 5 seconds (125 seconds total).");
        assert_eq!(
            describe_duration(3725),
            "1 hours and 2 minutes and 5 seconds (3725 seconds total)."
        );
    }
}
