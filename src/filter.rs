use chrono::NaiveDate;
use regex::Regex;

use crate::listing::{Expiration, JobListing};

pub struct ActiveFilter {
    date_shape: Regex,
}

impl ActiveFilter {
    pub fn new() -> Self {
        ActiveFilter {
            date_shape: Regex::new(r"^\d+/\d+/\d+$").expect("static pattern"),
        }
    }

    /// Offers still open on `today`, in their original order.
    ///
    /// Only offers with a parsed expiration date whose `DD/MM/YYYY` text has
    /// the `digits/digits/digits` shape are considered. An offer expiring
    /// today is still active.
    pub fn active_offers(&self, jobs: &[JobListing], today: NaiveDate) -> Vec<JobListing> {
        jobs.iter()
            .filter(|job| match &job.expiration {
                Expiration::Parsed { date, .. } => {
                    self.date_shape.is_match(&job.date_text()) && *date >= today
                }
                _ => false,
            })
            .cloned()
            .collect()
    }
}

impl Default for ActiveFilter {
    fn default() -> Self {
        ActiveFilter::new()
    }
}
