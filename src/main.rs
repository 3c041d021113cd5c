use fisevi_scraper_lib::mailer::SmtpOutbox;
use fisevi_scraper_lib::pipeline::{self, RunClock};
use fisevi_scraper_lib::{logger, HttpFetcher, Settings};

use chrono::Local;
use log::{error, info};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    logger::init(&Settings::log_dir_from_env())?;
    let clock = RunClock::start();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    let fetcher = HttpFetcher::new(&settings.user_agent, settings.timeout)?;
    let today = Local::now().date_naive();

    let report = pipeline::run(&settings, &fetcher, today, |s, creds| {
        SmtpOutbox::new(&s.smtp_host, s.smtp_port, creds)
    });

    match report {
        Ok(report) => {
            info!(
                "Mailed {} active offers out of {}",
                report.active.len(),
                report.all.len()
            );
            clock.finish();
            Ok(())
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            Err(e.into())
        }
    }
}
