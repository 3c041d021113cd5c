use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const FISEVI_URL: &str = "http://fisevi.com/";
pub const OUTPUT_DIR: &str = "output";
pub const CRED_PATH: &str = "credentials.json";
pub const SMTP_CLIENT: &str = "smtp.gmail.com";
pub const SMTP_PORT: u16 = 587;
pub const LOG_DIR: &str = "logging";
pub const USER_AGENT: &str = "Mozilla/5.0";
pub const TIMEOUT_SECS: u64 = 30;
pub const HEADER_IMAGE: &str = "img/squares.gif";
pub const LOGO_IMAGE: &str = "img/logo-fisevi.png";

/// Everything a run needs to know about its surroundings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source_url: String,
    pub output_dir: PathBuf,
    pub cred_path: PathBuf,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub receivers: Vec<String>,
    pub log_dir: PathBuf,
    pub user_agent: String,
    pub timeout: Duration,
    /// Inline images as (content-id, path), in template order.
    pub images: Vec<(String, PathBuf)>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            source_url: FISEVI_URL.to_string(),
            output_dir: PathBuf::from(OUTPUT_DIR),
            cred_path: PathBuf::from(CRED_PATH),
            smtp_host: SMTP_CLIENT.to_string(),
            smtp_port: SMTP_PORT,
            receivers: Vec::new(),
            log_dir: PathBuf::from(LOG_DIR),
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(TIMEOUT_SECS),
            images: vec![
                ("header".to_string(), PathBuf::from(HEADER_IMAGE)),
                ("logo".to_string(), PathBuf::from(LOGO_IMAGE)),
            ],
        }
    }
}

impl Settings {
    /// Load settings from the environment (and `.env`, if present), falling
    /// back to the built-in constants.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Where the run log goes. Read on its own so logging can start before
    /// the rest of the settings are validated.
    pub fn log_dir_from_env() -> PathBuf {
        let _ = dotenvy::dotenv();
        log_dir_from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut s = Settings::default();

        if let Some(v) = lookup("FISEVI_URL") {
            s.source_url = v;
        }
        if let Some(v) = lookup("FISEVI_OUTPUT_DIR") {
            s.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("FISEVI_CRED_PATH") {
            s.cred_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("FISEVI_SMTP_HOST") {
            s.smtp_host = v;
        }
        if let Some(v) = lookup("FISEVI_SMTP_PORT") {
            s.smtp_port = v
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("FISEVI_SMTP_PORT must be a port number, got {:?}", v)))?;
        }
        if let Some(v) = lookup("FISEVI_RECEIVERS") {
            s.receivers = parse_receivers(&v);
        }
        s.log_dir = log_dir_from_lookup(&lookup);
        if let Some(v) = lookup("FISEVI_USER_AGENT") {
            s.user_agent = v;
        }
        if let Some(v) = lookup("FISEVI_TIMEOUT_SECS") {
            let secs: u64 = v
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("FISEVI_TIMEOUT_SECS must be whole seconds, got {:?}", v)))?;
            s.timeout = Duration::from_secs(secs);
        }

        Ok(s)
    }
}

fn log_dir_from_lookup<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("FISEVI_LOG_DIR").map_or_else(|| PathBuf::from(LOG_DIR), PathBuf::from)
}

fn parse_receivers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(|r| r.to_string())
        .collect()
}
