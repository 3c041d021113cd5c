use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run.
///
/// Date parsing failures are not represented here; they are absorbed by the
/// expiration extractor and surface as `Expiration::Unparsed`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not valid UTF-8: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("invalid url {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("could not read credentials: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not render mail body: {0}")]
    Template(#[from] askama::Error),

    #[error("could not build mail: {0}")]
    Mail(String),

    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<lettre::error::Error> for Error {
    fn from(err: lettre::error::Error) -> Self {
        Error::Mail(err.to_string())
    }
}

impl From<lettre::address::AddressError> for Error {
    fn from(err: lettre::address::AddressError) -> Self {
        Error::Mail(err.to_string())
    }
}
