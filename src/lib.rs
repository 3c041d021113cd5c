pub mod config;
pub mod dates;
pub mod error;
pub mod export;
pub mod extractor;
pub mod fetcher;
pub mod filter;
pub mod listing;
pub mod logger;
pub mod mailer;
pub mod pipeline;

// Exporting types for convenience
pub use config::Settings;
pub use error::{Error, Result};
pub use extractor::Extractor;
pub use fetcher::{HttpFetcher, PageSource};
pub use listing::{Expiration, JobListing};
