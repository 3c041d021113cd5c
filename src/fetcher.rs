use log::info;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use scraper::Html;
#[cfg(test)]
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Anything that can turn a URL into a parsed HTML document.
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<Html>;
}

/// Fetches pages over HTTP with a blocking client. No retries.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let ua = HeaderValue::from_str(user_agent)
            .map_err(|_| Error::Config(format!("invalid user agent {:?}", user_agent)))?;
        headers.insert(USER_AGENT, ua);

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Config(format!("could not build http client: {}", e)))?;

        Ok(HttpFetcher { client })
    }

    fn get_text(&self, url: &str) -> Result<String> {
        let http = |source| Error::Http {
            url: url.to_string(),
            source,
        };

        let resp = self.client.get(url).send().map_err(http)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().map_err(http)?;
        decode_body(url, body.to_vec())
    }
}

/// Page bodies must be UTF-8; anything else is a fetch error.
pub fn decode_body(url: &str, body: Vec<u8>) -> Result<String> {
    String::from_utf8(body).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}

impl PageSource for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Html> {
        info!("Fetching: {}", url);
        let text = self.get_text(url)?;
        Ok(Html::parse_document(&text))
    }
}

/// Serves pages from memory. Unknown URLs answer 404.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct StaticPages {
    pages: HashMap<String, String>,
}

#[cfg(test)]
impl StaticPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }
}

#[cfg(test)]
impl PageSource for StaticPages {
    fn fetch(&self, url: &str) -> Result<Html> {
        self.pages
            .get(url)
            .map(|html| Html::parse_document(html))
            .ok_or_else(|| Error::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Resolve `href` against the page it was found on. Absolute hrefs are kept
/// as they are.
pub fn resolve(base: &str, href: &str) -> Result<String> {
    if Url::parse(href).is_ok() {
        return Ok(href.to_string());
    }
    let base_url = Url::parse(base).map_err(|source| Error::Url {
        url: base.to_string(),
        source,
    })?;
    base_url
        .join(href)
        .map(|u| u.to_string())
        .map_err(|source| Error::Url {
            url: href.to_string(),
            source,
        })
}
