use askama::Template;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{Message, SmtpTransport, Transport};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::listing::JobListing;

pub const SUBJECT: &str = "Daily Newsletter";

/// Contents of the credentials file, `{"User": ..., "Password": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "Password")]
    pub password: String,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self> {
        info!("READ CREDENTIALS FROM: {}", path.display());
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

pub struct OfferLine {
    pub title: String,
    pub link: String,
    pub date: String,
}

#[derive(Template)]
#[template(path = "newsletter.html")]
pub struct Newsletter<'a> {
    pub header_cid: &'a str,
    pub logo_cid: &'a str,
    pub offers: Vec<OfferLine>,
}

impl<'a> Newsletter<'a> {
    pub fn new(header_cid: &'a str, logo_cid: &'a str, active: &[JobListing]) -> Self {
        let offers = active
            .iter()
            .map(|job| OfferLine {
                title: job.title.clone(),
                link: job.link.clone(),
                date: job.date_text(),
            })
            .collect();
        Newsletter {
            header_cid,
            logo_cid,
            offers,
        }
    }
}

/// Where finished messages go.
pub trait Outbox {
    fn deliver(&self, message: &Message) -> Result<()>;
}

/// Authenticated SMTP over STARTTLS.
pub struct SmtpOutbox {
    transport: SmtpTransport,
}

impl SmtpOutbox {
    pub fn new(host: &str, port: u16, credentials: &Credentials) -> Result<Self> {
        let transport = SmtpTransport::starttls_relay(host)?
            .port(port)
            .credentials(SmtpCredentials::new(
                credentials.user.clone(),
                credentials.password.clone(),
            ))
            .build();
        Ok(SmtpOutbox { transport })
    }
}

impl Outbox for SmtpOutbox {
    fn deliver(&self, message: &Message) -> Result<()> {
        self.transport.send(message)?;
        Ok(())
    }
}

/// Everything that goes into one digest mail.
pub struct Digest<'a> {
    pub from: &'a str,
    pub to: &'a [String],
    pub html: String,
    /// (content-id, path) pairs referenced from the html.
    pub inline_images: &'a [(String, PathBuf)],
    pub attachments: &'a [PathBuf],
}

impl Digest<'_> {
    pub fn build(&self) -> Result<Message> {
        if self.to.is_empty() {
            return Err(Error::Config("no receivers configured".to_string()));
        }

        info!("GENERATE MAIL");
        let mut related = MultiPart::related().singlepart(SinglePart::html(self.html.clone()));
        for (cid, path) in self.inline_images {
            let body = fs::read(path)?;
            related = related.singlepart(Attachment::new_inline(cid.clone()).body(body, content_type_for(path)?));
        }

        info!("ATTACH MAIL DATA");
        let mut mixed = MultiPart::mixed().multipart(related);
        for path in self.attachments {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "data.csv".to_string());
            let body = fs::read(path)?;
            mixed = mixed.singlepart(Attachment::new(name).body(body, content_type_for(path)?));
        }

        let mut builder = Message::builder()
            .from(self.from.parse::<Mailbox>()?)
            .subject(SUBJECT);
        for receiver in self.to {
            builder = builder.to(receiver.parse::<Mailbox>()?);
        }
        Ok(builder.multipart(mixed)?)
    }
}

fn content_type_for(path: &Path) -> Result<ContentType> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "csv" => "text/csv; charset=utf-8",
        _ => "application/octet-stream",
    };
    ContentType::parse(mime).map_err(|e| Error::Mail(format!("{}: {}", mime, e)))
}
