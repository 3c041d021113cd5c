use deunicode::deunicode;
use log::info;
use scraper::{ElementRef, Html, Selector};

use crate::dates::{DateNormalizer, MonthTable};
use crate::error::Result;
use crate::fetcher::{resolve, PageSource};
use crate::listing::{Expiration, JobListing};

/// Hrefs this short are placeholders, never real offer links.
pub const MIN_HREF_LEN: usize = 5;

/// An anchor from the listing page that looks like a job offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingAnchor {
    /// ASCII-folded `title` attribute.
    pub title: String,
    pub href: String,
}

pub struct Extractor {
    anchor_selector: Selector,
    underline_selector: Selector,
    dates: DateNormalizer,
}

impl Extractor {
    pub fn new(months: MonthTable) -> Self {
        Extractor {
            anchor_selector: Selector::parse("a").expect("static selector"),
            underline_selector: Selector::parse("u").expect("static selector"),
            dates: DateNormalizer::new(months),
        }
    }

    /// Offer anchors of the listing page, in document order.
    ///
    /// Anchors without a `title` are not offers. Anchors whose `href` is
    /// missing or no longer than [`MIN_HREF_LEN`] are dropped too.
    pub fn anchors<'a>(&'a self, doc: &'a Html) -> impl Iterator<Item = ListingAnchor> + 'a {
        doc.select(&self.anchor_selector).filter_map(|a| {
            let title = deunicode(a.value().attr("title")?);
            info!("{}", title);
            let href = a.value().attr("href")?;
            if href.chars().count() <= MIN_HREF_LEN {
                return None;
            }
            Some(ListingAnchor {
                title,
                href: href.to_string(),
            })
        })
    }

    /// Expiration of an offer, read from the last underline node of its
    /// detail page. Pages with fewer than two underline nodes carry none.
    pub fn expiration(&self, detail: &Html) -> Expiration {
        let underlined: Vec<ElementRef> = detail.select(&self.underline_selector).collect();
        let [_, .., last] = underlined.as_slice() else {
            return Expiration::Missing;
        };

        let raw = squash(&last.text().collect::<String>());
        info!("PROCESSING DATE...");
        match self.dates.parse(&raw) {
            Ok((date, time)) => Expiration::Parsed { date, time },
            Err(_) => Expiration::Unparsed(raw),
        }
    }

    /// Walk the listing page and every offer's detail page.
    ///
    /// Any fetch failure aborts the walk.
    pub fn extract_listings<S>(&self, source: &S, listing_url: &str, listing: &Html) -> Result<Vec<JobListing>>
    where
        S: PageSource + ?Sized,
    {
        let mut jobs = Vec::new();
        for anchor in self.anchors(listing) {
            let detail_url = resolve(listing_url, &anchor.href)?;
            let detail = source.fetch(&detail_url)?;
            let expiration = self.expiration(&detail);
            jobs.push(JobListing::new(anchor.title, anchor.href, expiration).with_link(detail_url));
        }
        Ok(jobs)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new(MonthTable::spanish())
    }
}

/// Collapse runs of whitespace (including non-breaking spaces) to one space.
fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
