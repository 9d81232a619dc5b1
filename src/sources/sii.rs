//! SII newsroom. The index page embeds article codes of the form
//! `DDMMYYnotiNNxxx`; each code maps to a flat `.htm` page next to the
//! index. The six leading digits double as a date hint, which gives the
//! listing a usable order.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::warn;

use crate::fetch;
use crate::model::Article;

use super::{dedupe_links, fetch_standard, LinkItem, SourceAdapter, SourceConfig};

static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{6}noti\d{2}[a-z]{2,4})\b").unwrap());

pub struct SiiAdapter {
    client: Client,
    source: &'static SourceConfig,
}

impl SiiAdapter {
    pub fn new(client: Client, source: &'static SourceConfig) -> Self {
        SiiAdapter { client, source }
    }
}

#[async_trait]
impl SourceAdapter for SiiAdapter {
    fn source(&self) -> &SourceConfig {
        self.source
    }

    async fn list_recent(&self, max_items: usize) -> Vec<LinkItem> {
        let html = match fetch::get_text(&self.client, self.source.listing_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(source = self.source.code, error = %e, "listing fetch failed");
                return Vec::new();
            }
        };
        let mut links = mine_codes(self.source, &html);
        links.sort_by(|a, b| b.published_hint.cmp(&a.published_hint));
        dedupe_links(links, max_items)
    }

    async fn fetch_full(&self, link: &LinkItem, now: DateTime<Utc>) -> Option<Article> {
        fetch_standard(&self.client, self.source, link, now).await
    }
}

fn mine_codes(source: &SourceConfig, html: &str) -> Vec<LinkItem> {
    CODE_RE
        .captures_iter(html)
        .filter_map(|c| {
            let code = c.get(1)?.as_str();
            Some(LinkItem {
                origin_url: article_url(source.listing_url, code),
                title: String::new(),
                published_hint: date_from_code(code),
            })
        })
        .collect()
}

fn article_url(listing_url: &str, code: &str) -> String {
    match listing_url.rfind('/') {
        Some(i) => format!("{}/{}.htm", &listing_url[..i], code),
        None => format!("{}.htm", code),
    }
}

/// Decodes the DDMMYY prefix. Two-digit years below 50 land in 2000+.
fn date_from_code(code: &str) -> Option<DateTime<Utc>> {
    let digits = code.get(..6)?;
    let d: u32 = digits.get(..2)?.parse().ok()?;
    let m: u32 = digits.get(2..4)?.parse().ok()?;
    let y: u32 = digits.get(4..6)?.parse().ok()?;
    let year = if y < 50 { 2000 + y } else { 1900 + y } as i32;
    match Utc.with_ymd_and_hms(year, m, d, 0, 0, 0) {
        chrono::LocalResult::Single(dt) => Some(dt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::catalog;
    use chrono::Datelike;

    #[test]
    fn mines_codes_into_article_urls_newest_first() {
        let src = catalog::find("sii").unwrap();
        let html = r#"
          <a href="010825noti01aav.htm">Nota uno</a>
          <a href="120825noti02bcd.htm">Nota dos</a>
          <a href="120825noti02bcd.htm">Nota dos repetida</a>
          <span>texto sin codigo</span>"#;
        let mut links = mine_codes(src, html);
        links.sort_by(|a, b| b.published_hint.cmp(&a.published_hint));
        let links = dedupe_links(links, 10);
        assert_eq!(links.len(), 2);
        assert_eq!(
            links[0].origin_url,
            "https://www.sii.cl/noticias/2025/120825noti02bcd.htm"
        );
        let hint = links[0].published_hint.unwrap();
        assert_eq!((hint.year(), hint.month(), hint.day()), (2025, 8, 12));
    }

    #[test]
    fn code_with_invalid_date_still_yields_a_link() {
        let src = catalog::find("sii").unwrap();
        let links = mine_codes(src, "990925noti01xyz");
        assert_eq!(links.len(), 1);
        assert!(links[0].published_hint.is_none());
    }
}
