//! Generic listing adapter for institution sites without feeds or
//! sitemaps (Contraloría, DPP, INAPI, Dirección del Trabajo). Article
//! links are anchors whose href contains one of the catalog needles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::warn;

use crate::cleaner;
use crate::dates;
use crate::fetch;
use crate::model::Article;

use super::{dedupe_links, fetch_standard, title_passes, LinkItem, SourceAdapter, SourceConfig};

const MIN_TITLE_CHARS: usize = 12;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

pub struct IndexAdapter {
    client: Client,
    source: &'static SourceConfig,
}

impl IndexAdapter {
    pub fn new(client: Client, source: &'static SourceConfig) -> Self {
        IndexAdapter { client, source }
    }
}

#[async_trait]
impl SourceAdapter for IndexAdapter {
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
        dedupe_links(parse_listing(self.source, &html), max_items)
    }

    async fn fetch_full(&self, link: &LinkItem, now: DateTime<Utc>) -> Option<Article> {
        fetch_standard(&self.client, self.source, link, now).await
    }
}

fn parse_listing(source: &SourceConfig, html: &str) -> Vec<LinkItem> {
    let doc = Html::parse_document(html);
    let mut out = Vec::new();
    for anchor in doc.select(&ANCHOR_SELECTOR) {
        let href = match anchor.value().attr("href") {
            Some(h) => h,
            None => continue,
        };
        if !source.link_needles.iter().any(|n| href.contains(n)) {
            continue;
        }
        // The listing page itself often matches its own needle.
        if href == source.listing_url {
            continue;
        }
        let raw_text = anchor.text().collect::<String>();
        let title = cleaner::clean_title(&raw_text);
        if title.chars().count() < MIN_TITLE_CHARS || !title_passes(source, &title) {
            continue;
        }
        let origin_url = match super::absolutize(source.listing_url, href) {
            Some(u) => u,
            None => continue,
        };
        if origin_url == source.listing_url {
            continue;
        }
        out.push(LinkItem {
            published_hint: dates::parse_date_text(&raw_text),
            origin_url,
            title,
        });
    }
    out
}
