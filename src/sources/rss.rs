//! Feed-backed adapter (Ministerio de Justicia exposes a category RSS
//! feed). The feed supplies link, title and date; the article page is
//! still fetched for the full body.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::warn;

use crate::fetch;
use crate::model::Article;

use super::{dedupe_links, fetch_standard, title_passes, LinkItem, SourceAdapter, SourceConfig};

pub struct RssAdapter {
    client: Client,
    source: &'static SourceConfig,
}

impl RssAdapter {
    pub fn new(client: Client, source: &'static SourceConfig) -> Self {
        RssAdapter { client, source }
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    fn source(&self) -> &SourceConfig {
        self.source
    }

    async fn list_recent(&self, max_items: usize) -> Vec<LinkItem> {
        let body = match fetch::get_text(&self.client, self.source.listing_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(source = self.source.code, error = %e, "feed fetch failed");
                return Vec::new();
            }
        };
        let feed = match feed_rs::parser::parse(body.as_bytes()) {
            Ok(feed) => feed,
            Err(e) => {
                warn!(source = self.source.code, error = %e, "feed parse failed");
                return Vec::new();
            }
        };
        let links = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let origin_url = entry.links.first().map(|l| l.href.clone())?;
                let title = entry.title.map(|t| t.content).unwrap_or_default();
                if !title_passes(self.source, &title) {
                    return None;
                }
                Some(LinkItem {
                    origin_url,
                    title,
                    published_hint: entry.published.or(entry.updated).map(|d| d.with_timezone(&Utc)),
                })
            })
            .collect();
        dedupe_links(links, max_items)
    }

    async fn fetch_full(&self, link: &LinkItem, now: DateTime<Utc>) -> Option<Article> {
        fetch_standard(&self.client, self.source, link, now).await
    }
}
