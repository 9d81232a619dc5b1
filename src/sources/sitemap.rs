//! Sitemap-driven adapter (CDE publishes a WordPress post sitemap but
//! blocks its HTML listings behind scripts). Entries are ordered by
//! `lastmod` so the newest posts surface first; the page itself supplies
//! the real title.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use tracing::warn;

use crate::dates;
use crate::fetch;
use crate::model::Article;

use super::{dedupe_links, fetch_standard, LinkItem, SourceAdapter, SourceConfig};

pub struct SitemapAdapter {
    client: Client,
    source: &'static SourceConfig,
}

impl SitemapAdapter {
    pub fn new(client: Client, source: &'static SourceConfig) -> Self {
        SitemapAdapter { client, source }
    }
}

#[async_trait]
impl SourceAdapter for SitemapAdapter {
    fn source(&self) -> &SourceConfig {
        self.source
    }

    async fn list_recent(&self, max_items: usize) -> Vec<LinkItem> {
        let xml = match fetch::get_text(&self.client, self.source.listing_url).await {
            Ok(xml) => xml,
            Err(e) => {
                warn!(source = self.source.code, error = %e, "sitemap fetch failed");
                return Vec::new();
            }
        };
        let mut entries = match parse_sitemap(&xml) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(source = self.source.code, error = %e, "sitemap parse failed");
                return Vec::new();
            }
        };
        entries.retain(|e| is_post_url(self.source, &e.origin_url));
        entries.sort_by(|a, b| b.published_hint.cmp(&a.published_hint));
        dedupe_links(entries, max_items)
    }

    async fn fetch_full(&self, link: &LinkItem, now: DateTime<Utc>) -> Option<Article> {
        fetch_standard(&self.client, self.source, link, now).await
    }
}

fn parse_sitemap(xml: &str) -> anyhow::Result<Vec<LinkItem>> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    let mut in_loc = false;
    let mut in_lastmod = false;
    let mut loc = String::new();
    let mut lastmod: Option<DateTime<Utc>> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"loc" => in_loc = true,
                b"lastmod" => in_lastmod = true,
                b"url" => {
                    loc.clear();
                    lastmod = None;
                }
                _ => {}
            },
            Event::Text(t) => {
                let text = t.unescape()?.trim().to_string();
                if in_loc {
                    loc = text;
                } else if in_lastmod {
                    lastmod = dates::parse_date_text(&text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"loc" => in_loc = false,
                b"lastmod" => in_lastmod = false,
                b"url" => {
                    if !loc.is_empty() {
                        out.push(LinkItem {
                            origin_url: loc.clone(),
                            title: String::new(),
                            published_hint: lastmod,
                        });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// Keeps post permalinks, dropping the site root, category indexes and
/// nested sitemaps.
fn is_post_url(source: &SourceConfig, url: &str) -> bool {
    url.starts_with(source.base_url)
        && url.trim_end_matches('/') != source.base_url.trim_end_matches('/')
        && !url.contains("/category/")
        && !url.contains("/tag/")
        && !url.ends_with(".xml")
}
