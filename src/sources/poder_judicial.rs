//! Poder Judicial newsroom. The listing is a dense portal page, so link
//! discovery mines every anchor and keeps the ones that look like news:
//! long enough title, allowlisted vocabulary or a newsroom path, nothing
//! from the administrative blocklist.

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

const MIN_TITLE_CHARS: usize = 20;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

pub struct PoderJudicialAdapter {
    client: Client,
    source: &'static SourceConfig,
}

impl PoderJudicialAdapter {
    pub fn new(client: Client, source: &'static SourceConfig) -> Self {
        PoderJudicialAdapter { client, source }
    }
}

#[async_trait]
impl SourceAdapter for PoderJudicialAdapter {
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
        let mut links = parse_listing(self.source, &html);
        // Newest first when the listing exposes dates next to the anchors.
        links.sort_by(|a, b| b.published_hint.cmp(&a.published_hint));
        dedupe_links(links, max_items)
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
        let title = cleaner::clean_title(&anchor.text().collect::<String>());
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }
        if has_exclusion(source, &title) {
            continue;
        }
        // Links outside the newsroom path must earn their place through
        // the keyword allowlist.
        let newsroom_path = source.link_needles.iter().any(|n| href.contains(n));
        if !newsroom_path && !title_passes(source, &title) {
            continue;
        }
        let origin_url = match super::absolutize(source.listing_url, href) {
            Some(u) => u,
            None => continue,
        };
        let published_hint = dates::parse_date_text(&anchor.text().collect::<String>());
        out.push(LinkItem {
            origin_url,
            title,
            published_hint,
        });
    }
    out
}

fn has_exclusion(source: &SourceConfig, title: &str) -> bool {
    let lower = title.to_lowercase();
    source.exclusions.iter().any(|e| lower.contains(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::catalog;

    #[test]
    fn listing_keeps_newsroom_links_and_filters_noise() {
        let src = catalog::find("poder_judicial").unwrap();
        let html = r#"<html><body>
          <a href="/noticias-del-poder-judicial/corte-confirma-condena">
            Corte Suprema confirma condena en caso emblemático 12-08-2025</a>
          <a href="/noticias-del-poder-judicial/corte-confirma-condena">
            Corte Suprema confirma condena en caso emblemático 12-08-2025</a>
          <a href="/transparencia">Transparencia</a>
          <a href="/avisos/remates">Remate de propiedades en la Región Metropolitana</a>
          <a href="/otra-seccion/seminario">Seminario internacional sobre justicia y sentencias</a>
        </body></html>"#;
        let links = parse_listing(src, html);
        let urls: Vec<_> = links.iter().map(|l| l.origin_url.as_str()).collect();
        assert!(urls
            .iter()
            .all(|u| !u.contains("transparencia") && !u.contains("remates")));
        // The newsroom link survives with its listing date as a hint.
        let news = links
            .iter()
            .find(|l| l.origin_url.contains("corte-confirma-condena"))
            .unwrap();
        assert_eq!(news.title, "Corte Suprema confirma condena en caso emblemático");
        assert!(news.published_hint.is_some());
        // Off-newsroom links pass only via the keyword allowlist.
        assert!(urls.iter().any(|u| u.contains("seminario")));
    }

    #[test]
    fn short_anchor_text_is_skipped() {
        let src = catalog::find("poder_judicial").unwrap();
        let html = r#"<a href="/noticias-del-poder-judicial/x">Corte</a>"#;
        assert!(parse_listing(src, &format!("<html><body>{}</body></html>", html)).is_empty());
    }
}
