//! Source adapters: one listing strategy per institution family, all
//! normalizing into the same [`Article`] record.
//!
//! HTML parsing happens only inside synchronous helpers; a parsed
//! `scraper::Html` is never held across an await point, which keeps the
//! adapter futures `Send`.

pub mod catalog;
mod index;
mod poder_judicial;
mod rss;
mod sii;
mod sitemap;
mod wordpress;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

use crate::classify;
use crate::cleaner;
use crate::config::Config;
use crate::dates;
use crate::fetch;
use crate::model::Article;

pub use catalog::{SourceConfig, SourceKind, CATALOG};

/// One article link discovered on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkItem {
    pub origin_url: String,
    pub title: String,
    /// Publication date seen on the listing itself, if any. Used when
    /// the article page yields no date of its own.
    pub published_hint: Option<DateTime<Utc>>,
}

/// The contract every source implements. Both operations absorb their
/// own failures: a broken listing returns an empty vec, a broken page
/// returns `None`, and the orchestrator only counts the outcome.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> &SourceConfig;

    /// Discovers up to `max_items` candidate links, newest first where
    /// the source exposes an order.
    async fn list_recent(&self, max_items: usize) -> Vec<LinkItem>;

    /// Fetches one article page and normalizes it into a record.
    async fn fetch_full(&self, link: &LinkItem, now: DateTime<Utc>) -> Option<Article>;
}

/// Builds adapters for every enabled catalog source over one shared client.
pub fn build_adapters(cfg: &Config) -> anyhow::Result<Vec<Box<dyn SourceAdapter>>> {
    let client = fetch::build_client(cfg.http_timeout_secs)?;
    let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();
    for source in CATALOG {
        if !cfg.source_enabled(source.code) {
            warn!(source = source.code, "source disabled by configuration");
            continue;
        }
        adapters.push(match source.kind {
            SourceKind::PoderJudicial => {
                Box::new(poder_judicial::PoderJudicialAdapter::new(client.clone(), source))
            }
            SourceKind::Index => Box::new(index::IndexAdapter::new(client.clone(), source)),
            SourceKind::Sitemap => Box::new(sitemap::SitemapAdapter::new(client.clone(), source)),
            SourceKind::Rss => Box::new(rss::RssAdapter::new(client.clone(), source)),
            SourceKind::SiiCodes => Box::new(sii::SiiAdapter::new(client.clone(), source)),
            SourceKind::WordPress => {
                Box::new(wordpress::WordPressAdapter::new(client.clone(), source))
            }
        });
    }
    Ok(adapters)
}

/// Standard fetch path shared by most adapters: GET the page, parse it,
/// normalize. Failures are logged and swallowed.
pub(crate) async fn fetch_standard(
    client: &Client,
    source: &SourceConfig,
    link: &LinkItem,
    now: DateTime<Utc>,
) -> Option<Article> {
    let html = match fetch::get_text(client, &link.origin_url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(source = source.code, url = %link.origin_url, error = %e, "article fetch failed");
            return None;
        }
    };
    page_to_article(source, &html, link, now)
}

static TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["h1", ".entry-title", ".titulo-noticia", "h2.titulo", "title"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body p").unwrap());
static OG_IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());
static IMG_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article img", ".entry-content img", ".noticia-imagen img", ".noticia-imagen"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static AUTHOR_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [".author", ".entry-author", ".autor"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static META_AUTHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="author"]"#).unwrap());

/// Synchronous normalization of an article page into a record.
pub(crate) fn page_to_article(
    source: &SourceConfig,
    html: &str,
    link: &LinkItem,
    now: DateTime<Utc>,
) -> Option<Article> {
    let doc = Html::parse_document(html);

    let raw_title = if link.title.trim().is_empty() {
        extract_title(&doc)?
    } else {
        link.title.clone()
    };
    let base_title = cleaner::clean_title(&raw_title);
    if base_title.is_empty() {
        return None;
    }
    let title = match source.title_prefix {
        Some(prefix) if !base_title.starts_with(prefix) => format!("{} {}", prefix, base_title),
        _ => base_title.clone(),
    };

    let raw_body = extract_body(&doc, source.body_selectors);
    let body = cleaner::dedupe_title_prefix(&base_title, &cleaner::clean_body(&raw_body));

    let published_at = dates::extract_date(&doc, &link.origin_url)
        .or(link.published_hint)
        .unwrap_or(now);
    let image_url = extract_image(&doc, &link.origin_url);
    let author = extract_author(&doc);

    let cls = classify::classify(
        &format!("{} {}", title, body),
        source.category,
        source.jurisdiction,
        source.document_type,
    );
    let mut article = Article::new(
        &title,
        body,
        source.code,
        source.display_name,
        link.origin_url.clone(),
        published_at,
        cls.category,
        cls.jurisdiction,
        cls.document_type,
    );
    article.image_url = image_url;
    article.author = author;
    article.case_role = classify::extract_case_role(&article.body);
    article.case_number = classify::extract_case_number(&article.body);
    article.tribunal_or_body = classify::extract_tribunal(&article.body);
    article.region = classify::extract_region(&article.body);
    article.tags = classify::extract_tags(&article.body);
    article.source_excerpt = Some(excerpt(&article.body));
    Some(article)
}

fn excerpt(body: &str) -> String {
    let cut: String = body.chars().take(280).collect();
    cut.trim_end().to_string()
}

pub(crate) fn extract_title(doc: &Html) -> Option<String> {
    for sel in TITLE_SELECTORS.iter() {
        if let Some(el) = doc.select(sel).next() {
            let text = cleaner::collapse_whitespace(&el.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Tries the source's content selectors in order; a hit must carry real
/// text. Falls back to joining the page's paragraphs, which skips nav
/// and script subtrees by construction.
pub(crate) fn extract_body(doc: &Html, selectors: &[&str]) -> String {
    for raw in selectors {
        if let Ok(sel) = Selector::parse(raw) {
            if let Some(el) = doc.select(&sel).next() {
                let text = el.text().collect::<String>();
                if text.trim().chars().count() >= 80 {
                    return text;
                }
            }
        }
    }
    doc.select(&PARAGRAPH_SELECTOR)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_image(doc: &Html, page_url: &str) -> Option<String> {
    if let Some(el) = doc.select(&OG_IMAGE_SELECTOR).next() {
        if let Some(content) = el.value().attr("content") {
            if let Some(abs) = absolutize(page_url, content) {
                return Some(abs);
            }
        }
    }
    for sel in IMG_SELECTORS.iter() {
        for el in doc.select(sel) {
            if let Some(src) = el.value().attr("src") {
                if let Some(abs) = absolutize(page_url, src) {
                    return Some(abs);
                }
            }
        }
    }
    None
}

fn extract_author(doc: &Html) -> Option<String> {
    for sel in AUTHOR_SELECTORS.iter() {
        if let Some(el) = doc.select(sel).next() {
            let text = cleaner::collapse_whitespace(&el.text().collect::<String>());
            if !text.is_empty() && text.chars().count() <= 120 {
                return Some(text);
            }
        }
    }
    doc.select(&META_AUTHOR_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolves an href against the page it appeared on. Rejects fragment
/// and non-http schemes.
pub(crate) fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = Url::parse(base).ok()?.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Order-preserving dedup by origin_url, capped at `max_items`.
pub(crate) fn dedupe_links(links: Vec<LinkItem>, max_items: usize) -> Vec<LinkItem> {
    let mut seen = std::collections::HashSet::new();
    links
        .into_iter()
        .filter(|l| seen.insert(l.origin_url.clone()))
        .take(max_items)
        .collect()
}

/// Anchor-text filter shared by listing adapters: allowlist (when
/// non-empty), then blocklist.
pub(crate) fn title_passes(source: &SourceConfig, title: &str) -> bool {
    let lower = title.to_lowercase();
    if !source.keywords.is_empty() && !source.keywords.iter().any(|k| lower.contains(k)) {
        return false;
    }
    !source.exclusions.iter().any(|e| lower.contains(e))
}
