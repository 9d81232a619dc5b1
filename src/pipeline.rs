//! Single-shot run orchestration: walk every adapter, normalize and
//! validate its items, dedup against the store, summarize what will be
//! written, and leave one log row per source. Sources never see each
//! other's failures; only a persistently unreachable store aborts the
//! whole run.

use std::time::{Duration, Instant};

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::llm::Summarizer;
use crate::model::{self, Article, RunStatus, ScrapeLog};
use crate::sources::SourceAdapter;
use crate::store::{InsertOutcome, StoreClient, StoreError};

const DEFAULT_STORE_FAILURE_LIMIT: u32 = 5;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub sources: u32,
    pub items_seen: u32,
    pub items_new: u32,
    pub items_updated: u32,
    pub errors: u32,
}

enum Outcome {
    New,
    Updated,
    Skipped,
}

pub struct Orchestrator {
    store: StoreClient,
    summarizer: Summarizer,
    adapters: Vec<Box<dyn SourceAdapter>>,
    max_items: usize,
    inter_fetch_sleep: Duration,
    store_failure_limit: u32,
    force_refresh: bool,
}

impl Orchestrator {
    pub fn new(
        store: StoreClient,
        summarizer: Summarizer,
        adapters: Vec<Box<dyn SourceAdapter>>,
        max_items: usize,
        inter_fetch_sleep: Duration,
    ) -> Self {
        Orchestrator {
            store,
            summarizer,
            adapters,
            max_items,
            inter_fetch_sleep,
            store_failure_limit: DEFAULT_STORE_FAILURE_LIMIT,
            force_refresh: false,
        }
    }

    /// Re-summarizes and rewrites rows that are already stored, even when
    /// the source shows no newer publication date.
    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Runs one complete harvest. `now` is captured once by the caller
    /// and anchors date validation and fallbacks for the whole run.
    pub async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<RunStats> {
        let mut stats = RunStats::default();
        let mut consecutive_store_failures = 0u32;

        for adapter in &self.adapters {
            let code = adapter.source().code;
            let started = Instant::now();
            let links = adapter.list_recent(self.max_items).await;
            info!(source = code, links = links.len(), "listing complete");

            let mut items_new = 0u32;
            let mut items_updated = 0u32;
            let mut errors = 0u32;

            for (i, link) in links.iter().enumerate() {
                if i > 0 && !self.inter_fetch_sleep.is_zero() {
                    tokio::time::sleep(self.inter_fetch_sleep).await;
                }
                let article = match adapter.fetch_full(link, now).await {
                    Some(article) => article,
                    None => {
                        errors += 1;
                        continue;
                    }
                };
                if let Err(reason) = model::validate(&article, now) {
                    warn!(source = code, url = %link.origin_url, %reason, "record rejected");
                    errors += 1;
                    continue;
                }
                match self.upsert(article, now).await {
                    Ok(Outcome::New) => {
                        items_new += 1;
                        consecutive_store_failures = 0;
                    }
                    Ok(Outcome::Updated) => {
                        items_updated += 1;
                        consecutive_store_failures = 0;
                    }
                    Ok(Outcome::Skipped) => {
                        consecutive_store_failures = 0;
                    }
                    Err(e @ StoreError::Rejected { .. }) => {
                        warn!(source = code, url = %link.origin_url, error = %e, "record not persisted");
                        errors += 1;
                        consecutive_store_failures = 0;
                    }
                    Err(e @ StoreError::Transient { .. }) => {
                        warn!(source = code, url = %link.origin_url, error = %e, "store unreachable");
                        errors += 1;
                        consecutive_store_failures += 1;
                        if consecutive_store_failures >= self.store_failure_limit {
                            self.flush_log(code, links.len() as u32, items_new, items_updated, errors, started)
                                .await;
                            bail!(
                                "aborting run: {} consecutive store failures",
                                consecutive_store_failures
                            );
                        }
                    }
                }
            }

            let items_seen = links.len() as u32;
            self.flush_log(code, items_seen, items_new, items_updated, errors, started)
                .await;
            info!(
                source = code,
                items_seen, items_new, items_updated, errors, "source complete"
            );

            stats.sources += 1;
            stats.items_seen += items_seen;
            stats.items_new += items_new;
            stats.items_updated += items_updated;
            stats.errors += errors;
        }
        Ok(stats)
    }

    async fn upsert(&self, mut article: Article, now: DateTime<Utc>) -> Result<Outcome, StoreError> {
        match self.store.find_by_url(&article.origin_url).await? {
            Some(stored) => self.maybe_update(article, stored, now).await,
            None => {
                self.attach_summary(&mut article).await;
                match self.store.insert(&article).await? {
                    InsertOutcome::Inserted(id) => {
                        info!(url = %article.origin_url, id, "article inserted");
                        Ok(Outcome::New)
                    }
                    // Lost a race against the unique constraint; fall
                    // through to the update path against the winner.
                    InsertOutcome::Duplicate => {
                        match self.store.find_by_url(&article.origin_url).await? {
                            Some(stored) => self.maybe_update(article, stored, now).await,
                            None => Ok(Outcome::Skipped),
                        }
                    }
                }
            }
        }
    }

    /// An existing row is only touched when the source shows a strictly
    /// newer publication date, unless a forced refresh was requested.
    async fn maybe_update(
        &self,
        mut article: Article,
        stored: crate::store::StoredArticle,
        now: DateTime<Utc>,
    ) -> Result<Outcome, StoreError> {
        if !self.force_refresh && article.published_at <= stored.published_at {
            return Ok(Outcome::Skipped);
        }
        self.attach_summary(&mut article).await;
        article.version = stored.version + 1;
        article.is_update = true;
        article.updated_at = Some(now);
        article.refresh_fingerprint();
        let delta = json!({
            "title": article.title,
            "body": article.body,
            "summary": article.summary,
            "keywords": article.keywords,
            "tags": article.tags,
            "published_at": article.published_at,
            "fingerprint": article.fingerprint,
            "version": article.version,
            "is_update": article.is_update,
            "updated_at": article.updated_at,
        });
        self.store.update(&stored.id, &delta).await?;
        info!(url = %article.origin_url, version = article.version, "article updated");
        Ok(Outcome::Updated)
    }

    /// Summaries are attached only to records that will be written.
    async fn attach_summary(&self, article: &mut Article) {
        let summary = self
            .summarizer
            .summarize(&article.title, &article.body, &article.source_display_name)
            .await;
        article.summary = Some(summary.text);
        if !summary.keywords.is_empty() {
            article.set_keywords(summary.keywords);
        }
    }

    async fn flush_log(
        &self,
        code: &str,
        items_seen: u32,
        items_new: u32,
        items_updated: u32,
        errors: u32,
        started: Instant,
    ) {
        let status = if items_seen > 0 && errors >= items_seen {
            RunStatus::Error
        } else {
            RunStatus::Completed
        };
        let log = ScrapeLog {
            source_code: code.to_string(),
            status,
            items_seen,
            items_new,
            items_updated,
            errors,
            duration_s: started.elapsed().as_secs_f64(),
        };
        if let Err(e) = self.store.append_log(&log).await {
            warn!(source = code, error = %e, "could not persist run log");
        }
    }
}
