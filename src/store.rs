//! PostgREST-style store client. Every article row is keyed by
//! `origin_url`; inserts ask for the created row back, lookups select
//! only the columns the pipeline compares. Transient failures (network,
//! 5xx) are retried twice with backoff before surfacing.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::model::{Article, ScrapeLog};

const MAX_RETRIES: u32 = 2;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Store failures split by what the orchestrator should do about them:
/// retry/abort for `Transient`, drop the record for `Rejected`.
#[derive(Debug)]
pub enum StoreError {
    Transient { status: Option<u16>, detail: String },
    Rejected { status: u16, detail: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Transient { status: Some(s), detail } => {
                write!(f, "transient store failure ({}): {}", s, detail)
            }
            StoreError::Transient { status: None, detail } => {
                write!(f, "transient store failure: {}", detail)
            }
            StoreError::Rejected { status, detail } => {
                write!(f, "store rejected the request ({}): {}", status, detail)
            }
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(String),
    /// The store's unique constraint beat us to it (concurrent writer
    /// or a race with our own lookup).
    Duplicate,
}

/// Columns the update path needs back from the store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredArticle {
    pub id: String,
    pub published_at: DateTime<Utc>,
    pub version: u32,
}

#[derive(Debug, Deserialize)]
struct LogRow {
    created_at: DateTime<Utc>,
}

pub struct StoreClient {
    base_url: String,
    client: reqwest::Client,
}

impl StoreClient {
    pub fn new(base_url: &str, service_key: &str, anon_key: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(anon_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", service_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(StoreClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Sends a request with retry on network errors and 5xx. Non-5xx
    /// responses come back for the caller to interpret.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let mut last = None;
        for attempt in 0..=MAX_RETRIES {
            let prepared = request.try_clone().ok_or_else(|| StoreError::Transient {
                status: None,
                detail: "request body is not retryable".to_string(),
            })?;
            match prepared.send().await {
                Ok(resp) if resp.status().is_server_error() => {
                    let status = resp.status().as_u16();
                    let detail = resp.text().await.unwrap_or_default();
                    last = Some(StoreError::Transient {
                        status: Some(status),
                        detail,
                    });
                }
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    last = Some(StoreError::Transient {
                        status: None,
                        detail: e.to_string(),
                    });
                }
            }
            if attempt < MAX_RETRIES {
                let delay = Duration::from_secs(1 << attempt);
                warn!(attempt, "store request failed, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }
        Err(last.unwrap_or(StoreError::Transient {
            status: None,
            detail: "request failed with no recorded error".to_string(),
        }))
    }

    async fn find_one(&self, filter: (&str, &str)) -> Result<Option<StoredArticle>, StoreError> {
        let request = self
            .client
            .get(self.table_url("articles"))
            .query(&[
                (filter.0, format!("eq.{}", filter.1).as_str()),
                ("select", "id,published_at,version"),
                ("limit", "1"),
            ]);
        let resp = self.execute(request).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(rejected(status, resp).await);
        }
        let rows: Vec<StoredArticle> = decode(resp).await?;
        Ok(rows.into_iter().next())
    }

    /// Dedup lookup by the record's origin URL.
    pub async fn find_by_url(&self, origin_url: &str) -> Result<Option<StoredArticle>, StoreError> {
        self.find_one(("origin_url", origin_url)).await
    }

    pub async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<StoredArticle>, StoreError> {
        self.find_one(("fingerprint", fingerprint)).await
    }

    pub async fn insert(&self, article: &Article) -> Result<InsertOutcome, StoreError> {
        let request = self
            .client
            .post(self.table_url("articles"))
            .header("Prefer", "return=representation")
            .json(article);
        let resp = self.execute(request).await?;
        let status = resp.status();
        if status == StatusCode::CONFLICT {
            return Ok(InsertOutcome::Duplicate);
        }
        if !status.is_success() {
            return Err(rejected(status, resp).await);
        }
        let rows: Vec<StoredArticle> = decode(resp).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(InsertOutcome::Inserted(row.id)),
            None => Err(StoreError::Rejected {
                status: status.as_u16(),
                detail: "insert returned no representation".to_string(),
            }),
        }
    }

    /// Partial update of an existing row.
    pub async fn update(&self, id: &str, delta: &Value) -> Result<(), StoreError> {
        let request = self
            .client
            .patch(self.table_url("articles"))
            .query(&[("id", format!("eq.{}", id).as_str())])
            .header("Prefer", "return=minimal")
            .json(delta);
        let resp = self.execute(request).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(rejected(status, resp).await);
        }
        Ok(())
    }

    pub async fn append_log(&self, log: &ScrapeLog) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.table_url("scrape_logs"))
            .header("Prefer", "return=minimal")
            .json(log);
        let resp = self.execute(request).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(rejected(status, resp).await);
        }
        Ok(())
    }

    /// Total stored articles, via PostgREST's exact count header.
    pub async fn count_articles(&self) -> Result<u64, StoreError> {
        let request = self
            .client
            .get(self.table_url("articles"))
            .query(&[("select", "id"), ("limit", "1")])
            .header("Prefer", "count=exact");
        let resp = self.execute(request).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(rejected(status, resp).await);
        }
        let range = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        parse_content_range_total(range).ok_or(StoreError::Rejected {
            status: status.as_u16(),
            detail: format!("unparseable content-range {:?}", range),
        })
    }

    /// Timestamp of the most recent run log, if any.
    pub async fn latest_scrape(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let request = self
            .client
            .get(self.table_url("scrape_logs"))
            .query(&[
                ("select", "created_at"),
                ("order", "created_at.desc"),
                ("limit", "1"),
            ]);
        let resp = self.execute(request).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(rejected(status, resp).await);
        }
        let rows: Vec<LogRow> = decode(resp).await?;
        Ok(rows.into_iter().next().map(|r| r.created_at))
    }
}

async fn rejected(status: StatusCode, resp: Response) -> StoreError {
    StoreError::Rejected {
        status: status.as_u16(),
        detail: resp.text().await.unwrap_or_default(),
    }
}

async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, StoreError> {
    let status = resp.status().as_u16();
    resp.json().await.map_err(|e| StoreError::Rejected {
        status,
        detail: format!("undecodable store response: {}", e),
    })
}

fn parse_content_range_total(range: &str) -> Option<u64> {
    range.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range_total("0-0/123"), Some(123));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}
