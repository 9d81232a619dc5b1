use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cleaner;

/// Categories of legal news, mirroring the `articles.category` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tribunal,
    Ministerio,
    Fiscalia,
    Defensoria,
    Contraloria,
    Organismo,
    Legislacion,
    Jurisprudencia,
    Administrativo,
    Penal,
    Civil,
    Laboral,
    Ambiental,
    Constitucional,
    Comercial,
    Tributario,
    Fallos,
    Actividades,
    Comunicados,
    Investigaciones,
    Normativa,
    Otro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jurisdiction {
    Nacional,
    Regional,
    Local,
    Internacional,
    Penal,
    Civil,
    Laboral,
    Ambiental,
    Administrativo,
    Constitucional,
    Comercial,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Noticia,
    Sentencia,
    Fallo,
    Resolucion,
    Acuerdo,
    Dictamen,
    Informe,
    Circular,
    Instructivo,
    Decreto,
    Ley,
    Reglamento,
    Audiencia,
    Comunicado,
    Otro,
}

/// The canonical article record every adapter produces and every downstream
/// stage consumes. Field names match the `articles` table columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub body: String,
    pub source_code: String,
    pub source_display_name: String,
    pub origin_url: String,
    pub published_at: DateTime<Utc>,
    pub fingerprint: String,
    pub category: Category,
    pub jurisdiction: Jurisdiction,
    pub document_type: DocumentType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tribunal_or_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: u32,
    pub is_update: bool,
}

impl Article {
    /// Builds a fresh (version 1) record. The title is whitespace-collapsed
    /// and trimmed here; the body is expected to be already cleaned by the
    /// adapter. Validation happens separately so the orchestrator can report
    /// the specific invariant that failed.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: &str,
        body: String,
        source_code: &str,
        source_display_name: &str,
        origin_url: String,
        published_at: DateTime<Utc>,
        category: Category,
        jurisdiction: Jurisdiction,
        document_type: DocumentType,
    ) -> Self {
        let title = cleaner::collapse_whitespace(title);
        let fingerprint = fingerprint(&title, &body, &origin_url);
        Article {
            title,
            body,
            source_code: source_code.to_string(),
            source_display_name: source_display_name.to_string(),
            origin_url,
            published_at,
            fingerprint,
            category,
            jurisdiction,
            document_type,
            subtitle: None,
            summary: None,
            source_excerpt: None,
            image_url: None,
            tribunal_or_body: None,
            case_number: None,
            case_role: None,
            author: None,
            author_title: None,
            region: None,
            keywords: Vec::new(),
            tags: Vec::new(),
            updated_at: None,
            version: 1,
            is_update: false,
        }
    }

    /// Recomputes the fingerprint from the current content. Must be called
    /// whenever title, body or origin_url change (e.g. on the update path).
    pub fn refresh_fingerprint(&mut self) {
        self.fingerprint = fingerprint(&self.title, &self.body, &self.origin_url);
    }

    /// Sets the keyword list, dropping empties and duplicates and capping at 10.
    pub fn set_keywords(&mut self, raw: Vec<String>) {
        let mut seen = std::collections::HashSet::new();
        self.keywords = raw
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .filter(|k| seen.insert(k.to_lowercase()))
            .take(10)
            .collect();
    }
}

/// Deterministic content digest: md5 of title, the first 200 chars of the
/// body and the origin URL, pipe-separated. 32 lowercase hex chars.
pub fn fingerprint(title: &str, body: &str, origin_url: &str) -> String {
    let body_prefix: String = body.chars().take(200).collect();
    let input = format!("{}|{}|{}", title, body_prefix, origin_url);
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Why a candidate record was rejected before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    EmptyTitle,
    OversizeTitle,
    ShortBody,
    BadUrl,
    FutureDate,
    StaleDate,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::EmptyTitle => "empty-title",
            InvalidReason::OversizeTitle => "oversize-title",
            InvalidReason::ShortBody => "short-body",
            InvalidReason::BadUrl => "bad-url",
            InvalidReason::FutureDate => "future-date",
            InvalidReason::StaleDate => "stale-date",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication dates may not sit more than this far in the future
/// (tolerates clock skew between the engine and the source).
const FUTURE_SLACK_DAYS: i64 = 1;
/// Nor further in the past than ten years.
const MAX_AGE_DAYS: i64 = 3650;

/// Checks the record invariants against the run's captured "now".
pub fn validate(article: &Article, now: DateTime<Utc>) -> Result<(), InvalidReason> {
    let title_len = article.title.trim().chars().count();
    if title_len == 0 {
        return Err(InvalidReason::EmptyTitle);
    }
    if title_len > 500 {
        return Err(InvalidReason::OversizeTitle);
    }
    if article.body.trim().chars().count() < 50 {
        return Err(InvalidReason::ShortBody);
    }
    if !article.origin_url.starts_with("http://") && !article.origin_url.starts_with("https://") {
        return Err(InvalidReason::BadUrl);
    }
    if article.published_at > now + Duration::days(FUTURE_SLACK_DAYS) {
        return Err(InvalidReason::FutureDate);
    }
    if article.published_at < now - Duration::days(MAX_AGE_DAYS) {
        return Err(InvalidReason::StaleDate);
    }
    Ok(())
}

/// Per-source outcome of one run, appended to the `scrape_logs` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeLog {
    pub source_code: String,
    pub status: RunStatus,
    pub items_seen: u32,
    pub items_new: u32,
    pub items_updated: u32,
    pub errors: u32,
    pub duration_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(body_len: usize, published_at: DateTime<Utc>) -> Article {
        Article::new(
            "Corte confirma sentencia",
            "x".repeat(body_len),
            "poder_judicial",
            "Poder Judicial de Chile",
            "https://www.pjud.cl/noticia/1".to_string(),
            published_at,
            Category::Tribunal,
            Jurisdiction::Nacional,
            DocumentType::Noticia,
        )
    }

    fn run_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn fingerprint_is_stable_and_32_hex() {
        let a = fingerprint("t", "b", "https://x.cl/a");
        let b = fingerprint("t", "b", "https://x.cl/a");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn fingerprint_uses_only_the_body_prefix() {
        let long_a = format!("{}{}", "a".repeat(200), "tail one");
        let long_b = format!("{}{}", "a".repeat(200), "different tail");
        assert_eq!(
            fingerprint("t", &long_a, "https://x.cl/a"),
            fingerprint("t", &long_b, "https://x.cl/a"),
        );
    }

    #[test]
    fn body_length_boundary() {
        let now = run_now();
        let short = sample(49, now - Duration::days(1));
        assert_eq!(validate(&short, now), Err(InvalidReason::ShortBody));
        let ok = sample(50, now - Duration::days(1));
        assert_eq!(validate(&ok, now), Ok(()));
    }

    #[test]
    fn future_date_rejected_past_the_one_day_slack() {
        let now = run_now();
        let rec = sample(100, now + Duration::hours(48));
        assert_eq!(validate(&rec, now), Err(InvalidReason::FutureDate));
        let tolerated = sample(100, now + Duration::hours(12));
        assert_eq!(validate(&tolerated, now), Ok(()));
    }

    #[test]
    fn stale_date_rejected() {
        let now = run_now();
        let rec = sample(100, now - Duration::days(3651));
        assert_eq!(validate(&rec, now), Err(InvalidReason::StaleDate));
    }

    #[test]
    fn oversize_title_rejected() {
        let now = run_now();
        let mut rec = sample(100, now - Duration::days(1));
        rec.title = "t".repeat(501);
        assert_eq!(validate(&rec, now), Err(InvalidReason::OversizeTitle));
        rec.title = "t".repeat(500);
        assert_eq!(validate(&rec, now), Ok(()));
    }

    #[test]
    fn bad_url_rejected() {
        let now = run_now();
        let mut rec = sample(100, now - Duration::days(1));
        rec.origin_url = "ftp://x.cl/a".to_string();
        assert_eq!(validate(&rec, now), Err(InvalidReason::BadUrl));
    }

    #[test]
    fn keywords_deduplicated_and_capped() {
        let now = run_now();
        let mut rec = sample(100, now);
        rec.set_keywords(vec![
            "sentencia".into(),
            "Sentencia".into(),
            "".into(),
            "  ".into(),
            "rol".into(),
        ]);
        assert_eq!(rec.keywords, vec!["sentencia", "rol"]);

        rec.set_keywords((0..20).map(|i| format!("kw{}", i)).collect());
        assert_eq!(rec.keywords.len(), 10);
    }

    #[test]
    fn enums_serialize_to_lowercase_wire_names() {
        assert_eq!(serde_json::to_string(&Category::Fallos).unwrap(), "\"fallos\"");
        assert_eq!(serde_json::to_string(&Jurisdiction::Penal).unwrap(), "\"penal\"");
        assert_eq!(serde_json::to_string(&DocumentType::Noticia).unwrap(), "\"noticia\"");
    }
}
