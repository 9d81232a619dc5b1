//! Executive summaries in Spanish. The provider answer must follow the
//! RESUMEN / PALABRAS_CLAVE layout and pass a quality window, otherwise
//! the extractive fallback wins. Either outcome is cached.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::{cache_key, LlmProvider, LlmRequest, Summary, SummaryCache};
use crate::cleaner::clean_body;

const SYSTEM_PROMPT: &str = "Eres un experto en derecho chileno que redacta resúmenes \
ejecutivos de noticias jurídicas para abogados. Responde siempre en español.";

const MAX_BODY_PROMPT_CHARS: usize = 2000;
const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.2;

/// Accepted summary length window, in chars.
const MIN_SUMMARY_CHARS: usize = 50;
const MAX_SUMMARY_CHARS: usize = 500;

const FALLBACK_CHARS: usize = 400;

pub struct Summarizer {
    provider: Option<Arc<dyn LlmProvider>>,
    cache: Arc<dyn SummaryCache>,
}

impl Summarizer {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, cache: Arc<dyn SummaryCache>) -> Self {
        Summarizer { provider, cache }
    }

    /// Produces a summary for one article, consulting the cache first.
    /// The body is normalized again before keying so the same text always
    /// maps to the same cache entry. Never fails: provider errors and
    /// malformed answers degrade to the deterministic fallback.
    pub async fn summarize(&self, title: &str, body: &str, source_name: &str) -> Summary {
        let body = clean_body(body);
        let key = cache_key(title, &body);
        if let Some(hit) = self.cache.get(&key) {
            debug!(title, "summary cache hit");
            return hit;
        }
        let summary = match &self.provider {
            Some(provider) => {
                self.from_provider(provider.as_ref(), title, &body, source_name)
                    .await
            }
            None => fallback_summary(&body),
        };
        self.cache.put(&key, summary.clone());
        summary
    }

    async fn from_provider(
        &self,
        provider: &dyn LlmProvider,
        title: &str,
        body: &str,
        source_name: &str,
    ) -> Summary {
        let request = LlmRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: build_user_prompt(title, body, source_name),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        match provider.generate(request).await {
            Ok(response) => match parse_response(&response.content) {
                Some(summary) if summary_acceptable(&summary.text, title) => summary,
                Some(_) => {
                    warn!(title, "summary failed the quality window, using fallback");
                    fallback_summary(body)
                }
                None => {
                    warn!(title, "summary response did not follow the schema, using fallback");
                    fallback_summary(body)
                }
            },
            Err(e) => {
                warn!(title, error = %e, "summary request failed, using fallback");
                fallback_summary(body)
            }
        }
    }
}

fn build_user_prompt(title: &str, body: &str, source_name: &str) -> String {
    let body_cut: String = body.chars().take(MAX_BODY_PROMPT_CHARS).collect();
    format!(
        "Redacta un resumen ejecutivo (máximo 3 frases) de la siguiente noticia jurídica \
         y hasta 3 palabras clave legales.\n\
         Responde exactamente con este formato:\n\
         RESUMEN: <resumen>\n\
         PALABRAS_CLAVE: <clave1>, <clave2>, <clave3>\n\n\
         FUENTE: {}\n\
         TÍTULO: {}\n\
         TEXTO: {}",
        source_name, title, body_cut
    )
}

static SUMMARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)RESUMEN:\s*(.+?)(?:\n\s*PALABRAS_CLAVE:|\z)").unwrap());
static KEYWORDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*PALABRAS_CLAVE:\s*(.+)$").unwrap());

/// Parses the labeled layout. Missing RESUMEN is a schema failure;
/// missing keywords is tolerated.
pub fn parse_response(content: &str) -> Option<Summary> {
    let text = SUMMARY_RE
        .captures(content)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())?;
    let keywords = KEYWORDS_RE
        .captures(content)
        .map(|c| {
            c[1].split(',')
                .map(|k| k.trim().trim_matches('.').to_string())
                .filter(|k| !k.is_empty())
                .take(3)
                .collect()
        })
        .unwrap_or_default();
    Some(Summary { text, keywords })
}

fn summary_acceptable(text: &str, title: &str) -> bool {
    let len = text.chars().count();
    if !(MIN_SUMMARY_CHARS..=MAX_SUMMARY_CHARS).contains(&len) {
        return false;
    }
    // A summary that opens by parroting the headline adds nothing.
    let title = title.trim();
    title.is_empty() || !text.to_lowercase().starts_with(&title.to_lowercase())
}

/// Deterministic extractive summary: the opening of the body, cut at
/// 400 chars with a "(...)" marker, or closed with a period when the
/// body is short. Carries no keywords.
pub fn fallback_summary(body: &str) -> Summary {
    let text = body.trim();
    let opening = text.split('\n').next().unwrap_or(text).trim();
    let mut out: String = opening.chars().take(FALLBACK_CHARS).collect();
    if opening.chars().count() > FALLBACK_CHARS {
        // Leave room for the marker so the total stays within 404 chars.
        out = out
            .chars()
            .take(FALLBACK_CHARS - 1)
            .collect::<String>()
            .trim_end()
            .to_string();
        out.push_str("(...)");
    } else if !out.ends_with(&['.', '!', '?'][..]) {
        out.push('.');
    }
    Summary {
        text: out,
        keywords: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labeled_response() {
        let content = "RESUMEN: La Corte Suprema confirmó la condena aplicada al municipio \
                       por incumplimiento grave de sus deberes.\n\
                       PALABRAS_CLAVE: condena, corte suprema, municipio";
        let s = parse_response(content).unwrap();
        assert!(s.text.starts_with("La Corte Suprema"));
        assert_eq!(s.keywords, vec!["condena", "corte suprema", "municipio"]);
    }

    #[test]
    fn keywords_cap_at_three() {
        let content = "RESUMEN: Texto suficiente.\nPALABRAS_CLAVE: a, b, c, d, e";
        let s = parse_response(content).unwrap();
        assert_eq!(s.keywords.len(), 3);
    }

    #[test]
    fn prompt_names_the_source() {
        let prompt = build_user_prompt(
            "Corte confirma condena",
            "El tribunal resolvió.",
            "Poder Judicial de Chile",
        );
        assert!(prompt.contains("FUENTE: Poder Judicial de Chile"));
        assert!(prompt.contains("TÍTULO: Corte confirma condena"));
    }

    #[test]
    fn missing_resumen_label_is_a_schema_failure() {
        assert!(parse_response("Aquí va un texto sin etiquetas de formato").is_none());
    }

    #[test]
    fn quality_window_rejects_short_long_and_parroted() {
        let title = "Corte confirma condena";
        assert!(!summary_acceptable("Muy corto.", title));
        assert!(!summary_acceptable(&"x".repeat(501), title));
        assert!(!summary_acceptable(
            "Corte confirma condena y además agrega detalles suficientes para superar el mínimo.",
            title
        ));
        assert!(summary_acceptable(
            "El máximo tribunal confirmó la condena impuesta en primera instancia al demandado.",
            title
        ));
    }

    #[test]
    fn fallback_truncates_with_marker() {
        let body = "palabra ".repeat(100);
        let s = fallback_summary(&body);
        assert!(s.text.chars().count() <= 404);
        assert!(s.text.ends_with("(...)"));
        assert!(s.keywords.is_empty());
    }

    #[test]
    fn fallback_marker_fits_even_without_whitespace() {
        // Nothing to trim before the marker, the cut itself must leave room.
        let body = "x".repeat(450);
        let s = fallback_summary(&body);
        assert_eq!(s.text.chars().count(), 404);
        assert!(s.text.ends_with("(...)"));
    }

    #[test]
    fn fallback_closes_short_bodies_with_a_period() {
        let s = fallback_summary("Un cuerpo breve sin puntuación final");
        assert_eq!(s.text, "Un cuerpo breve sin puntuación final.");
    }
}
