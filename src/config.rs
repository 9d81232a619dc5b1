use std::collections::HashSet;
use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Runtime configuration, read once at startup. Required variables fail
/// fast with the variable name; optional ones carry defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_url: String,
    pub store_service_key: String,
    pub store_anon_key: String,
    /// Absent key means the LLM path is disabled and every summary
    /// comes from the deterministic fallback.
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    pub max_items_per_source: usize,
    pub inter_fetch_sleep: Duration,
    pub http_timeout_secs: u64,
    disabled_sources: HashSet<String>,
}

const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";

impl Config {
    pub fn from_env() -> Result<Self> {
        let store_url = required("STORE_URL")?;
        if !store_url.starts_with("http://") && !store_url.starts_with("https://") {
            bail!("STORE_URL must be an http(s) URL, got {:?}", store_url);
        }
        Ok(Config {
            store_url: store_url.trim_end_matches('/').to_string(),
            store_service_key: required("STORE_SERVICE_KEY")?,
            store_anon_key: required("STORE_ANON_KEY")?,
            llm_api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            llm_api_url: env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_LLM_URL.to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            max_items_per_source: parsed_or("MAX_ITEMS_PER_SOURCE", 20)?,
            inter_fetch_sleep: Duration::from_secs(parsed_or("INTER_FETCH_SLEEP_S", 1)?),
            http_timeout_secs: parsed_or("HTTP_TIMEOUT_S", 30)?,
            disabled_sources: disabled_from_env(),
        })
    }

    /// Per-source kill switch: SOURCE_ENABLED_<CODE>=false disables a
    /// source without a redeploy. Anything else leaves it enabled.
    pub fn source_enabled(&self, code: &str) -> bool {
        !self.disabled_sources.contains(code)
    }
}

fn required(name: &'static str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("missing required env var {}", name))?;
    if value.trim().is_empty() {
        bail!("env var {} is set but empty", name);
    }
    Ok(value)
}

fn parsed_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}={:?}: {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

fn disabled_from_env() -> HashSet<String> {
    env::vars()
        .filter_map(|(k, v)| {
            let code = k.strip_prefix("SOURCE_ENABLED_")?;
            let off = matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off");
            off.then(|| code.to_lowercase())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_flag_normalizes_case() {
        env::set_var("SOURCE_ENABLED_SII", "false");
        env::set_var("SOURCE_ENABLED_CDE", "true");
        let disabled = disabled_from_env();
        assert!(disabled.contains("sii"));
        assert!(!disabled.contains("cde"));
        env::remove_var("SOURCE_ENABLED_SII");
        env::remove_var("SOURCE_ENABLED_CDE");
    }
}
