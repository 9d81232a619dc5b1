//! lexscope: single-shot ingestion engine for Chilean legal-news
//! sources. Each run lists recent items per institution, normalizes
//! them into one canonical record, dedups against the REST store by
//! origin URL, summarizes what will be written and persists it.

pub mod classify;
pub mod cleaner;
pub mod config;
pub mod dates;
pub mod fetch;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod sources;
pub mod store;
