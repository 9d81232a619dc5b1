use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lexscope::config::Config;
use lexscope::llm::{LlmProvider, MemoryCache, RemoteLlmProvider, Summarizer};
use lexscope::pipeline::Orchestrator;
use lexscope::sources;
use lexscope::store::StoreClient;

#[derive(Parser, Debug)]
#[command(name = "lexscope", about = "Harvests Chilean legal news into the article store")]
struct Args {
    /// Run one harvest and exit (the default mode; scheduling is
    /// external).
    #[arg(long)]
    once: bool,

    /// Print store totals instead of running a harvest.
    #[arg(long)]
    stats: bool,

    /// Override MAX_ITEMS_PER_SOURCE for this run.
    #[arg(long)]
    max_items: Option<usize>,

    /// Re-summarize and rewrite articles that are already stored.
    #[arg(long)]
    force_resummarize: bool,

    /// Log filter, e.g. "info" or "lexscope=debug".
    #[arg(long, default_value = "info")]
    log_level: String,
}

const LLM_TIMEOUT_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cfg = Config::from_env()?;
    let store = StoreClient::new(&cfg.store_url, &cfg.store_service_key, &cfg.store_anon_key)?;

    if args.stats {
        let total = store.count_articles().await?;
        let last = store.latest_scrape().await?;
        println!("articles stored: {}", total);
        match last {
            Some(ts) => println!("last run: {}", ts.to_rfc3339()),
            None => println!("last run: never"),
        }
        return Ok(());
    }

    let provider: Option<Arc<dyn LlmProvider>> = match &cfg.llm_api_key {
        Some(key) => Some(Arc::new(RemoteLlmProvider::new(
            &cfg.llm_api_url,
            key,
            &cfg.llm_model,
            LLM_TIMEOUT_SECS,
        )?)),
        None => {
            info!("LLM_API_KEY not set, summaries use the extractive fallback");
            None
        }
    };
    let summarizer = Summarizer::new(provider, Arc::new(MemoryCache::new()));
    let adapters = sources::build_adapters(&cfg)?;
    let max_items = args.max_items.unwrap_or(cfg.max_items_per_source);
    let orchestrator = Orchestrator::new(
        store,
        summarizer,
        adapters,
        max_items,
        cfg.inter_fetch_sleep,
    )
    .with_force_refresh(args.force_resummarize);

    let now = Utc::now();
    // --once is the only execution mode; it exists so schedulers can be
    // explicit about it.
    info!(max_items, once = args.once, "starting harvest");
    tokio::select! {
        result = orchestrator.run(now) => {
            let stats = result?;
            info!(
                sources = stats.sources,
                seen = stats.items_seen,
                new = stats.items_new,
                updated = stats.items_updated,
                errors = stats.errors,
                "harvest finished"
            );
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received, aborting harvest");
        }
    }
    Ok(())
}
