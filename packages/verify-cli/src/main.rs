//! Command-line claim verifier.
//!
//! Reads collaborator endpoints and keys from the environment (see
//! [`config::Config`]), verifies one claim and prints the sources, scores
//! and verdict.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verification::{
    ContentFetcher, DiscoveryConfig, Explainer, GoogleCustomSearcher, HttpFetcher,
    MemoryScoreStore, ModelEnsemble, OpenAIExplainer, Region, ScoreStore, SqliteScoreStore,
    TavilySearcher, TeiEmbedder, TeiSentimentClassifier, TextEmbedder, Verdict,
    VerificationConfig, VerificationOutcome, Verifier, VerifierContext, WebSearcher,
};

use crate::config::{Config, SearchProvider};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RegionArg {
    Global,
    Sg,
}

impl From<RegionArg> for Region {
    fn from(region: RegionArg) -> Self {
        match region {
            RegionArg::Global => Region::Global,
            RegionArg::Sg => Region::Singapore,
        }
    }
}

/// Check a claim against credible web sources.
#[derive(Debug, Parser)]
#[command(name = "verify", version)]
struct Args {
    /// The claim to verify
    claim: String,

    /// Most search iterations before giving up (default 20)
    #[arg(long)]
    max_search_count: Option<usize>,

    /// Stop searching once this many credible sources are found (default 25)
    #[arg(long)]
    min_source_count: Option<usize>,

    /// Allowlist region used for `site:` filters
    #[arg(long, value_enum, default_value_t = RegionArg::Global)]
    region: RegionArg,

    /// Seed for keyword sampling, for reproducible queries
    #[arg(long)]
    seed: Option<u64>,

    /// Print the full outcome as JSON
    #[arg(long)]
    json: bool,

    /// Ask the configured LLM to explain the verdict
    #[arg(long)]
    explain: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,verification=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let verifier = Verifier::new(build_context(&config, &args).await?);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling verification");
            ctrl_c.cancel();
        }
    });

    let outcome = verifier
        .verify_with_cancel(&args.claim, cancel)
        .await
        .context("Verification failed")?;

    let explanation = if args.explain {
        verifier
            .explain(&outcome)
            .await
            .context("Failed to generate explanation")?
    } else {
        None
    };

    if args.json {
        let mut value = serde_json::to_value(&outcome)?;
        if let Some(text) = &explanation {
            value["explanation"] = serde_json::Value::String(text.clone());
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_outcome(&outcome, explanation.as_deref());
    }

    verifier.flush().await;
    Ok(())
}

async fn build_context(config: &Config, args: &Args) -> Result<VerifierContext> {
    let searcher: Arc<dyn WebSearcher> = match &config.search {
        SearchProvider::Google { api_key, engine_id } => {
            Arc::new(GoogleCustomSearcher::new(api_key.expose(), engine_id.as_str()))
        }
        SearchProvider::Tavily { api_key } => Arc::new(TavilySearcher::new(api_key.expose())),
    };

    let fetcher: Arc<dyn ContentFetcher> =
        Arc::new(HttpFetcher::new().context("Failed to build HTTP client")?);

    let embedder = |i: usize| -> Arc<dyn TextEmbedder> {
        Arc::new(TeiEmbedder::new(
            config.embedding_urls[i].as_str(),
            config.embedding_models[i].as_str(),
        ))
    };
    let models = ModelEnsemble::new(
        [embedder(0), embedder(1), embedder(2), embedder(3)],
        Arc::new(TeiSentimentClassifier::new(config.sentiment_url.as_str())),
    );

    let store: Arc<dyn ScoreStore> = match &config.score_database_url {
        Some(url) => Arc::new(
            SqliteScoreStore::new(url)
                .await
                .context("Failed to open score database")?,
        ),
        None => Arc::new(MemoryScoreStore::new()),
    };

    let mut discovery = DiscoveryConfig::new().with_region(args.region.into());
    if let Some(count) = args.max_search_count {
        discovery = discovery.with_max_search_count(count);
    }
    if let Some(count) = args.min_source_count {
        discovery = discovery.with_min_source_count(count);
    }
    if let Some(seed) = args.seed {
        discovery = discovery.with_seed(seed);
    }

    let mut context = VerifierContext::new(searcher, fetcher, models, store)
        .context("Failed to load credibility allowlist")?
        .with_config(VerificationConfig::new().with_discovery(discovery));

    if let Some(key) = &config.openai_api_key {
        let explainer: Arc<dyn Explainer> = Arc::new(OpenAIExplainer::new(key.expose()));
        context = context.with_explainer(explainer);
    } else if args.explain {
        tracing::warn!("OPENAI_API_KEY not set, skipping explanation");
    }

    Ok(context)
}

fn print_outcome(outcome: &VerificationOutcome, explanation: Option<&str>) {
    println!("{}", "Claim".bright_cyan().bold());
    println!("  {}", outcome.claim);
    println!();

    println!("{}", "Sources".bright_cyan().bold());
    let summary = Verifier::summarize_sources(&outcome.sources);
    if summary.is_empty() {
        println!("  {}", "No credible sources found".yellow());
        println!();
    } else {
        print!("{summary}");
    }

    if !outcome.report.no_evidence {
        println!("{}", "Scores".bright_cyan().bold());
        println!("  average: {:.3}", outcome.report.average_score);
        println!("  max:     {:.3}", outcome.report.max_score);
        println!("  min:     {:.3}", outcome.report.min_score);
        println!();
    }

    let message = outcome.verdict.message();
    let message = match outcome.verdict {
        Verdict::Reliable { .. } => message.bright_green(),
        Verdict::Ambiguous { .. } => message.bright_yellow(),
        Verdict::Unreliable { .. } | Verdict::HighlyUnreliable { .. } => message.bright_red(),
        Verdict::Undetermined => message.normal(),
    };
    println!("{}", "Verdict".bright_cyan().bold());
    println!("  {message}");

    if let Some(text) = explanation {
        println!();
        println!("{}", "Explanation".bright_cyan().bold());
        println!("{text}");
    }
}
