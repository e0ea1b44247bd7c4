/*
newsdesk - main.rs
Generates one newsletter per topic given on the command line and prints it.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newsdesk::agent::RemoteAgentFactory;
use newsdesk::credentials::Credentials;
use newsdesk::{NewsletterGenerator, NewsletterRequest};

#[derive(Parser, Debug)]
#[command(
    name = "newsdesk",
    about = "Generate topic newsletters with a search-equipped research agent"
)]
struct Args {
    /// Topics to write newsletters about
    #[arg(required = true, value_name = "TOPIC")]
    topics: Vec<String>,

    /// Max search results per query (defaults to generation.default_limit)
    #[arg(long)]
    limit: Option<u32>,

    /// Time window: qdr:h, qdr:d, qdr:w, qdr:m, qdr:y or past_day, past_week, ...
    #[arg(long)]
    recency: Option<String>,

    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the whole-run timeout, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print results as JSON instead of markdown
    #[arg(long)]
    json: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only newsletters
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if let Err(e) = dotenv::dotenv() {
        info!("no .env file loaded: {}", e);
    }

    let config = load_config(args.config.as_ref()).await?;

    let credentials = match Credentials::from_env(&config) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "missing credentials");
            return Err(e.into());
        }
    };

    let limit = args.limit.unwrap_or(config.generation.default_limit);
    let recency = args
        .recency
        .clone()
        .unwrap_or_else(|| config.generation.default_recency.clone());
    let run_timeout =
        Duration::from_secs(args.timeout.unwrap_or(config.generation.timeout_seconds));

    let factory = RemoteAgentFactory::new(config, credentials);
    let generator = NewsletterGenerator::new(Arc::new(factory), run_timeout);

    let requests: Vec<NewsletterRequest> = args
        .topics
        .iter()
        .map(|topic| {
            NewsletterRequest::new(topic.as_str())
                .with_limit(limit)
                .with_recency(recency.as_str())
        })
        .collect();

    let results = generator.generate_many(&requests).await;

    let mut failed = 0;
    for (request, result) in requests.iter().zip(&results) {
        match result {
            Ok(newsletter) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(newsletter)?);
                } else {
                    println!("{}\n", newsletter.content);
                }
                info!(
                    topic = %newsletter.topic,
                    tier = %newsletter.tier,
                    model = %newsletter.model,
                    sources = newsletter.sources.len(),
                    tokens = newsletter.usage.total_tokens,
                    "newsletter generated"
                );
            }
            Err(e) => {
                failed += 1;
                if args.json {
                    let failure = serde_json::json!({
                        "topic": request.topic,
                        "error": format!("{:?}", e.kind()),
                        "message": e.to_string(),
                    });
                    println!("{}", serde_json::to_string_pretty(&failure)?);
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} newsletters failed", failed, results.len());
    }
    Ok(())
}

/// Resolve config paths: built-in defaults, then config.default.toml, then
/// config.toml or the file given with --config.
async fn load_config(explicit: Option<&PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p.clone())
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let loaded = Config::load_with_defaults(Some(&default_path), override_path.as_deref()).await;
    let config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");
    Ok(config)
}
