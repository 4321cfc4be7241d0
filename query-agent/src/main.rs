use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Parser;
use query_agent::{AgentConfig, QueryInterpreter};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Interpret a movie request and print the structured result as JSON
#[derive(Debug, Parser)]
#[command(name = "query-agent", version)]
struct Cli {
    /// Free-text movie request; read from stdin when omitted
    query: Option<String>,

    /// Print single-line JSON instead of pretty-printed JSON
    #[arg(long)]
    compact: bool,
}

/// Logs go to stderr so stdout only carries the JSON result
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "query_agent=info,graph_flow=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

fn read_query() -> Result<String> {
    eprint!("Describe the movie you are looking for: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read query from stdin")?;
    let query = line.trim();
    if query.is_empty() {
        bail!("no query given");
    }
    Ok(query.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = AgentConfig::from_env().context("failed to load agent configuration")?;
    let interpreter =
        QueryInterpreter::from_config(&config).context("failed to build query interpreter")?;

    let query = match cli.query {
        Some(query) => query,
        None => read_query()?,
    };
    let interpretation = interpreter
        .interpret(&query)
        .await
        .context("query interpretation failed")?;

    if interpretation.is_failure() {
        info!("model output could not be used, printing failure payload");
    }

    let output = if cli.compact {
        serde_json::to_string(&interpretation)?
    } else {
        serde_json::to_string_pretty(&interpretation)?
    };
    println!("{output}");

    Ok(())
}
