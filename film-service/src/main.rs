use anyhow::{Context, Result};
use film_service::{AppState, ServiceConfig, build_router};
use query_agent::{AgentConfig, QueryInterpreter};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// LOG_FORMAT=pretty for development, JSON otherwise
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "film_service=debug,query_agent=debug,graph_flow=info,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let service_config = ServiceConfig::from_env().context("invalid service configuration")?;
    let agent_config = AgentConfig::from_env().context("invalid agent configuration")?;
    let interpreter =
        QueryInterpreter::from_config(&agent_config).context("failed to build query interpreter")?;

    let app = build_router(AppState::new(interpreter), &service_config.frontend_url)?;

    let address = service_config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!(address = %listener.local_addr()?, frontend = %service_config.frontend_url, "film-service listening");
    info!("  GET  /                                 - Service status");
    info!("  GET  /health                           - Health check");
    info!("  GET  /api/v1/graph                     - Knowledge graph");
    info!("  GET  /api/v1/recommendations/similar   - Similar movies (?title=&top_k=)");
    info!("  POST /api/v1/query/interpret           - Interpret a movie request");

    axum::serve(listener, app).await?;
    Ok(())
}
