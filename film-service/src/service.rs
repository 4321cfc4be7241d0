use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::{Next, from_fn},
    response::{Json, Response},
    routing::{get, post},
};
use query_agent::{AgentError, Interpretation, QueryInterpreter};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::catalog::{DEFAULT_TOP_K, compute_similar_movies, fetch_graph};
use crate::config::ServiceConfigError;
use crate::models::{GraphResponse, InterpretRequest, SimilarMovie, SimilarMoviesParams};

pub const SERVICE_NAME: &str = "film-service";

const CORRELATION_ID: &str = "x-correlation-id";

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn agent_error(err: &AgentError) -> ApiError {
    let status = match err {
        AgentError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        AgentError::Transport(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({
            "error": "Query interpretation failed",
            "details": err.to_string()
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub interpreter: Arc<QueryInterpreter>,
}

impl AppState {
    pub fn new(interpreter: QueryInterpreter) -> Self {
        Self {
            interpreter: Arc::new(interpreter),
        }
    }
}

pub fn build_router(state: AppState, frontend_url: &str) -> Result<Router, ServiceConfigError> {
    let api = Router::new()
        .route("/graph", get(get_graph))
        .route("/recommendations/similar", get(similar_movies))
        .route("/query/interpret", post(interpret_query));

    Ok(Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .layer(from_fn(correlation_id_middleware))
        .layer(cors_layer(frontend_url)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Only the frontend origin, with credentials. Credentials rule out
/// wildcard methods and headers, so both are listed. The correlation id is
/// exposed so frontend code can read it.
fn cors_layer(frontend_url: &str) -> Result<CorsLayer, ServiceConfigError> {
    let origin =
        HeaderValue::from_str(frontend_url).map_err(|_| ServiceConfigError::InvalidValue {
            key: "FRONTEND_URL",
            value: frontend_url.to_string(),
        })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([HeaderName::from_static(CORRELATION_ID)]))
}

/// Tags the request and its response with a fresh correlation id and runs
/// the handler inside a span carrying it
async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let header_value = HeaderValue::from_str(&correlation_id).ok();
    if let Some(value) = &header_value {
        request.headers_mut().insert(CORRELATION_ID, value.clone());
    }

    let mut response = next.run(request).instrument(span).await;
    if let Some(value) = header_value {
        response.headers_mut().insert(CORRELATION_ID, value);
    }
    response
}

async fn root() -> Json<Value> {
    info!("root status request");
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_graph() -> Json<GraphResponse> {
    Json(fetch_graph())
}

async fn similar_movies(Query(params): Query<SimilarMoviesParams>) -> ApiResult<Vec<SimilarMovie>> {
    let title = params.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return Err(bad_request_error("title is required"));
    }

    let top_k = params.top_k.unwrap_or(DEFAULT_TOP_K);
    Ok(Json(compute_similar_movies(title, top_k)))
}

async fn interpret_query(
    State(state): State<AppState>,
    Json(request): Json<InterpretRequest>,
) -> ApiResult<Interpretation> {
    if request.query.trim().is_empty() {
        return Err(bad_request_error("query is required"));
    }

    match state.interpreter.interpret(&request.query).await {
        Ok(interpretation) => {
            if interpretation.is_failure() {
                warn!("model output could not be turned into a structured query");
            }
            Ok(Json(interpretation))
        }
        Err(e) => {
            error!(error = %e, "query interpretation failed");
            Err(agent_error(&e))
        }
    }
}
