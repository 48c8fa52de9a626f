//! # DIORES HTTP API Module
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /average` - Averages of a record
//! - `POST /validate/field` - Range check of one value
//! - `POST /validate/step` - Completion check of one step
//! - `POST /form/apply` - Apply edits to a form state
//! - `POST /form/advance` - Move a form to its next step
//! - `POST /predict` - Finalize a record and ask the prediction service
//!
//! CORS origins, rate limit and API key come from [`ServerConfig`].

mod auth;
mod handlers;
mod middleware;
mod types;

pub use handlers::{
    average_handler, form_advance_handler, form_apply_handler, health_handler, predict_handler,
    validate_field_handler, validate_step_handler,
};
pub use middleware::create_rate_limiter;
pub use types::{
    ApiError, AverageRequest, ErrorResponse, FieldReport, FieldRequest, FormAdvanceRequest,
    FormApplyRequest, FormResponse, HealthResponse, PredictRequest, PredictResponse, StepRequest,
    StepResponse,
};

use crate::client::PredictionClient;
use crate::config::{AppConfig, ServerConfig};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use diores_core::{DioresError, FieldValidator};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request bodies above this size are rejected (64 KB).
const MAX_BODY_BYTES: usize = 64 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared, read-only server state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub validator: FieldValidator,
    pub client: PredictionClient,
}

impl AppState {
    /// Build the state and the outbound client from `config`.
    pub fn new(config: AppConfig) -> Result<Self, DioresError> {
        let client = PredictionClient::new(&config.prediction)
            .map_err(|e| DioresError::ConfigError(e.to_string()))?;
        Ok(Self {
            validator: FieldValidator::new(config.validation),
            config: Arc::new(config),
            client,
        })
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from the configured origins.
///
/// `None` allows localhost only; `["*"]` allows every origin.
fn build_cors_layer(server: &ServerConfig) -> CorsLayer {
    let Some(origins) = server.cors_origins.as_deref() else {
        tracing::info!("CORS: No origins configured, defaulting to localhost only");
        return build_localhost_cors();
    };

    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }
    restricted_cors(allowed)
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
    .into_iter()
    .filter_map(|o| o.parse().ok())
    .collect();
    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit, rate
/// limiting, authentication.
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors = build_cors_layer(server);

    let rate_limiter = if server.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", server.rate_limit);
        Some(middleware::create_rate_limiter(server.rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let api_key: Option<auth::ApiKey> = server.api_key.as_deref().map(Arc::from);
    if api_key.is_some() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set DIORES_API_KEY to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/average", post(handlers::average_handler))
        .route("/validate/field", post(handlers::validate_field_handler))
        .route("/validate/step", post(handlers::validate_step_handler))
        .route("/form/apply", post(handlers::form_apply_handler))
        .route("/form/advance", post(handlers::form_advance_handler))
        .route("/predict", post(handlers::predict_handler));

    if let Some(key) = api_key {
        router = router.layer(axum_middleware::from_fn_with_state(
            key,
            auth::api_key_auth_middleware,
        ));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind and serve until the process stops.
pub async fn run_server(config: AppConfig) -> Result<(), DioresError> {
    let addr = config.bind_address();
    let state = AppState::new(config)?;
    tracing::info!("Forwarding predictions to {}", state.client.url());
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DioresError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("DIORES HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| DioresError::IoError(format!("Server error: {}", e)))
}
