use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::response::SetResponseHeaderLayer;

use crate::auth::Auth;
use crate::config::Config;
use crate::upstream::{RestClient, sentiment::SentimentClient};

pub mod auth_handlers;
pub mod car_handlers;
pub mod dealer_handlers;
pub mod dto;
pub mod session;

// ---------- shared state ----------

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Auth>,
    pub db: DatabaseConnection,
    pub session_secret: String,
    pub session_expiry_hours: u64,
    /// Dealer/review backend.
    pub backend: RestClient,
    pub sentiment: SentimentClient,
}

// ---------- error type ----------

/// A JSON error response: `{"error": "..."}` with an HTTP status.
///
/// Only for failures of the server itself; business outcomes go through
/// [`dto::StatusMessage`] with HTTP 200.
pub struct ApiErr(StatusCode, String);

impl ApiErr {
    pub fn internal(e: impl std::fmt::Display) -> Self {
        tracing::error!(error = %e, "request failed");
        Self(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, msg.into())
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.1 });
        (self.0, Json(body)).into_response()
    }
}

// ---------- router ----------

pub fn app_router(state: AppState, config: &Config) -> Router {
    let allowed_origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = if allowed_origins.is_empty() {
        CorsLayer::new() // no origins allowed = same-origin only
    } else {
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    let mut router = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .merge(routes());

    if let Some(dir) = &config.frontend_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state)
}

/// Wrap the router so `/dealer/` and `/dealer` route identically. Trimming
/// must happen before routing, hence outside the `Router`.
pub fn with_trimmed_paths(router: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

fn routes() -> Router<AppState> {
    Router::new()
        // auth
        .route("/login", post(auth_handlers::login))
        .route(
            "/logout",
            get(auth_handlers::logout).post(auth_handlers::logout),
        )
        .route("/register", post(auth_handlers::registration))
        .route("/me", get(auth_handlers::me))
        // inventory
        .route("/cars", get(car_handlers::get_cars))
        // dealers (proxied)
        .route("/dealerships", get(dealer_handlers::get_dealerships))
        .route(
            "/dealerships/{state}",
            get(dealer_handlers::get_dealerships_by_state),
        )
        .route("/dealer", get(dealer_handlers::missing_dealer_id))
        .route("/dealer/{id}", get(dealer_handlers::get_dealer_details))
        .route(
            "/dealer/{id}/reviews",
            get(dealer_handlers::get_dealer_reviews),
        )
        .route("/review", post(dealer_handlers::add_review))
}
