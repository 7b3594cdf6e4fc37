//! Shared fixtures for unit tests: an in-memory store and throwaway HTTP stubs.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Request, State},
    http::Response,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::{
    api::{
        AppState,
        session::{Claims, SESSION_COOKIE, encode_jwt},
    },
    auth::Auth,
    upstream::{RestClient, sentiment::SentimentClient},
};

pub const SESSION_SECRET: &str = "test-session-secret-32-chars-pad";

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// Serve `router` on an ephemeral local port and return its base URL
/// (no trailing slash).
pub async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Base URL of a port nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn make_state(db: DatabaseConnection, backend_url: &str, sentiment_url: &str) -> AppState {
    AppState {
        auth: Arc::new(Auth::new(db.clone())),
        db,
        session_secret: SESSION_SECRET.to_string(),
        session_expiry_hours: 1,
        backend: RestClient::new(backend_url),
        sentiment: SentimentClient::new(sentiment_url),
    }
}

/// `Cookie` header value for a signed-in `username`.
pub fn session_cookie(username: &str) -> String {
    let claims = Claims {
        sub: Uuid::now_v7(),
        username: username.to_string(),
        exp: (Utc::now().timestamp() as u64) + 3600,
    };
    let token = encode_jwt(&claims, SESSION_SECRET).unwrap();
    format!("{SESSION_COOKIE}={token}")
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn count_hits(State(hits): State<Arc<AtomicUsize>>, req: Request, next: Next) -> Response<Body> {
    hits.fetch_add(1, Ordering::SeqCst);
    next.run(req).await
}

/// Fake dealer backend. Dealer 15 has two reviews, dealer 7 answers with an
/// error object instead of a list, dealer 9 mixes a good review with a
/// textless one and a stray string; `/insert_review` answers `{}` for an
/// empty review and plain text for a review of "garbled".
pub async fn spawn_dealer_backend() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let dealers = || {
        json!([
            { "id": 1, "full_name": "Holdlamis Car Dealership", "state": "Texas" },
            { "id": 15, "full_name": "Temp Dealership", "state": "Kansas" },
        ])
    };

    let router = Router::new()
        .route("/fetchDealers", get(move || async move { Json(dealers()) }))
        .route(
            "/fetchDealers/{state}",
            get(move |Path(state): Path<String>| async move {
                let filtered: Vec<Value> = dealers()
                    .as_array()
                    .unwrap()
                    .iter()
                    .filter(|d| d["state"] == state.as_str())
                    .cloned()
                    .collect();
                Json(Value::Array(filtered))
            }),
        )
        .route(
            "/fetchDealer/{id}",
            get(|Path(id): Path<u64>| async move {
                Json(json!([{ "id": id, "full_name": "Temp Dealership" }]))
            }),
        )
        .route(
            "/fetchReviews/dealer/{id}",
            get(|Path(id): Path<u64>| async move {
                match id {
                    15 => Json(json!([
                        { "id": 1, "name": "Berkly", "dealership": 15, "review": "a great experience" },
                        { "id": 2, "name": "Gwen", "dealership": 15, "review": "terrible paperwork" },
                    ])),
                    7 => Json(json!({ "error": "Error fetching documents" })),
                    9 => Json(json!([
                        { "id": 3, "name": "Ana", "dealership": 9, "review": "a great experience" },
                        { "id": 4, "name": "Lee", "dealership": 9, "review": null },
                        "not a review",
                    ])),
                    _ => Json(json!([])),
                }
            }),
        )
        .route(
            "/insert_review",
            post(|Json(body): Json<Value>| async move {
                match body["review"].as_str() {
                    Some("") => Json(json!({})).into_response(),
                    Some("garbled") => "<html>500</html>".into_response(),
                    _ => Json(json!({ "id": 99, "review": body["review"] })).into_response(),
                }
            }),
        )
        .layer(middleware::from_fn_with_state(hits.clone(), count_hits));

    (spawn_stub(router).await, hits)
}

/// Fake sentiment analyzer: "great" is positive, "terrible" is negative.
/// Returns the base URL with a trailing slash.
pub async fn spawn_analyzer() -> String {
    let router = Router::new().route(
        "/analyze/{text}",
        get(|Path(text): Path<String>| async move {
            let sentiment = if text.contains("terrible") {
                "negative"
            } else if text.contains("great") {
                "positive"
            } else {
                "neutral"
            };
            Json(json!({ "sentiment": sentiment }))
        }),
    );
    format!("{}/", spawn_stub(router).await)
}
