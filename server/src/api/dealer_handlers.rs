use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use crate::upstream::{UpstreamError, is_truthy};

use super::{
    AppState,
    dto::{DealerResponse, DealersResponse, Review, ReviewSubmission, ReviewsResponse, StatusMessage},
    session::Session,
};

/// Dealer ids are positive integers; anything else is a bad request.
fn parse_dealer_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|id| *id != 0)
}

pub async fn get_dealerships(State(state): State<AppState>) -> Json<DealersResponse> {
    let dealers = state.backend.get("/fetchDealers", &[]).await;
    Json(DealersResponse {
        status: StatusCode::OK.as_u16(),
        dealers,
    })
}

pub async fn get_dealerships_by_state(
    State(state): State<AppState>,
    Path(dealer_state): Path<String>,
) -> Json<DealersResponse> {
    let endpoint = if dealer_state == "All" {
        "/fetchDealers".to_string()
    } else {
        format!("/fetchDealers/{dealer_state}")
    };
    let dealers = state.backend.get(&endpoint, &[]).await;
    Json(DealersResponse {
        status: StatusCode::OK.as_u16(),
        dealers,
    })
}

/// `GET /dealer` (and `/dealer/` after trimming): no id given.
pub async fn missing_dealer_id() -> StatusMessage {
    StatusMessage::bad_request()
}

pub async fn get_dealer_details(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DealerResponse>, StatusMessage> {
    let id = parse_dealer_id(&raw_id).ok_or_else(StatusMessage::bad_request)?;
    let dealer = state.backend.get(&format!("/fetchDealer/{id}"), &[]).await;
    Ok(Json(DealerResponse {
        status: StatusCode::OK.as_u16(),
        dealer,
    }))
}

pub async fn get_dealer_reviews(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ReviewsResponse>, StatusMessage> {
    let id = parse_dealer_id(&raw_id).ok_or_else(StatusMessage::bad_request)?;
    let body = state
        .backend
        .get(&format!("/fetchReviews/dealer/{id}"), &[])
        .await;

    let mut reviews = decode_reviews(id, body);
    for review in &mut reviews {
        let sentiment = state.sentiment.analyze(&review.review).await;
        review.sentiment = Some(sentiment.label().to_string());
    }

    Ok(Json(ReviewsResponse {
        status: StatusCode::OK.as_u16(),
        reviews,
    }))
}

fn decode_reviews(dealer_id: u64, body: Option<Value>) -> Vec<Review> {
    match body {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(review) => Some(review),
                Err(e) => {
                    tracing::warn!(dealer_id, error = %e, "skipping malformed review");
                    None
                }
            })
            .collect(),
        Some(other) => {
            tracing::warn!(dealer_id, reply = %other, "backend returned no review list");
            Vec::new()
        }
        None => {
            tracing::warn!(dealer_id, "no reviews from backend");
            Vec::new()
        }
    }
}

pub async fn add_review(
    Session(session): Session,
    State(state): State<AppState>,
    body: Bytes,
) -> StatusMessage {
    let Some(claims) = session else {
        return StatusMessage::new(StatusCode::FORBIDDEN, "Unauthorized");
    };

    let submission: ReviewSubmission = match serde_json::from_slice(&body) {
        Ok(submission) => submission,
        Err(e) if e.is_data() => {
            return StatusMessage::new(StatusCode::BAD_REQUEST, format!("Invalid review: {e}"));
        }
        Err(_) => return StatusMessage::new(StatusCode::BAD_REQUEST, "Invalid JSON"),
    };

    match state.backend.try_post("/insert_review", &submission).await {
        Ok(reply) if is_truthy(&reply) => {
            tracing::info!(
                username = %claims.username,
                dealership = submission.dealership,
                "review posted"
            );
            StatusMessage::new(StatusCode::OK, "Review posted successfully")
        }
        Ok(_) | Err(UpstreamError::Network { .. } | UpstreamError::Decode { .. }) => {
            StatusMessage::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to post review")
        }
        Err(e) => StatusMessage::new(
            StatusCode::UNAUTHORIZED,
            format!("Error in posting review: {e}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{app_router, with_trimmed_paths},
        config::Config,
        test_support::{
            body_json, closed_port_url, make_state, session_cookie, setup_db, spawn_analyzer,
            spawn_dealer_backend,
        },
    };
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, header},
    };
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use tower::ServiceExt;

    async fn router(backend_url: &str, sentiment_url: &str) -> Router {
        let state = make_state(setup_db().await, backend_url, sentiment_url);
        app_router(state, &Config::from_lookup(|_| None))
    }

    async fn get_json(app: Router, uri: &str) -> Value {
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        body_json(res).await
    }

    fn post_review(body: &str, cookie: Option<String>) -> Request<Body> {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/review")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    async fn submit(app: Router, body: &str, cookie: Option<String>) -> Value {
        let res = app.oneshot(post_review(body, cookie)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        body_json(res).await
    }

    const VALID_REVIEW: &str =
        r#"{"name":"Jo","dealership":15,"review":"a great experience","purchase":false}"#;

    #[test]
    fn dealer_id_must_be_positive_integer() {
        assert_eq!(parse_dealer_id("15"), Some(15));
        assert_eq!(parse_dealer_id("0"), None);
        assert_eq!(parse_dealer_id(""), None);
        assert_eq!(parse_dealer_id("abc"), None);
        assert_eq!(parse_dealer_id("-3"), None);
    }

    #[tokio::test]
    async fn dealerships_lists_all_or_filters_by_state() {
        let (backend, _) = spawn_dealer_backend().await;
        let app = router(&backend, "http://unused/").await;

        let all = get_json(app.clone(), "/dealerships").await;
        assert_eq!(all["status"], 200);
        assert_eq!(all["dealers"].as_array().unwrap().len(), 2);

        let same = get_json(app.clone(), "/dealerships/All").await;
        assert_eq!(same["dealers"], all["dealers"]);

        let kansas = get_json(app, "/dealerships/Kansas").await;
        assert_eq!(kansas["dealers"], json!([{ "id": 15, "full_name": "Temp Dealership", "state": "Kansas" }]));
    }

    #[tokio::test]
    async fn dealerships_null_when_backend_down() {
        let app = router(&closed_port_url().await, "http://unused/").await;
        let body = get_json(app, "/dealerships").await;
        assert_eq!(body, json!({ "status": 200, "dealers": null }));
    }

    #[tokio::test]
    async fn dealer_details_proxies_backend() {
        let (backend, _) = spawn_dealer_backend().await;
        let body = get_json(router(&backend, "http://unused/").await, "/dealer/15").await;
        assert_eq!(
            body,
            json!({ "status": 200, "dealer": [{ "id": 15, "full_name": "Temp Dealership" }] })
        );
    }

    #[tokio::test]
    async fn invalid_dealer_id_is_rejected_without_outbound_call() {
        let (backend, hits) = spawn_dealer_backend().await;
        let app = router(&backend, "http://unused/").await;
        let bad = json!({ "status": 400, "message": "Bad Request" });

        assert_eq!(get_json(app.clone(), "/dealer/0").await, bad);
        assert_eq!(get_json(app.clone(), "/dealer/abc").await, bad);
        assert_eq!(get_json(app.clone(), "/dealer/0/reviews").await, bad);
        assert_eq!(get_json(app.clone(), "/dealer").await, bad);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        // `/dealer/` only reaches `/dealer` once trailing slashes are trimmed
        let res = with_trimmed_paths(app)
            .oneshot(Request::builder().uri("/dealer/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(res).await, bad);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reviews_carry_sentiment() {
        let (backend, _) = spawn_dealer_backend().await;
        let analyzer = spawn_analyzer().await;
        let body = get_json(router(&backend, &analyzer).await, "/dealer/15/reviews").await;

        assert_eq!(body["status"], 200);
        let reviews = body["reviews"].as_array().unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0]["name"], "Berkly");
        assert_eq!(reviews[0]["sentiment"], "positive");
        assert_eq!(reviews[1]["sentiment"], "negative");
    }

    #[tokio::test]
    async fn reviews_default_to_neutral_when_analyzer_down() {
        let (backend, _) = spawn_dealer_backend().await;
        let analyzer = format!("{}/", closed_port_url().await);
        let body = get_json(router(&backend, &analyzer).await, "/dealer/15/reviews").await;

        for review in body["reviews"].as_array().unwrap() {
            assert_eq!(review["sentiment"], "neutral");
        }
    }

    #[tokio::test]
    async fn reviews_empty_when_backend_has_no_list() {
        let (backend, _) = spawn_dealer_backend().await;
        let analyzer = spawn_analyzer().await;
        let app = router(&backend, &analyzer).await;

        // dealer 7 answers with an error object
        assert_eq!(
            get_json(app, "/dealer/7/reviews").await,
            json!({ "status": 200, "reviews": [] })
        );

        let down = router(&closed_port_url().await, &analyzer).await;
        assert_eq!(
            get_json(down, "/dealer/15/reviews").await,
            json!({ "status": 200, "reviews": [] })
        );
    }

    #[tokio::test]
    async fn reviews_keep_good_entries_next_to_malformed_ones() {
        let (backend, _) = spawn_dealer_backend().await;
        let analyzer = spawn_analyzer().await;
        let body = get_json(router(&backend, &analyzer).await, "/dealer/9/reviews").await;

        let reviews = body["reviews"].as_array().unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0]["name"], "Ana");
        assert_eq!(reviews[0]["sentiment"], "positive");
        assert_eq!(reviews[1]["name"], "Lee");
        assert_eq!(reviews[1]["review"], "");
        assert_eq!(reviews[1]["sentiment"], "neutral");
    }

    #[tokio::test]
    async fn add_review_requires_session_before_anything_else() {
        let (backend, hits) = spawn_dealer_backend().await;
        let app = router(&backend, "http://unused/").await;

        for body in [VALID_REVIEW, "not valid json", ""] {
            assert_eq!(
                submit(app.clone(), body, None).await,
                json!({ "status": 403, "message": "Unauthorized" })
            );
        }

        let forged = Some("session=not-a-token".to_string());
        assert_eq!(submit(app, VALID_REVIEW, forged).await["status"], 403);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn add_review_rejects_bad_bodies() {
        let (backend, hits) = spawn_dealer_backend().await;
        let app = router(&backend, "http://unused/").await;

        let body = submit(app.clone(), "not valid json", Some(session_cookie("jo"))).await;
        assert_eq!(body, json!({ "status": 400, "message": "Invalid JSON" }));

        let body = submit(app, r#"{"name":"Jo"}"#, Some(session_cookie("jo"))).await;
        assert_eq!(body["status"], 400);
        assert!(body["message"].as_str().unwrap().starts_with("Invalid review: "));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn add_review_posts_to_backend() {
        let (backend, hits) = spawn_dealer_backend().await;
        let app = router(&backend, "http://unused/").await;

        let body = submit(app, VALID_REVIEW, Some(session_cookie("jo"))).await;
        assert_eq!(body, json!({ "status": 200, "message": "Review posted successfully" }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn add_review_failure_modes() {
        let (backend, _) = spawn_dealer_backend().await;
        let app = router(&backend, "http://unused/").await;
        let failed = json!({ "status": 500, "message": "Failed to post review" });

        // backend answers `{}`
        let empty = r#"{"name":"Jo","dealership":15,"review":""}"#;
        assert_eq!(submit(app.clone(), empty, Some(session_cookie("jo"))).await, failed);

        // backend answers with something that is not JSON
        let garbled = r#"{"name":"Jo","dealership":15,"review":"garbled"}"#;
        assert_eq!(submit(app, garbled, Some(session_cookie("jo"))).await, failed);

        let down = router(&closed_port_url().await, "http://unused/").await;
        assert_eq!(submit(down, VALID_REVIEW, Some(session_cookie("jo"))).await, failed);
    }

    #[tokio::test]
    async fn login_cookie_authorizes_add_review() {
        let (backend, hits) = spawn_dealer_backend().await;
        let state = make_state(setup_db().await, &backend, "http://unused/");
        state
            .auth
            .register(crate::auth::NewUser {
                username: "jo",
                password: "pw",
                first_name: "Jo",
                last_name: "Smith",
                email: "jo@example.com",
            })
            .await
            .unwrap();
        let app = app_router(state, &Config::from_lookup(|_| None));

        let login = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"userName":"jo","password":"pw"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let cookie = login.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let body = submit(app, VALID_REVIEW, Some(cookie)).await;
        assert_eq!(body, json!({ "status": 200, "message": "Review posted successfully" }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
