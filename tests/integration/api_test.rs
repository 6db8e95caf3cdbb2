//! Integration tests for the JSON API

use alu_dash::aggregate::{FeedRole, PriceAggregator};
use alu_dash::api::{router, AppState, USER_ID_HEADER};
use alu_dash::error::ErrorKind;
use alu_dash::feed::PriceSnapshot;
use alu_dash::scheduler::{ConnectionMode, FeedState};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tokio::sync::watch;
use tower::ServiceExt;

fn polled(id: &str, value: Decimal) -> FeedState {
    let snapshot = PriceSnapshot::new(id, value);
    FeedState {
        updated_at: Some(snapshot.timestamp),
        snapshot: Some(snapshot),
        mode: ConnectionMode::Polling,
        last_error: None,
    }
}

/// Aggregator over fixed states; the senders keep the slots alive
fn aggregator(states: Vec<(FeedRole, FeedState)>) -> (PriceAggregator, Vec<watch::Sender<FeedState>>) {
    let mut aggregator = PriceAggregator::new();
    let mut senders = Vec::new();
    for (role, state) in states {
        let (tx, rx) = watch::channel(state);
        aggregator.insert(role, rx);
        senders.push(tx);
    }
    (aggregator, senders)
}

fn app() -> Router {
    router(AppState::new(PriceAggregator::new()))
}

async fn send(app: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn onboarding_form() -> Value {
    json!({
        "companyName": "Acme Alloys",
        "businessType": "Trader",
        "role": "Owner",
        "phoneNumber": "9876543210",
        "pincode": "400001",
        "gstin": "27AAPFU0939F1ZV",
        "interestedMetals": ["Aluminium"]
    })
}

#[tokio::test]
async fn test_liveness() {
    let response = app()
        .oneshot(Request::get("/api/health/live").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_degraded_when_feed_stale() {
    let mut stale = polled("rbi", dec!(84.40));
    stale.last_error = Some(ErrorKind::Network);
    let (prices, _senders) = aggregator(vec![
        (FeedRole::McxNear, polled("mcx_near", dec!(233.10))),
        (FeedRole::Rbi, stale),
    ]);
    let app = router(AppState::new(prices));

    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["feeds"]["rbi"]["stale"], true);
    assert_eq!(body["feeds"]["mcx_near"]["mode"], "polling");
}

#[tokio::test]
async fn test_dashboard_and_quote() {
    let (prices, _senders) = aggregator(vec![
        (FeedRole::LmeSpot, polled("lme_spot", dec!(2650.00))),
        (FeedRole::LmeThreeMonth, polled("lme_3m", dec!(2610.00))),
        (FeedRole::McxNear, polled("mcx_near", dec!(233.10))),
        (FeedRole::McxNext, polled("mcx_next", dec!(234.95))),
        (FeedRole::SbiTt, polled("sbi_tt", dec!(84.65))),
    ]);
    let app = router(AppState::new(prices));

    let (status, body) = send(&app, Method::GET, "/api/dashboard", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["lme"]["structure"], "BACKWARDATION");
    assert_eq!(body["data"]["lme"]["spread"], "40.00");
    assert_eq!(body["data"]["mcx"]["structure"], "CONTANGO");
    assert_eq!(body["data"]["mcx"]["spread"], "1.85");
    assert!(body["data"]["rates"]["rbi"].is_null());

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/quote?basis=sbi_tt&premium=5&freight=2",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["basis"], "sbi_tt");
    assert_eq!(body["data"]["rate"], "84.65");
    assert_eq!(body["data"]["mcx"], "240.10");
    assert!(body["data"]["lme"].is_string());

    // No RBI rate held, so no LME landed price
    let (_, body) = send(&app, Method::GET, "/api/quote", None, None).await;
    assert_eq!(body["data"]["basis"], "rbi");
    assert!(body["data"]["lme"].is_null());
}

#[tokio::test]
async fn test_onboarding_success_marks_session() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/session", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["onboardingCompleted"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/onboarding",
        Some("user_1"),
        Some(onboarding_form()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["userId"], "user_1");
    assert_eq!(body["data"]["gstin"], "27AAPFU0939F1ZV");

    let (_, body) = send(&app, Method::GET, "/api/session", Some("user_1"), None).await;
    assert_eq!(body["data"]["onboardingCompleted"], true);
}

#[tokio::test]
async fn test_onboarding_missing_fields() {
    let mut form = onboarding_form();
    form.as_object_mut().unwrap().remove("gstin");
    form["role"] = json!("");

    let (status, body) = send(&app(), Method::POST, "/api/onboarding", Some("user_1"), Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing required fields");
    assert_eq!(body["missingFields"], json!(["role", "gstin"]));
    assert_eq!(body["fields"], json!(["role", "gstin"]));
}

#[tokio::test]
async fn test_onboarding_format_errors() {
    let app = app();

    let mut form = onboarding_form();
    form["gstin"] = json!("27AAPFU0939F1Z");
    let (status, body) = send(&app, Method::POST, "/api/onboarding", Some("user_1"), Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "GSTIN must be 15 characters long");
    assert_eq!(body["fields"], json!(["gstin"]));
    assert!(body.get("missingFields").is_none());

    let mut form = onboarding_form();
    form["phoneNumber"] = json!("98765");
    let (_, body) = send(&app, Method::POST, "/api/onboarding", Some("user_1"), Some(form)).await;
    assert_eq!(body["message"], "Phone number must be at least 10 digits");
    assert_eq!(body["fields"], json!(["phoneNumber"]));

    let mut form = onboarding_form();
    form["interestedMetals"] = json!([]);
    let (_, body) = send(&app, Method::POST, "/api/onboarding", Some("user_1"), Some(form)).await;
    assert_eq!(body["message"], "Please select at least one metal");
}

#[tokio::test]
async fn test_onboarding_requires_identity() {
    let (status, body) = send(&app(), Method::POST, "/api/onboarding", None, Some(onboarding_form())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");

    let (status, _) = send(&app(), Method::POST, "/api/onboarding", Some("  "), Some(onboarding_form())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_alert_lifecycle() {
    let app = app();
    let alert = json!({
        "category": "MCX",
        "alertType": "price",
        "targetPrice": 240,
        "notifications": {"web": true}
    });

    let (status, body) = send(&app, Method::POST, "/api/alerts", Some("user_1"), Some(alert)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, Method::GET, "/api/alerts?status=active", Some("user_1"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, Method::GET, "/api/alerts", Some("user_2"), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let uri = format!("/api/alerts/{}", id);
    let (status, _) = send(&app, Method::DELETE, &uri, Some("user_2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, &uri, Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Alert deleted");

    let (_, body) = send(&app, Method::GET, "/api/alerts", Some("user_1"), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_alert_validation() {
    let alert = json!({
        "category": "Suppliers",
        "alertType": "percentage",
        "targetPercentage": 2,
        "notificationMethods": {"email": true}
    });
    let (status, body) = send(&app(), Method::POST, "/api/alerts", Some("user_1"), Some(alert)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["missingFields"], json!(["suppliers"]));

    let alert = json!({"category": "LME", "alertType": "price", "targetPrice": 2600});
    let (status, body) = send(&app(), Method::POST, "/api/alerts", Some("user_1"), Some(alert)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Select at least one notification method");
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let app = app();
    send(&app, Method::POST, "/api/onboarding", Some("user_1"), Some(onboarding_form())).await;

    let (status, body) = send(&app, Method::POST, "/api/session/sign-out", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Signed out");

    // The stored profile restores the flag on the next session
    let (status, body) = send(&app, Method::GET, "/api/session", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["onboardingCompleted"], true);

    let (_, body) = send(&app, Method::POST, "/api/session/sign-out", Some("user_2"), None).await;
    assert_eq!(body["success"], true);
    let (_, body) = send(&app, Method::GET, "/api/session", Some("user_2"), None).await;
    assert_eq!(body["data"]["onboardingCompleted"], false);

    let (status, _) = send(&app, Method::POST, "/api/session/sign-out", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_identity_checked_before_body() {
    let app = app();
    for uri in ["/api/onboarding", "/api/alerts"] {
        let (status, body) = send(&app, Method::POST, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_malformed_body_gets_json_envelope() {
    let app = app();

    let mut form = onboarding_form();
    form["interestedMetals"] = json!("Aluminium");
    let (status, body) = send(&app, Method::POST, "/api/onboarding", Some("user_1"), Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid request body"));

    let (status, body) = send(&app, Method::POST, "/api/alerts", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_quote_rejects_out_of_range_premium() {
    let (prices, _senders) = aggregator(vec![(FeedRole::McxNear, polled("mcx_near", dec!(233.10)))]);
    let app = router(AppState::new(prices));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/quote?premium=79228162514264337593543950335",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Premium or freight is out of range");

    // The server is still answering
    let (status, body) = send(&app, Method::GET, "/api/quote?premium=5", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["mcx"], "238.10");
}
