//! Integration tests for the HTTP price source against a local upstream

use alu_dash::error::{ErrorKind, FeedError};
use alu_dash::feed::{
    ContractMonth, FeedKind, HttpFeed, PriceSource, PriceStream, RateField, StreamEvent,
};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Router;
use futures_util::stream;
use rust_decimal_macros::dec;
use std::convert::Infallible;
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_upstream(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn next_event(stream: &mut PriceStream) -> StreamEvent {
    tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("stream event")
}

fn upstream() -> Router {
    Router::new()
        .route(
            "/api/metal-price",
            get(|| async {
                r#"{"success": true, "data": {"spotPrice": 2650.5, "change": -12.5, "changePercent": -0.47, "lastUpdated": "2025-03-10T09:15:00Z"}}"#
            }),
        )
        .route(
            "/mcx",
            get(|| async {
                r#"{"date": "2025-03-10", "time": "15:30:00", "timestamp": "2025-03-10 15:30:00",
                    "prices": {"31 Mar 2025": {"price": "233.10", "site_rate_change": "+0.50 (+0.21%)"},
                               "30 Apr 2025": {"price": "234.95", "site_rate_change": "+0.65 (+0.28%)"}}}"#
            }),
        )
        .route(
            "/sbitt",
            get(|| async { r#"{"success": true, "data": [{"date": "10-03-2025", "sbi_tt_sell": "84.65"}]}"# }),
        )
        .route(
            "/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "scraper restarting") }),
        )
        .route("/garbage", get(|| async { "<html>not json</html>" }))
        .route(
            "/stream",
            get(|| async {
                let events = vec![
                    Ok::<_, Infallible>(Event::default().data(r#"{"heartbeat": true}"#)),
                    Ok(Event::default().data(
                        r#"{"Value": "US$ 2,639.50", "Rate of Change": "-39.25 ((-1.60%))", "Timestamp": "2025-03-10 14:30:05"}"#,
                    )),
                    Ok(Event::default().data("not json")),
                    Ok(Event::default().data(r#"{"Value": "2,641.00", "Rate of Change": "-37.75"}"#)),
                ];
                Sse::new(stream::iter(events))
            }),
        )
}

#[tokio::test]
async fn test_fetch_spot_price() {
    let base = spawn_upstream(upstream()).await;
    let feed = HttpFeed::new("lme_spot", FeedKind::Spot, format!("{}/api/metal-price", base));

    let snap = feed.fetch_once().await.unwrap();
    assert_eq!(snap.source_id, "lme_spot");
    assert_eq!(snap.value, dec!(2650.5));
    assert_eq!(snap.change, Some(dec!(-12.5)));
    assert_eq!(snap.change_percent, Some(dec!(-0.47)));
    assert!(snap.source_timestamp.is_some());
}

#[tokio::test]
async fn test_fetch_contract_months() {
    let base = spawn_upstream(upstream()).await;
    let url = format!("{}/mcx", base);

    let near = HttpFeed::new(
        "mcx_near",
        FeedKind::ContractMonth {
            month: ContractMonth::Position(0),
        },
        &url,
    );
    let next = HttpFeed::new(
        "mcx_next",
        FeedKind::ContractMonth {
            month: ContractMonth::Label("30 Apr 2025".into()),
        },
        &url,
    );

    assert_eq!(near.fetch_once().await.unwrap().value, dec!(233.10));
    let next = next.fetch_once().await.unwrap();
    assert_eq!(next.value, dec!(234.95));
    assert_eq!(next.change_percent, Some(dec!(0.28)));
}

#[tokio::test]
async fn test_fetch_exchange_rate() {
    let base = spawn_upstream(upstream()).await;
    let feed = HttpFeed::new(
        "sbi_tt",
        FeedKind::ExchangeRate {
            field: RateField::SbiTtSell,
        },
        format!("{}/sbitt", base),
    );

    let snap = feed.fetch_once().await.unwrap();
    assert_eq!(snap.value, dec!(84.65));
    assert!(snap.change.is_none());
}

#[tokio::test]
async fn test_fetch_non_success_status_is_network_error() {
    let base = spawn_upstream(upstream()).await;
    let feed = HttpFeed::new("lme_spot", FeedKind::Spot, format!("{}/down", base));

    let err = feed.fetch_once().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    match err {
        FeedError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "scraper restarting");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_malformed_payload_is_parse_error() {
    let base = spawn_upstream(upstream()).await;
    let feed = HttpFeed::new("lme_3m", FeedKind::ThreeMonth, format!("{}/garbage", base));

    let err = feed.fetch_once().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn test_stream_events_in_order_then_closed() {
    let base = spawn_upstream(upstream()).await;
    let feed = HttpFeed::new("lme_3m", FeedKind::ThreeMonth, format!("{}/data", base))
        .with_stream(format!("{}/stream", base));

    let mut stream = feed.subscribe().await.unwrap().expect("stream configured");

    assert!(matches!(next_event(&mut stream).await, StreamEvent::Heartbeat));
    match next_event(&mut stream).await {
        StreamEvent::Snapshot(snap) => {
            assert_eq!(snap.value, dec!(2639.50));
            assert_eq!(snap.change, Some(dec!(-39.25)));
            assert_eq!(snap.change_percent, Some(dec!(-1.60)));
        }
        other => panic!("expected snapshot, got {:?}", other),
    }
    assert!(matches!(next_event(&mut stream).await, StreamEvent::Malformed(_)));
    match next_event(&mut stream).await {
        StreamEvent::Snapshot(snap) => {
            assert_eq!(snap.value, dec!(2641.00));
            assert!(snap.change_percent.is_none());
        }
        other => panic!("expected snapshot, got {:?}", other),
    }
    assert!(matches!(next_event(&mut stream).await, StreamEvent::Closed(Some(_))));
}

#[tokio::test]
async fn test_stream_bad_status_closes() {
    let base = spawn_upstream(upstream()).await;
    let feed = HttpFeed::new("lme_3m", FeedKind::ThreeMonth, format!("{}/data", base))
        .with_stream(format!("{}/down", base));

    let mut stream = feed.subscribe().await.unwrap().unwrap();
    let event = next_event(&mut stream).await;
    assert!(matches!(event, StreamEvent::Closed(Some(FeedError::Network(_)))));
}
