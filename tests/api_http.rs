// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/news  (validation, empty-news short circuit, full payload, cache,
//   panic guard)
// - GET /api/real-time

mod common;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use common::{
    app, app_state, app_state_with, article, january_rows, Outcome, PanickingNews, StubNews,
    StubTrends,
};
use news_trend_dashboard::create_router;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

async fn get(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

/// Articles on Jan 1st and 2nd 2024; trend rows for Jan 1..=5.
fn busy_stubs() -> (std::sync::Arc<StubNews>, std::sync::Arc<StubTrends>) {
    let mut articles = vec![
        article("excelente maravilhoso ótimo", "2024-01-01T10:00:00Z"),
        article("crise terrível", "2024-01-01T18:30:00Z"),
        article("previsão do tempo", "2024-01-02T09:00:00Z"),
    ];
    for i in 0..12 {
        articles.push(article(&format!("nota {i}"), "garbage-date"));
    }
    (
        StubNews::always(Outcome::Ok(articles)),
        StubTrends::always(Outcome::Ok(january_rows(5, 2))),
    )
}

#[tokio::test]
async fn health_returns_ok() {
    let (news, trends) = busy_stubs();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app(news, trends).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn out_of_range_days_is_rejected_before_any_fetch() {
    let (news, trends) = busy_stubs();
    let (status, v) = get(app(news.clone(), trends.clone()), "/api/news?days=0").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["status"], "error");
    assert_eq!(v["message"], "Invalid parameter: days");
    assert_eq!(news.calls(), 0);
    assert!(trends.queries().is_empty());
}

#[tokio::test]
async fn non_numeric_days_and_long_query_are_rejected() {
    let (news, trends) = busy_stubs();
    let (status, v) = get(app(news.clone(), trends.clone()), "/api/news?days=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], "Invalid parameter: days");

    let long = "x".repeat(101);
    let (status, v) = get(app(news.clone(), trends), &format!("/api/news?query={long}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], "Invalid parameter: query");
    assert_eq!(news.calls(), 0);
}

#[tokio::test]
async fn no_articles_short_circuits_with_empty_sections() {
    let news = StubNews::always(Outcome::Ok(vec![]));
    let trends = StubTrends::always(Outcome::Ok(january_rows(5, 1)));

    let (status, v) = get(app(news, trends.clone()), "/api/news?query=tecnologia&days=7").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "success");
    assert_eq!(v["news"], json!([]));
    assert_eq!(v["analytics"], json!({}));
    assert_eq!(v["visualizations"], json!({}));
    assert!(trends.queries().is_empty(), "trends must not be fetched without news");
}

#[tokio::test]
async fn full_payload_has_news_analytics_and_charts() {
    let (news, trends) = busy_stubs();
    let (status, v) = get(
        app(news, trends.clone()),
        "/api/news?query=ia&days=7&keywords=rust,%20go",
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {v}");
    assert_eq!(v["status"], "success");

    // Only the first 10 articles are formatted for display.
    let news = v["news"].as_array().unwrap();
    assert_eq!(news.len(), 10);
    assert_eq!(news[0]["date"], "01/01/2024 10:00");
    assert_eq!(news[0]["source"], "Stub Wire");
    assert_eq!(news[0]["content"], "Body text...");
    assert_eq!(news[5]["date"], "garbage-date");

    let sentiment = v["analytics"]["sentiment"].as_array().unwrap();
    assert_eq!(sentiment.len(), 3);
    let total: u64 = sentiment.iter().map(|s| s["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 15);
    assert_eq!(sentiment[0], json!({"sentiment": "positive", "count": 1}));
    assert_eq!(sentiment[2], json!({"sentiment": "negative", "count": 1}));

    assert_eq!(v["analytics"]["keywords"], json!(["rust", "go"]));
    let stats = &v["analytics"]["trends"];
    assert_eq!(stats["news_count"]["count"], 5);
    assert_eq!(stats["news_count"]["max"], 2.0);
    assert_eq!(stats["rust"]["min"], 3.0);

    let trend_graph = &v["visualizations"]["trend_graph"];
    assert_eq!(trend_graph["data"][0]["name"], "rust");
    assert_eq!(trend_graph["data"][0]["x"].as_array().unwrap().len(), 5);
    assert_eq!(
        v["visualizations"]["sentiment_graph"]["data"][0]["marker"]["colors"],
        json!(["#2ecc71", "#3498db", "#e74c3c"])
    );

    let q = &trends.queries()[0];
    assert_eq!(q.keywords, vec!["rust".to_string(), "go".to_string()]);
    assert_eq!(q.geo, "BR");
}

#[tokio::test]
async fn trend_outage_falls_back_to_synthetic_series() {
    let (news, _) = busy_stubs();
    let trends = StubTrends::always(Outcome::RateLimited);

    let (status, v) = get(app(news, trends), "/api/news?query=ia&days=30").await;

    assert_eq!(status, StatusCode::OK);
    let x = v["visualizations"]["trend_graph"]["data"][0]["x"].as_array().unwrap();
    assert_eq!(x.len(), 90);
    assert_eq!(v["analytics"]["trends"]["ia"]["count"], 90);
}

#[tokio::test]
async fn identical_query_is_served_from_cache() {
    let (news, trends) = busy_stubs();
    let state = app_state(news.clone(), trends);
    let router = create_router(state.clone());

    let (s1, v1) = get(router.clone(), "/api/news?query=ia&days=7").await;
    let (s2, v2) = get(router.clone(), "/api/news?query=ia&days=7").await;
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(s2, StatusCode::OK);
    assert_eq!(v1, v2);
    assert_eq!(news.calls(), 1);
    assert_eq!(state.cache().len(), 1);

    // A different query string is a different key.
    get(router, "/api/news?query=ia&days=8").await;
    assert_eq!(news.calls(), 2);
}

#[tokio::test]
async fn real_time_reports_engagement_metric() {
    let (news, trends) = busy_stubs();
    let (status, v) = get(app(news, trends), "/api/real-time").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["metric"], "engagement");
    assert_eq!(v["status"], "success");
    let value = v["value"].as_u64().unwrap();
    assert!((1..=100).contains(&value));
    assert!(v["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn handler_panic_becomes_json_500() {
    let trends = StubTrends::always(Outcome::Ok(january_rows(3, 1)));
    let router = create_router(app_state_with(std::sync::Arc::new(PanickingNews), trends));

    let (status, v) = get(router, "/api/news?query=ia&days=7").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        v,
        json!({
            "status": "error",
            "message": "Internal server error",
            "code": 500,
            "details": "news provider exploded",
        })
    );
}
