use async_trait::async_trait;
use hyper::{header::CONTENT_TYPE, StatusCode};
use hypercalc::{
    eval::Expression,
    history::{HistoryStore, MemoryStore, Record, StoreError},
    test::Client,
    App,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn client() -> (MemoryStore, Client) {
    let store = MemoryStore::new();
    let client = App::new(Arc::new(store.clone())).test_client();
    (store, client)
}

fn items(page: &str) -> Vec<&str> {
    page.split("<li>")
        .skip(1)
        .map(|s| s.split("</li>").next().unwrap())
        .collect()
}

#[tokio::test]
async fn test_single_stage() {
    let (_, app) = client();

    let r = app.get("/3/divide/2").dispatch().await;
    assert_eq!(StatusCode::OK, r.status());
    assert_eq!("application/json", r.headers()[CONTENT_TYPE]);
    assert_eq!(r#"{"question":"3 / 2","answer":1.5}"#, r.body());

    let r = app.get("/7/into/6").dispatch_json::<Expression>().await;
    assert_eq!("7 * 6", r.body().question);
    assert_eq!(42.0, r.body().answer);
}

#[tokio::test]
async fn test_two_stages() {
    let (_, app) = client();

    let r = app.get("/5/plus/3/minus/2").dispatch().await;
    assert_eq!(StatusCode::OK, r.status());
    assert_eq!(r#"{"question":"5 + 3 - 2","answer":6}"#, r.body());

    // strictly left to right
    let r = app.get("/2/plus/3/into/4").dispatch_json::<Value>().await;
    assert_eq!(&json!({"question": "2 + 3 * 4", "answer": 20}), r.body());
}

#[tokio::test]
async fn test_zero_third_operand_skips_second_stage() {
    let (_, app) = client();

    let r = app.get("/5/plus/3/minus/0").dispatch().await;
    assert_eq!(StatusCode::OK, r.status());
    assert_eq!(r#"{"question":"5 + 3","answer":8}"#, r.body());
}

#[tokio::test]
async fn test_missing_third_operand_skips_second_stage() {
    let (_, app) = client();

    let r = app.get("/5/plus/3/minus").dispatch_json::<Value>().await;
    assert_eq!(&json!({"question": "5 + 3", "answer": 8}), r.body());

    // an unknown second operation is never inspected without a third operand
    let r = app.get("/5/plus/3/times/").dispatch_json::<Value>().await;
    assert_eq!(&json!({"question": "5 + 3", "answer": 8}), r.body());
}

#[tokio::test]
async fn test_invalid_numbers() {
    let (_, app) = client();

    for path in &[
        "/abc/plus/3",
        "/3/plus/abc",
        "/3/plus/4/minus/x",
        "/abc/times/3",
        "/inf/plus/1",
        "/1/plus/-infinity",
        "/nan/into/2",
    ] {
        let r = app.get(path).dispatch().await;
        assert_eq!(StatusCode::BAD_REQUEST, r.status(), "{}", path);
        assert_eq!(r#"{"error":"Invalid numbers provided"}"#, r.body(), "{}", path);
    }
}

#[tokio::test]
async fn test_invalid_operations() {
    let (_, app) = client();

    for path in &["/5/times/3", "/5/plus/3/times/2"] {
        let r = app.get(path).dispatch().await;
        assert_eq!(StatusCode::BAD_REQUEST, r.status(), "{}", path);
        assert_eq!(r#"{"error":"Invalid operation"}"#, r.body(), "{}", path);
    }
}

#[tokio::test]
async fn test_divide_by_zero() {
    let (store, app) = client();

    let r = app.get("/4/divide/0").dispatch().await;
    assert_eq!(StatusCode::OK, r.status());
    assert_eq!(r#"{"question":"4 / 0","answer":null}"#, r.body());

    let records = store.records().await;
    assert_eq!(1, records.len());
    assert!(records[0].answer.is_infinite());

    let r = app.get("/").dispatch().await;
    assert_eq!(vec!["4 / 0 = Infinity"], items(r.body()));
}

#[tokio::test]
async fn test_percent_decoded_segments() {
    let (_, app) = client();

    let r = app.get("/-1.5/into/%2B2").dispatch_json::<Value>().await;
    assert_eq!(&json!({"question": "-1.5 * 2", "answer": -3}), r.body());
}

#[tokio::test]
async fn test_only_successes_are_recorded() {
    let (store, app) = client();

    app.get("/1/plus/1").dispatch().await;
    app.get("/abc/plus/1").dispatch().await;
    app.get("/1/times/1").dispatch().await;
    app.get("/2/minus/1/plus/5").dispatch().await;

    let all = store.list_all().await.unwrap();
    let questions: Vec<_> = all.iter().map(|e| e.question.as_str()).collect();
    assert_eq!(vec!["1 + 1", "2 - 1 + 5"], questions);
}

#[tokio::test]
async fn test_history_lists_latest_twenty_newest_first() {
    let (_, app) = client();

    for n in 1..=25 {
        let r = app.get(&format!("/{}/plus/1", n)).dispatch().await;
        assert_eq!(StatusCode::OK, r.status());
    }

    let r = app.get("/history").dispatch().await;
    assert_eq!(StatusCode::OK, r.status());
    assert_eq!("text/html; charset=utf-8", r.headers()[CONTENT_TYPE]);
    assert!(r.body().contains("<h1>List of latest 20 operations happened</h1>"));

    let expected: Vec<_> = (6..=25).rev().map(|n| format!("{} + 1 = {}", n, n + 1)).collect();
    assert_eq!(expected, items(r.body()));
}

#[tokio::test]
async fn test_history_with_few_records() {
    let (_, app) = client();

    let r = app.get("/history/").dispatch().await;
    assert_eq!(StatusCode::OK, r.status());
    assert!(items(r.body()).is_empty());

    app.get("/1/plus/2").dispatch().await;
    app.get("/3/plus/4").dispatch().await;

    let r = app.get("/history").dispatch().await;
    assert_eq!(vec!["3 + 4 = 7", "1 + 2 = 3"], items(r.body()));
}

#[tokio::test]
async fn test_index_lists_everything_in_store_order() {
    let (_, app) = client();

    for n in 1..=25 {
        app.get(&format!("/{}/into/2", n)).dispatch().await;
    }

    let r = app.get("/").dispatch().await;
    assert_eq!(StatusCode::OK, r.status());
    assert_eq!("text/html; charset=utf-8", r.headers()[CONTENT_TYPE]);
    assert!(r.body().contains("<h1>List of operations happened</h1>"));

    let expected: Vec<_> = (1..=25).map(|n| format!("{} * 2 = {}", n, n * 2)).collect();
    assert_eq!(expected, items(r.body()));
}

#[tokio::test]
async fn test_history_reflects_every_answered_computation() {
    let (_, app) = client();

    for n in 1..=3 {
        let r = app.get(&format!("/{}/plus/1", n)).dispatch().await;
        assert_eq!(StatusCode::OK, r.status());
    }

    let r = app.get("/").dispatch().await;
    assert_eq!(vec!["1 + 1 = 2", "2 + 1 = 3", "3 + 1 = 4"], items(r.body()));

    let r = app.get("/history").dispatch().await;
    assert_eq!(vec!["3 + 1 = 4", "2 + 1 = 3", "1 + 1 = 2"], items(r.body()));
}

#[tokio::test]
async fn test_concurrent_computations_are_all_listed() {
    let (_, app) = client();

    let calls = (1..=30).map(|n| app.get(&format!("/{}/into/1", n)).dispatch());
    for r in futures::future::join_all(calls).await {
        assert_eq!(StatusCode::OK, r.status());
    }

    let r = app.get("/").dispatch().await;
    assert_eq!(30, items(r.body()).len());

    let r = app.get("/history").dispatch().await;
    assert_eq!(20, items(r.body()).len());
}

#[tokio::test]
async fn test_unknown_routes() {
    let (_, app) = client();

    for path in &["/5", "/5/plus", "/1/plus/2/minus/3/extra", "/1//2"] {
        let r = app.get(path).dispatch().await;
        assert_eq!(StatusCode::NOT_FOUND, r.status(), "{}", path);
        assert_eq!("404 page not found", r.body(), "{}", path);
    }

    let r = app.post("/history").dispatch().await;
    assert_eq!(StatusCode::NOT_FOUND, r.status());
}

struct Unavailable;

fn down() -> StoreError {
    StoreError::Unavailable("connection refused".into())
}

#[async_trait]
impl HistoryStore for Unavailable {
    async fn append(&self, _: &Expression) -> Result<Record, StoreError> {
        Err(down())
    }

    async fn list_all(&self) -> Result<Vec<Expression>, StoreError> {
        Err(down())
    }

    async fn list_latest(&self, _: usize) -> Result<Vec<Expression>, StoreError> {
        Err(down())
    }
}

#[tokio::test]
async fn test_unavailable_store() {
    let app = App::new(Arc::new(Unavailable)).test_client();

    // writes fail quietly
    let r = app.get("/5/plus/3/minus/2").dispatch().await;
    assert_eq!(StatusCode::OK, r.status());
    assert_eq!(r#"{"question":"5 + 3 - 2","answer":6}"#, r.body());

    // and the app keeps serving afterwards
    let r = app.get("/3/divide/2").dispatch().await;
    assert_eq!(r#"{"question":"3 / 2","answer":1.5}"#, r.body());

    // reads do not
    for path in &["/", "/history"] {
        let r = app.get(path).dispatch().await;
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, r.status(), "{}", path);
        assert_eq!(r#"{"error":"Internal server error"}"#, r.body(), "{}", path);
    }
}

#[tokio::test]
async fn test_shutdown_stops_recording() {
    let (store, app) = client();

    app.get("/1/plus/1").dispatch().await;
    app.app().shutdown().await;
    assert_eq!(1, store.records().await.len());

    let r = app.get("/2/plus/2").dispatch().await;
    assert_eq!(StatusCode::OK, r.status());
    assert_eq!(1, store.records().await.len());
}
