// tests/routes.rs
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::Value;

use marketflow_backend::config::settings::{DataSource, DegradedMode, Settings};
use marketflow_backend::db::models::{BarTime, RawBarRow};
use marketflow_backend::db::store::{BarQuery, BarSource, UnavailableSource};
use marketflow_backend::routes;
use marketflow_backend::services::gap_fill::BarClock;
use marketflow_backend::utils::errors::StoreError;

// ─── fixtures ────────────────────────────────────────────────────────────

/// In-memory stand-in for the DuckDB store.
struct StubSource {
    rows: Vec<RawBarRow>,
}

impl BarSource for StubSource {
    fn fetch_bars(&self, q: &BarQuery) -> Result<Vec<RawBarRow>, StoreError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.ticker == q.ticker && q.date.map_or(true, |d| r.date == Some(d)))
            .cloned()
            .collect())
    }

    fn search_symbols(&self, fragment: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let needle = fragment.to_uppercase();
        let mut hits: Vec<String> = self
            .rows
            .iter()
            .map(|r| r.ticker.clone())
            .filter(|t| t.contains(&needle))
            .collect();
        hits.sort();
        hits.dedup();
        hits.truncate(limit);
        Ok(hits)
    }

    fn trading_dates(&self, ticker: &str) -> Result<Vec<i64>, StoreError> {
        let mut days: Vec<i64> = self
            .rows
            .iter()
            .filter(|r| r.ticker == ticker.to_uppercase())
            .filter_map(|r| r.date)
            .collect();
        days.sort();
        days.dedup();
        Ok(days)
    }
}

fn bar(ticker: &str, date: i64, time: &str, ask: f64, bid: f64) -> RawBarRow {
    RawBarRow {
        ticker: ticker.into(),
        date: Some(date),
        time_bar_start: Some(BarTime::Text(time.into())),
        first_trade_price: Some(100.0),
        high_trade_price: Some(101.0),
        low_trade_price: Some(99.0),
        last_trade_price: Some(100.5),
        trade_at_ask: Some(ask),
        trade_at_bid: Some(bid),
        uptick_volume: Some(ask),
        downtick_volume: Some(bid),
        volume: Some(ask + bid),
        ..Default::default()
    }
}

fn two_sessions() -> Arc<dyn BarSource> {
    Arc::new(StubSource {
        rows: vec![
            bar("AAPL", 20200128, "09:30", 10.0, 0.0),
            bar("AAPL", 20200128, "09:31", 4.0, 6.0),
            bar("AAPL", 20200129, "09:30", 0.0, 8.0),
            bar("AAPL", 20200129, "09:31", 7.0, 3.0),
            bar("AMD", 20200128, "09:30", 1.0, 1.0),
        ],
    })
}

fn settings(mode: DegradedMode) -> Settings {
    Settings {
        bind_addr: "127.0.0.1".into(),
        server_port: 0,
        data_source: DataSource::LocalFile("unused.duckdb".into()),
        bar_table: "taq_1min".into(),
        bar_clock: BarClock::Utc,
        degraded_mode: mode,
    }
}

async fn get(source: Arc<dyn BarSource>, mode: DegradedMode, uri: &str) -> (StatusCode, Value) {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(settings(mode)))
            .app_data(web::Data::from(source))
            .configure(routes::configure),
    )
    .await;
    let req = test::TestRequest::get().uri(uri).to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

fn floats(v: &Value) -> Vec<f64> {
    v.as_array()
        .expect("array")
        .iter()
        .map(|x| x.as_f64().expect("number"))
        .collect()
}

// ─── chart routes ────────────────────────────────────────────────────────

#[actix_rt::test]
async fn api_and_service_routes_share_one_app() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(settings(DegradedMode::ErrorStatus)))
            .app_data(web::Data::from(two_sessions()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/signals?symbol=AAPL").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["s"], "ok");

    for uri in ["/health", "/test"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }

    let req = test::TestRequest::get().uri("/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn history_returns_aligned_columns() {
    let (status, body) = get(
        two_sessions(),
        DegradedMode::SampleFallback,
        "/api/history?symbol=aapl&date=20200128",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["s"], "ok");
    assert!(body.get("degraded").is_none());
    assert_eq!(body["t"], serde_json::json!([1_580_203_800i64, 1_580_203_860i64]));
    for key in ["o", "h", "l", "c", "v"] {
        assert_eq!(body[key].as_array().map(Vec::len), Some(2), "column {key}");
    }
    assert_eq!(floats(&body["v"]), vec![10.0, 10.0]);
}

#[actix_rt::test]
async fn every_chart_route_is_mounted() {
    for view in [
        "history",
        "spread",
        "indicators",
        "volume",
        "liquidity",
        "flow",
        "signals",
        "delta",
    ] {
        let uri = format!("/api/{view}?symbol=AAPL");
        let (status, body) = get(two_sessions(), DegradedMode::ErrorStatus, &uri).await;
        assert_eq!(status, StatusCode::OK, "{view}");
        assert_eq!(body["s"], "ok", "{view}");
        assert_eq!(body["t"].as_array().map(Vec::len), Some(4), "{view}");
    }
}

#[actix_rt::test]
async fn unknown_symbol_is_no_data() {
    let (status, body) = get(two_sessions(), DegradedMode::SampleFallback, "/api/flow?symbol=ZZZZ").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "s": "no_data" }));
}

#[actix_rt::test]
async fn signals_follow_order_flow() {
    let (_, body) = get(
        two_sessions(),
        DegradedMode::ErrorStatus,
        "/api/signals?symbol=AAPL&date=20200128",
    )
    .await;

    // bar 0 is all ask-side: delta 100, tick 100, book/mid neutral
    assert_eq!(floats(&body["delta_score"])[0], 100.0);
    assert_eq!(floats(&body["momentum"])[0], 0.0);
    let combined = floats(&body["combined_signal"]);
    let cumulative = floats(&body["cumulative_signal"]);
    assert!((cumulative[1] - (combined[0] + combined[1])).abs() < 1e-9);
}

#[actix_rt::test]
async fn daily_reset_matches_per_date_requests() {
    let (_, all) = get(
        two_sessions(),
        DegradedMode::ErrorStatus,
        "/api/signals?symbol=AAPL&reset=daily",
    )
    .await;
    let (_, day1) = get(
        two_sessions(),
        DegradedMode::ErrorStatus,
        "/api/signals?symbol=AAPL&date=20200128",
    )
    .await;
    let (_, day2) = get(
        two_sessions(),
        DegradedMode::ErrorStatus,
        "/api/signals?symbol=AAPL&date=20200129",
    )
    .await;

    for key in ["cumulative_signal", "momentum", "combined_signal"] {
        let mut stitched = floats(&day1[key]);
        stitched.extend(floats(&day2[key]));
        assert_eq!(floats(&all[key]), stitched, "{key}");
    }
}

#[actix_rt::test]
async fn continuous_reset_carries_across_dates() {
    let (_, all) = get(two_sessions(), DegradedMode::ErrorStatus, "/api/delta?symbol=AAPL").await;
    let delta = floats(&all["delta"]);
    let cumulative = floats(&all["cumulative_delta"]);

    assert_eq!(delta, vec![10.0, -2.0, -8.0, 4.0]);
    assert_eq!(cumulative, vec![10.0, 8.0, 0.0, 4.0]);
}

#[actix_rt::test]
async fn missing_symbol_is_a_bad_request() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(settings(DegradedMode::ErrorStatus)))
            .app_data(web::Data::from(two_sessions()))
            .configure(routes::configure),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/history").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ─── failure handling ────────────────────────────────────────────────────

fn broken() -> Arc<dyn BarSource> {
    Arc::new(UnavailableSource::new("database file gone"))
}

#[actix_rt::test]
async fn unavailable_source_serves_tagged_sample() {
    let (status, body) = get(broken(), DegradedMode::SampleFallback, "/api/history?symbol=AAPL").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["s"], "ok");
    assert_eq!(body["degraded"], true);
    assert!(body["message"].as_str().unwrap().contains("database file gone"));
    let t = body["t"].as_array().unwrap();
    assert_eq!(t.len(), 30);
    assert_eq!(t[0], 1_580_203_800i64);
}

#[actix_rt::test]
async fn unavailable_source_reports_error_status() {
    let (status, body) = get(broken(), DegradedMode::ErrorStatus, "/api/signals?symbol=AAPL").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["s"], "error");
    assert!(body["message"].as_str().unwrap().contains("database file gone"));
    assert!(body.get("t").is_none());
}

#[actix_rt::test]
async fn malformed_rows_take_the_failure_path() {
    let mut bad = bar("AAPL", 20200128, "09:30", 1.0, 1.0);
    bad.date = Some(20201399);
    let source: Arc<dyn BarSource> = Arc::new(StubSource { rows: vec![bad] });

    let (_, body) = get(source, DegradedMode::ErrorStatus, "/api/volume?symbol=AAPL").await;
    assert_eq!(body["s"], "error");
    assert!(body["message"].as_str().unwrap().contains("20201399"));
}

// ─── discovery ───────────────────────────────────────────────────────────

#[actix_rt::test]
async fn symbol_search_returns_bare_ticker_list() {
    let (status, body) = get(two_sessions(), DegradedMode::ErrorStatus, "/api/symbols?symbol=a").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["AAPL", "AMD"]));
}

#[actix_rt::test]
async fn dates_are_listed_per_ticker() {
    let (_, body) = get(two_sessions(), DegradedMode::ErrorStatus, "/api/dates?symbol=aapl").await;
    assert_eq!(body["data"], serde_json::json!([20200128, 20200129]));
}

#[actix_rt::test]
async fn discovery_failure_is_service_unavailable() {
    let (status, body) = get(broken(), DegradedMode::SampleFallback, "/api/symbols?symbol=A").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
}
