// src/routes/market.rs

use actix_web::{get, web, HttpResponse, Responder, Scope};
use metrics::increment_counter;
use serde::Deserialize;

use crate::config::settings::Settings;
use crate::db::store::{BarQuery, BarSource, SYMBOL_SEARCH_LIMIT};
use crate::services::sample::sample_rows;
use crate::services::signals::CumulativeReset;
use crate::services::views::{
    render, Chart, ChartView, Delta, Flow, History, Indicators, Liquidity, Signals, Spread, Volume,
    ViewOptions,
};
use crate::utils::errors::{ChartError, StoreError};
use crate::utils::types::{ApiResponse, ChartResponse};

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub symbol: String,
    pub date: Option<i64>,
    #[serde(default)]
    pub reset: CumulativeReset,
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    pub symbol: String,
}

/// Fetch, derive and answer for one view. Always HTTP 200; failures are
/// reported through `s` (or the degraded sample).
async fn serve_chart<V: ChartView + 'static>(
    query: ChartQuery,
    store: web::Data<dyn BarSource>,
    settings: web::Data<Settings>,
) -> HttpResponse {
    let bar_query = BarQuery::new(&query.symbol, query.date);
    let ticker = bar_query.ticker.clone();
    let opts = ViewOptions { reset: query.reset };
    let clock = settings.bar_clock;
    let store = store.into_inner();

    let outcome = web::block(move || -> Result<Option<Chart<V::Columns>>, ChartError> {
        let rows = store.fetch_bars(&bar_query)?;
        Ok(render::<V>(rows, clock, &opts)?)
    })
    .await
    .unwrap_or_else(|e| Err(StoreError::Blocking(e.to_string()).into()));

    let body = match outcome {
        Ok(Some(chart)) => ChartResponse::ok(chart.t, chart.columns),
        Ok(None) => ChartResponse::no_data(),
        Err(err) => {
            log::warn!("{} {ticker} date={:?}: {err}", V::NAME, query.date);
            increment_counter!("chart_failures_total", "view" => V::NAME, "cause" => err.kind());
            fallback::<V>(&err, &settings, &opts)
        }
    };
    HttpResponse::Ok().json(body)
}

fn fallback<V: ChartView>(
    err: &ChartError,
    settings: &Settings,
    opts: &ViewOptions,
) -> ChartResponse<V::Columns> {
    if !settings.serves_sample_on_failure() {
        return ChartResponse::error(err.to_string());
    }
    match render::<V>(sample_rows(), settings.bar_clock, opts) {
        Ok(Some(chart)) => ChartResponse::degraded(chart.t, chart.columns, err.to_string()),
        Ok(None) => ChartResponse::error(err.to_string()),
        Err(sample_err) => {
            log::error!("sample dataset failed to render for {}: {sample_err}", V::NAME);
            ChartResponse::error(err.to_string())
        }
    }
}

// ─── Chart routes ────────────────────────────────────────────────────────

#[get("/history")]
pub async fn history(
    q: web::Query<ChartQuery>,
    store: web::Data<dyn BarSource>,
    settings: web::Data<Settings>,
) -> impl Responder {
    serve_chart::<History>(q.into_inner(), store, settings).await
}

#[get("/spread")]
pub async fn spread(
    q: web::Query<ChartQuery>,
    store: web::Data<dyn BarSource>,
    settings: web::Data<Settings>,
) -> impl Responder {
    serve_chart::<Spread>(q.into_inner(), store, settings).await
}

#[get("/indicators")]
pub async fn indicators(
    q: web::Query<ChartQuery>,
    store: web::Data<dyn BarSource>,
    settings: web::Data<Settings>,
) -> impl Responder {
    serve_chart::<Indicators>(q.into_inner(), store, settings).await
}

#[get("/volume")]
pub async fn volume(
    q: web::Query<ChartQuery>,
    store: web::Data<dyn BarSource>,
    settings: web::Data<Settings>,
) -> impl Responder {
    serve_chart::<Volume>(q.into_inner(), store, settings).await
}

#[get("/liquidity")]
pub async fn liquidity(
    q: web::Query<ChartQuery>,
    store: web::Data<dyn BarSource>,
    settings: web::Data<Settings>,
) -> impl Responder {
    serve_chart::<Liquidity>(q.into_inner(), store, settings).await
}

#[get("/flow")]
pub async fn flow(
    q: web::Query<ChartQuery>,
    store: web::Data<dyn BarSource>,
    settings: web::Data<Settings>,
) -> impl Responder {
    serve_chart::<Flow>(q.into_inner(), store, settings).await
}

#[get("/signals")]
pub async fn signals(
    q: web::Query<ChartQuery>,
    store: web::Data<dyn BarSource>,
    settings: web::Data<Settings>,
) -> impl Responder {
    serve_chart::<Signals>(q.into_inner(), store, settings).await
}

#[get("/delta")]
pub async fn delta(
    q: web::Query<ChartQuery>,
    store: web::Data<dyn BarSource>,
    settings: web::Data<Settings>,
) -> impl Responder {
    serve_chart::<Delta>(q.into_inner(), store, settings).await
}

// ─── Discovery ───────────────────────────────────────────────────────────

#[get("/symbols")]
pub async fn symbols(q: web::Query<SymbolQuery>, store: web::Data<dyn BarSource>) -> impl Responder {
    let fragment = q.into_inner().symbol;
    let store = store.into_inner();
    let found = web::block(move || store.search_symbols(&fragment, SYMBOL_SEARCH_LIMIT))
        .await
        .unwrap_or_else(|e| Err(StoreError::Blocking(e.to_string())));

    // bare array, no envelope
    match found {
        Ok(tickers) => HttpResponse::Ok().json(tickers),
        Err(e) => {
            log::warn!("symbol search failed: {e}");
            HttpResponse::ServiceUnavailable().json(ApiResponse::<()>::err(e.to_string()))
        }
    }
}

#[get("/dates")]
pub async fn dates(q: web::Query<SymbolQuery>, store: web::Data<dyn BarSource>) -> impl Responder {
    let ticker = q.into_inner().symbol;
    let store = store.into_inner();
    let found = web::block(move || store.trading_dates(&ticker))
        .await
        .unwrap_or_else(|e| Err(StoreError::Blocking(e.to_string())));

    match found {
        Ok(days) => HttpResponse::Ok().json(ApiResponse::ok(days)),
        Err(e) => {
            log::warn!("date listing failed: {e}");
            HttpResponse::ServiceUnavailable().json(ApiResponse::<()>::err(e.to_string()))
        }
    }
}

pub fn market_scope() -> Scope {
    web::scope("/api")
        .service(history)
        .service(spread)
        .service(indicators)
        .service(volume)
        .service(liquidity)
        .service(flow)
        .service(signals)
        .service(delta)
        .service(symbols)
        .service(dates)
}
