use actix_web::{get, web, HttpResponse};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;

#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

#[get("/test")]
async fn smoke_test() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "message": "Server is working!"
    }))
}

#[get("/metrics")]
async fn prometheus_metrics(handle: Option<web::Data<PrometheusHandle>>) -> HttpResponse {
    match handle {
        Some(h) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(h.render()),
        None => HttpResponse::NotFound().body("metrics exporter not installed"),
    }
}

/// Mounted on the app root, not through `web::scope("")`, which would
/// swallow every path including `/api/*`.
pub fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(smoke_test)
        .service(prometheus_metrics);
}
