use actix_web::{test, web, App};
use metrics_exporter_prometheus::PrometheusBuilder;

use marketflow_backend::middleware::metrics::RequestMetrics;
use marketflow_backend::routes::health::health_routes;

#[actix_rt::test]
async fn health_answers_plain_ok() {
    let app = test::init_service(App::new().wrap(RequestMetrics).configure(health_routes)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"OK");
}

#[actix_rt::test]
async fn smoke_test_payload() {
    let app = test::init_service(App::new().configure(health_routes)).await;

    let req = test::TestRequest::get().uri("/test").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body,
        serde_json::json!({ "status": "ok", "message": "Server is working!" })
    );
}

#[actix_rt::test]
async fn metrics_route_needs_an_exporter() {
    let app = test::init_service(App::new().configure(health_routes)).await;
    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // recorder built but not installed globally, so tests stay independent
    let handle = PrometheusBuilder::new().build_recorder().handle();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(handle))
            .configure(health_routes),
    )
    .await;
    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}
