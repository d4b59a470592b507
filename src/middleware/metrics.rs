//-------------------------------------------------------------
// src/middleware/metrics.rs
//-------------------------------------------------------------
use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use metrics::{decrement_gauge, histogram, increment_counter, increment_gauge};

/// Per-route request counters, latency histogram and in-flight gauge.
pub struct RequestMetrics;

impl<S, B> Transform<S, ServiceRequest> for RequestMetrics
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestMetricsSvc<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, srv: S) -> Self::Future {
        ready(Ok(RequestMetricsSvc { inner: srv }))
    }
}

pub struct RequestMetricsSvc<S> {
    inner: S,
}

/// Label for the matched route (`/api/history`), never the raw URI.
fn route_label(req: &ServiceRequest) -> String {
    req.match_pattern().unwrap_or_else(|| "unmatched".to_string())
}

impl<S, B> Service<ServiceRequest> for RequestMetricsSvc<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().as_str().to_string();
        let route = route_label(&req);

        increment_gauge!("http_requests_in_flight", 1.0);
        let fut = self.inner.call(req);

        Box::pin(async move {
            let res = fut.await;
            decrement_gauge!("http_requests_in_flight", 1.0);
            let res = res?;

            let latency_ms = start.elapsed().as_secs_f64() * 1_000.0;
            let status = res.status().as_u16().to_string();

            increment_counter!(
                "http_requests_total",
                "method" => method.clone(),
                "route"  => route.clone(),
                "status" => status,
            );
            histogram!(
                "http_latency_ms",
                latency_ms,
                "method" => method,
                "route"  => route,
            );

            Ok(res)
        })
    }
}
