pub mod config;
pub mod db;
pub mod middleware;
pub mod routes {
    pub mod health;
    pub mod market;

    /// Every route the service serves; `main` and the tests mount this.
    pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
        cfg.service(market::market_scope());
        health::health_routes(cfg);
    }
}
pub mod services;

pub mod utils;
