use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use marketflow_backend::{
    config::settings::Settings,
    db::store::{BarSource, DuckStore, UnavailableSource},
    middleware::metrics::RequestMetrics,
    routes,
};

fn init_logging() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
        .init();
}

/// Open the configured store; if that fails the service still starts and
/// every chart request takes the degraded path.
fn open_source(settings: &Settings) -> Arc<dyn BarSource> {
    match DuckStore::open(settings) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::error!("bar store unavailable, serving degraded responses: {e}");
            Arc::new(UnavailableSource::new(e.to_string()))
        }
    }
}

fn install_exporter() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("prometheus exporter not installed: {e}");
            None
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logging();
    log::info!("Starting marketflow backend…");

    let settings = Settings::new().unwrap_or_else(|e| {
        eprintln!("Failed to load settings: {e}");
        std::process::exit(1);
    });

    let bind = (settings.bind_addr.clone(), settings.server_port);
    let store = open_source(&settings);
    let prometheus = install_exporter();
    log::info!(
        "listening on {}:{} (clock={:?}, degraded={:?})",
        bind.0, bind.1, settings.bar_clock, settings.degraded_mode
    );

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(RequestMetrics)
            .wrap(Logger::default())
            .app_data(web::Data::new(settings.clone()))
            .app_data(web::Data::from(store.clone()));
        if let Some(handle) = prometheus.clone() {
            app = app.app_data(web::Data::new(handle));
        }

        app.configure(routes::configure)
    })
        .bind(bind)?
        .run()
        .await
}
