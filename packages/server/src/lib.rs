#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the emigrant statistics dashboard.
//!
//! Serves chart-ready category views, record management, CSV upload and
//! forecasts as JSON. Authentication happens in front of the server; the
//! authenticating proxy passes the caller's role in the `X-Emigrant-Role`
//! header and every mutation is checked against that role's permissions.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use emigrant_stats_dashboard::{ForecastDashboard, LatestOnly};
use emigrant_stats_prediction::{PredictionClient, PredictionService};
use emigrant_stats_store::RecordStore;

/// Largest accepted CSV upload.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    /// Year record storage.
    pub store: Arc<dyn RecordStore>,
    /// Forecasting service.
    pub predictions: Arc<dyn PredictionService>,
    /// Most recent forecast dashboard.
    pub latest_forecast: LatestOnly<ForecastDashboard>,
}

impl AppState {
    /// Creates state around a store and a forecasting service.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, predictions: Arc<dyn PredictionService>) -> Self {
        Self {
            store,
            predictions,
            latest_forecast: LatestOnly::new(),
        }
    }
}

/// Registers every API route under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/categories", web::get().to(handlers::categories))
                .route("/categories/{id}", web::get().to(handlers::category_view))
                .route(
                    "/categories/{id}/records",
                    web::get().to(handlers::list_records),
                )
                .route(
                    "/categories/{id}/records",
                    web::post().to(handlers::create_record),
                )
                .route(
                    "/categories/{id}/records",
                    web::delete().to(handlers::delete_all_records),
                )
                .route(
                    "/categories/{id}/records/{year}",
                    web::get().to(handlers::get_record),
                )
                .route(
                    "/categories/{id}/records/{year}",
                    web::put().to(handlers::put_record),
                )
                .route(
                    "/categories/{id}/records/{year}",
                    web::delete().to(handlers::delete_record),
                )
                .route("/categories/{id}/upload", web::post().to(handlers::upload))
                .route(
                    "/predictions/health",
                    web::get().to(handlers::prediction_health),
                )
                .route(
                    "/predictions/latest",
                    web::get().to(handlers::latest_predictions),
                )
                .route("/predictions", web::post().to(handlers::predict)),
        );
}

/// Starts the emigrant statistics API server.
///
/// Opens the JSON record store named by `EMIGRANT_STATS_DATA_DIR`, points
/// the forecasting client at `ML_API_URL`, and serves on `BIND_ADDR:PORT`.
/// This is a regular async function; the caller provides the runtime (e.g.
/// via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let store = emigrant_stats_store::open_from_env();
    log::info!("Record store at {}", store.dir().display());

    let predictions = PredictionClient::from_env();
    log::info!("Forecasting service at {}", predictions.base_url());

    let state = web::Data::new(AppState::new(Arc::new(store), Arc::new(predictions)));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
