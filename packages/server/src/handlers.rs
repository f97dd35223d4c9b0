//! HTTP handler functions for the emigrant statistics API.

use actix_web::{HttpRequest, HttpResponse, web};
use emigrant_stats_category::{all_categories, definition};
use emigrant_stats_category_models::{Category, CategoryDefinition};
use emigrant_stats_dashboard::{DashboardError, load_category, prediction_dashboard};
use emigrant_stats_ingest::{IngestError, ingest_csv};
use emigrant_stats_prediction::{PredictionError, YearsAhead};
use emigrant_stats_server_models::{
    ApiCategory, ApiDeleteResult, ApiHealth, ApiPredictRequest, ApiPredictionHealth,
    ApiRecordInput, ApiUploadResult, CategoryQueryParams, Permission, ROLE_HEADER, Role,
    UploadQueryParams,
};
use emigrant_stats_store::StoreError;
use emigrant_stats_transform::{ParsePolicy, YearFilter};
use serde_json::json;

use crate::AppState;

/// Reads the caller's role from [`ROLE_HEADER`]. A missing or unknown role
/// is treated as [`Role::Viewer`].
fn caller_role(req: &HttpRequest) -> Role {
    let Some(value) = req.headers().get(ROLE_HEADER) else {
        return Role::Viewer;
    };
    match value.to_str().ok().and_then(|v| v.trim().parse().ok()) {
        Some(role) => role,
        None => {
            log::warn!("Unrecognized role header {value:?}, treating caller as viewer");
            Role::Viewer
        }
    }
}

fn require(req: &HttpRequest, permission: Permission) -> Result<(), HttpResponse> {
    let role = caller_role(req);
    if role.has_permission(permission) {
        Ok(())
    } else {
        log::warn!("{role} denied {permission} on {}", req.path());
        Err(HttpResponse::Forbidden().json(json!({
            "error": format!("The {role} role does not have the {permission} permission")
        })))
    }
}

fn lookup(id: &str) -> Result<CategoryDefinition, HttpResponse> {
    id.parse::<Category>().map(definition).map_err(|_| {
        HttpResponse::NotFound().json(json!({
            "error": format!("Unknown category: {id}")
        }))
    })
}

/// Maps a store failure to a response. Failures that may clear on retry
/// are 503; the body carries the store's message and a `retryable` flag.
fn store_error(context: &str, e: &StoreError) -> HttpResponse {
    if matches!(e, StoreError::Conflict { .. }) {
        return HttpResponse::Conflict().json(json!({ "error": e.to_string() }));
    }

    log::error!("{context}: {e}");
    let retryable = e.is_retryable();
    let mut status = if retryable {
        HttpResponse::ServiceUnavailable()
    } else {
        HttpResponse::InternalServerError()
    };
    status.json(json!({
        "error": format!("{context}: {e}"),
        "retryable": retryable,
    }))
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/categories`
///
/// Lists every category with its upload requirements.
pub async fn categories() -> HttpResponse {
    let list: Vec<ApiCategory> = all_categories().iter().map(ApiCategory::from).collect();
    HttpResponse::Ok().json(list)
}

/// `GET /api/categories/{id}?year=all|YYYY`
///
/// Returns the chart-ready view of a category.
pub async fn category_view(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<CategoryQueryParams>,
) -> HttpResponse {
    let def = match lookup(&path) {
        Ok(def) => def,
        Err(response) => return response,
    };
    let filter = match params.year.as_deref().map(str::parse::<YearFilter>) {
        None => YearFilter::All,
        Some(Ok(filter)) => filter,
        Some(Err(e)) => {
            return HttpResponse::BadRequest().json(json!({ "error": e.to_string() }));
        }
    };

    match load_category(state.store.as_ref(), &def, filter).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(DashboardError::Store(e)) => store_error(&format!("Failed to load {}", def.label), &e),
        Err(e) => {
            log::error!("Failed to load {}: {e}", def.id);
            HttpResponse::InternalServerError().json(json!({
                "error": format!("Failed to load {}: {e}", def.label)
            }))
        }
    }
}

/// `GET /api/categories/{id}/records`
pub async fn list_records(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let def = match lookup(&path) {
        Ok(def) => def,
        Err(response) => return response,
    };
    match state.store.get_all(def.id).await {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => store_error("Failed to fetch records", &e),
    }
}

/// `POST /api/categories/{id}/records`
///
/// Adds a year that has no record yet.
pub async fn create_record(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ApiRecordInput>,
) -> HttpResponse {
    if let Err(response) = require(&req, Permission::Write) {
        return response;
    }
    let def = match lookup(&path) {
        Ok(def) => def,
        Err(response) => return response,
    };
    let input = body.into_inner();
    let Some(year) = input.year else {
        return HttpResponse::BadRequest().json(json!({ "error": "Year is required" }));
    };

    let record = input.into_record(year);
    match state.store.add_new(def.id, record.clone()).await {
        Ok(()) => HttpResponse::Created().json(record),
        Err(e) => store_error("Failed to add record", &e),
    }
}

/// `DELETE /api/categories/{id}/records`
pub async fn delete_all_records(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(response) = require(&req, Permission::Delete) {
        return response;
    }
    let def = match lookup(&path) {
        Ok(def) => def,
        Err(response) => return response,
    };
    match state.store.delete_all(def.id).await {
        Ok(deleted) => {
            log::info!("{}: deleted {deleted} record(s)", def.id);
            HttpResponse::Ok().json(ApiDeleteResult { deleted })
        }
        Err(e) => store_error("Failed to delete records", &e),
    }
}

/// `GET /api/categories/{id}/records/{year}`
pub async fn get_record(
    state: web::Data<AppState>,
    path: web::Path<(String, i32)>,
) -> HttpResponse {
    let (id, year) = path.into_inner();
    let def = match lookup(&id) {
        Ok(def) => def,
        Err(response) => return response,
    };
    match state.store.get_by_year(def.id, year).await {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => HttpResponse::NotFound().json(json!({
            "error": format!("No data for year {year}")
        })),
        Err(e) => store_error("Failed to fetch record", &e),
    }
}

/// `PUT /api/categories/{id}/records/{year}`
///
/// Creates or replaces the record for a year.
pub async fn put_record(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, i32)>,
    body: web::Json<ApiRecordInput>,
) -> HttpResponse {
    if let Err(response) = require(&req, Permission::Write) {
        return response;
    }
    let (id, year) = path.into_inner();
    let def = match lookup(&id) {
        Ok(def) => def,
        Err(response) => return response,
    };
    let input = body.into_inner();
    if input.year.is_some_and(|y| y != year) {
        return HttpResponse::BadRequest().json(json!({
            "error": format!("Body year does not match path year {year}")
        }));
    }

    let record = input.into_record(year);
    match state.store.upsert(def.id, record.clone()).await {
        Ok(()) => HttpResponse::Ok().json(record),
        Err(e) => store_error("Failed to save record", &e),
    }
}

/// `DELETE /api/categories/{id}/records/{year}`
pub async fn delete_record(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, i32)>,
) -> HttpResponse {
    if let Err(response) = require(&req, Permission::Delete) {
        return response;
    }
    let (id, year) = path.into_inner();
    let def = match lookup(&id) {
        Ok(def) => def,
        Err(response) => return response,
    };
    match state.store.delete(def.id, year).await {
        Ok(true) => HttpResponse::Ok().json(ApiDeleteResult { deleted: 1 }),
        Ok(false) => HttpResponse::NotFound().json(json!({
            "error": format!("No data for year {year}")
        })),
        Err(e) => store_error("Failed to delete record", &e),
    }
}

/// `POST /api/categories/{id}/upload?strict=true`
///
/// Ingests a CSV request body.
pub async fn upload(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<UploadQueryParams>,
    body: web::Bytes,
) -> HttpResponse {
    if let Err(response) = require(&req, Permission::UploadData) {
        return response;
    }
    let def = match lookup(&path) {
        Ok(def) => def,
        Err(response) => return response,
    };
    let policy = if params.strict {
        ParsePolicy::Strict
    } else {
        ParsePolicy::Permissive
    };

    match ingest_csv(state.store.as_ref(), &def, &body, policy).await {
        Ok(report) => HttpResponse::Ok().json(ApiUploadResult {
            message: report.message(),
            years_written: report.years_written,
            first_year: report.first_year,
            last_year: report.last_year,
        }),
        Err(IngestError::Validation { problems }) => HttpResponse::BadRequest().json(json!({
            "error": "Invalid CSV format",
            "problems": problems,
        })),
        Err(IngestError::InvalidCells { issues }) => {
            HttpResponse::UnprocessableEntity().json(json!({
                "error": "All values must be numbers",
                "issues": issues,
            }))
        }
        Err(IngestError::Csv(e)) => HttpResponse::BadRequest().json(json!({
            "error": format!("Could not read CSV: {e}")
        })),
        Err(IngestError::Store(e)) => store_error("Failed to upload data", &e),
        Err(e) => {
            log::error!("{}: upload failed: {e}", def.id);
            HttpResponse::InternalServerError().json(json!({
                "error": format!("Failed to upload data: {e}")
            }))
        }
    }
}

/// `GET /api/predictions/health`
pub async fn prediction_health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiPredictionHealth {
        healthy: state.predictions.health().await,
    })
}

/// `POST /api/predictions`
///
/// Forecasts every forecast category and joins the forecasts with their
/// history.
pub async fn predict(
    state: web::Data<AppState>,
    body: Option<web::Json<ApiPredictRequest>>,
) -> HttpResponse {
    let request = body.map(web::Json::into_inner).unwrap_or_default();
    let years_ahead = match request.years_ahead.map(YearsAhead::new) {
        None => YearsAhead::default(),
        Some(Ok(years_ahead)) => years_ahead,
        Some(Err(e)) => {
            return HttpResponse::BadRequest().json(json!({ "error": e.to_string() }));
        }
    };

    let ticket = state.latest_forecast.ticket();
    match prediction_dashboard(
        state.store.as_ref(),
        state.predictions.as_ref(),
        years_ahead,
    )
    .await
    {
        Ok(dashboard) => {
            state.latest_forecast.store(ticket, dashboard.clone());
            HttpResponse::Ok().json(dashboard)
        }
        Err(DashboardError::Prediction(e)) => {
            let status = if e.is_retryable() {
                HttpResponse::ServiceUnavailable()
            } else {
                HttpResponse::BadGateway()
            };
            forecast_error(status, &e)
        }
        Err(DashboardError::Store(e)) => store_error("Failed to generate predictions", &e),
        Err(e) => {
            log::error!("Failed to build forecasts: {e}");
            HttpResponse::InternalServerError().json(json!({
                "error": format!("Failed to generate predictions: {e}")
            }))
        }
    }
}

fn forecast_error(mut status: actix_web::HttpResponseBuilder, e: &PredictionError) -> HttpResponse {
    log::error!("Forecasting service failed: {e}");
    status.json(json!({ "error": e.to_string() }))
}

/// `GET /api/predictions/latest`
///
/// Returns the most recently requested forecast.
pub async fn latest_predictions(state: web::Data<AppState>) -> HttpResponse {
    state.latest_forecast.latest().map_or_else(
        || {
            HttpResponse::NotFound().json(json!({
                "error": "No predictions have been generated yet"
            }))
        },
        |dashboard| HttpResponse::Ok().json(dashboard),
    )
}
