//! HTTP request handlers for the pay ledger API.
//!
//! Every handler resolves the tenant from the `x-tenant-id` header, runs one
//! ledger operation and maps its result onto a JSON response.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::LedgerResult;
use crate::models::{ServiceWeek, TenantContext};

use super::request::{
    AdditionalChargeRequest, DayRecordRequest, DeductionRequest, IncentiveRequest,
    UpdateDayRecordRequest,
};
use super::response::{ApiError, ApiErrorResponse, WeekInvoiceResponse};
use super::state::AppState;

/// Header carrying the tenant id.
pub const TENANT_HEADER: &str = "x-tenant-id";

type ApiResult = Result<Response, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/day-records", post(create_day_record_handler))
        .route(
            "/day-records/:id",
            put(update_day_record_handler).delete(delete_day_record_handler),
        )
        .route("/deductions", post(apply_deduction_handler))
        .route("/deductions/:id", delete(remove_deduction_handler))
        .route("/incentives", post(apply_incentive_handler))
        .route("/incentives/:id", delete(remove_incentive_handler))
        .route("/additional-charges", post(apply_charge_handler))
        .route("/additional-charges/:id", delete(remove_charge_handler))
        .route("/week-invoices/recompute", post(recompute_all_handler))
        .route(
            "/week-invoices/:worker_id/:service_week",
            get(get_week_invoice_handler),
        )
        .route(
            "/week-invoices/:worker_id/:service_week/recompute",
            post(recompute_week_handler),
        )
        .route("/workers/:worker_id/recompute", post(profile_change_handler))
        .with_state(state)
}

/// Handler for POST /day-records.
async fn create_day_record_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<DayRecordRequest>, JsonRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    let request = parse_body(payload, correlation_id)?;
    info!(
        correlation_id = %correlation_id,
        tenant_id = %tenant.tenant_id,
        worker_id = %request.worker_id,
        date = %request.date,
        "Creating day record"
    );

    let start_time = Instant::now();
    let result = state.ledger().create_day_record(&tenant, request.into());
    finish(correlation_id, "create_day_record", start_time, StatusCode::CREATED, result)
}

/// Handler for PUT /day-records/:id.
async fn update_day_record_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<UpdateDayRecordRequest>, JsonRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    let id = parse_id(&id)?;
    let request = parse_body(payload, correlation_id)?;

    let start_time = Instant::now();
    let result = state
        .ledger()
        .update_day_record(&tenant, id, request.base_total);
    finish(correlation_id, "update_day_record", start_time, StatusCode::OK, result)
}

/// Handler for DELETE /day-records/:id.
async fn delete_day_record_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    let id = parse_id(&id)?;

    let start_time = Instant::now();
    let result = state.ledger().delete_day_record(&tenant, id);
    finish(correlation_id, "delete_day_record", start_time, StatusCode::OK, result)
}

/// Handler for POST /deductions.
async fn apply_deduction_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<DeductionRequest>, JsonRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    let request = parse_body(payload, correlation_id)?;
    info!(
        correlation_id = %correlation_id,
        tenant_id = %tenant.tenant_id,
        worker_id = %request.worker_id,
        date = %request.date,
        rate = %request.rate,
        "Applying deduction"
    );

    let start_time = Instant::now();
    let result = state.ledger().apply_deduction(&tenant, request.into());
    finish(correlation_id, "apply_deduction", start_time, StatusCode::CREATED, result)
}

/// Handler for DELETE /deductions/:id.
async fn remove_deduction_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    let id = parse_id(&id)?;

    let start_time = Instant::now();
    let result = state.ledger().remove_deduction(&tenant, id);
    finish(correlation_id, "remove_deduction", start_time, StatusCode::OK, result)
}

/// Handler for POST /incentives.
async fn apply_incentive_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<IncentiveRequest>, JsonRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    let request = parse_body(payload, correlation_id)?;
    info!(
        correlation_id = %correlation_id,
        tenant_id = %tenant.tenant_id,
        role = %request.role,
        start_date = %request.start_date,
        end_date = %request.end_date,
        rate = %request.rate,
        "Applying incentive"
    );

    let start_time = Instant::now();
    let result = state.ledger().apply_incentive(&tenant, request.into());
    finish(correlation_id, "apply_incentive", start_time, StatusCode::CREATED, result)
}

/// Handler for DELETE /incentives/:id.
async fn remove_incentive_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    let id = parse_id(&id)?;

    let start_time = Instant::now();
    let result = state.ledger().remove_incentive(&tenant, id);
    finish(correlation_id, "remove_incentive", start_time, StatusCode::OK, result)
}

/// Handler for POST /additional-charges.
async fn apply_charge_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AdditionalChargeRequest>, JsonRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    let request = parse_body(payload, correlation_id)?;
    info!(
        correlation_id = %correlation_id,
        tenant_id = %tenant.tenant_id,
        worker_id = %request.worker_id,
        service_week = %request.service_week,
        rate = %request.rate,
        "Applying additional charge"
    );

    let start_time = Instant::now();
    let result = state.ledger().apply_additional_charge(&tenant, request.into());
    finish(correlation_id, "apply_additional_charge", start_time, StatusCode::CREATED, result)
}

/// Handler for DELETE /additional-charges/:id.
async fn remove_charge_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    let id = parse_id(&id)?;

    let start_time = Instant::now();
    let result = state.ledger().remove_additional_charge(&tenant, id);
    finish(correlation_id, "remove_additional_charge", start_time, StatusCode::OK, result)
}

/// Handler for GET /week-invoices/:worker_id/:service_week.
async fn get_week_invoice_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((worker_id, service_week)): Path<(String, String)>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    let service_week = parse_week(&service_week)?;

    let start_time = Instant::now();
    let result = state
        .ledger()
        .week_invoice(&tenant, &worker_id, service_week)
        .map(|invoice| WeekInvoiceResponse {
            currency: state.config().currency.code.clone(),
            invoice,
        });
    finish(correlation_id, "get_week_invoice", start_time, StatusCode::OK, result)
}

/// Handler for POST /week-invoices/:worker_id/:service_week/recompute.
async fn recompute_week_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((worker_id, service_week)): Path<(String, String)>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    let service_week = parse_week(&service_week)?;

    let start_time = Instant::now();
    let result = state
        .ledger()
        .recompute_week(&tenant, &worker_id, service_week);
    finish(correlation_id, "recompute_week", start_time, StatusCode::OK, result)
}

/// Handler for POST /week-invoices/recompute.
async fn recompute_all_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;

    let start_time = Instant::now();
    let result = state.ledger().recompute_all(&tenant);
    finish(correlation_id, "recompute_all", start_time, StatusCode::OK, result)
}

/// Handler for POST /workers/:worker_id/recompute.
async fn profile_change_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(worker_id): Path<String>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let tenant = tenant_from(&headers, correlation_id)?;
    info!(
        correlation_id = %correlation_id,
        tenant_id = %tenant.tenant_id,
        worker_id = %worker_id,
        "Applying profile change"
    );

    let start_time = Instant::now();
    let result = state.ledger().apply_profile_change(&tenant, &worker_id);
    finish(correlation_id, "apply_profile_change", start_time, StatusCode::OK, result)
}

fn tenant_from(headers: &HeaderMap, correlation_id: Uuid) -> Result<TenantContext, ApiErrorResponse> {
    let tenant = headers
        .get(TENANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    match tenant {
        Some(tenant) => Ok(TenantContext::new(tenant)),
        None => {
            warn!(correlation_id = %correlation_id, "Request without tenant");
            Err(ApiErrorResponse::bad_request(ApiError::missing_tenant()))
        }
    }
}

fn parse_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, ApiErrorResponse> {
    let rejection = match payload {
        Ok(Json(request)) => return Ok(request),
        Err(rejection) => rejection,
    };
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::bad_request(error))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiErrorResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiErrorResponse::bad_request(ApiError::new(
            "VALIDATION_ERROR",
            format!("Invalid id: {}", raw),
        ))
    })
}

fn parse_week(raw: &str) -> Result<ServiceWeek, ApiErrorResponse> {
    raw.parse::<ServiceWeek>().map_err(ApiErrorResponse::from)
}

fn finish<T: Serialize>(
    correlation_id: Uuid,
    operation: &'static str,
    start_time: Instant,
    status: StatusCode,
    result: LedgerResult<T>,
) -> ApiResult {
    let duration = start_time.elapsed();
    match result {
        Ok(body) => {
            info!(
                correlation_id = %correlation_id,
                operation,
                duration_us = duration.as_micros(),
                "Request completed successfully"
            );
            Ok((
                status,
                [(header::CONTENT_TYPE, "application/json")],
                Json(body),
            )
                .into_response())
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                error = %err,
                "Request failed"
            );
            Err(err.into())
        }
    }
}
