//! Endpoint handlers
//!
//! Thin adapters: parse the request, call the service, shape the response.

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::{
    AvailabilityResponse, HealthResponse, InputSchemaResponse, JobIdQuery, JobStatusResponse,
    ProvideInputBody, ProvideInputResponse, StartJobBody, StartJobResponse, StartSuperBody,
    StartSuperResponse, SuperStatusResponse,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use paygate_core::application::{input_schema as agent_input_schema, StartJobRequest, StartSuperRequest};
use paygate_core::error::AppError;
use std::sync::Arc;

/// POST /start_job
pub async fn start_job(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StartJobBody>, JsonRejection>,
) -> ApiResult<Json<StartJobResponse>> {
    let Json(body) = body?;
    let receipt = state
        .jobs
        .start_job(StartJobRequest {
            identifier_from_purchaser: body.identifier_from_purchaser,
            input_data: body.input_data,
        })
        .await?;
    Ok(Json(receipt.into()))
}

/// GET /status?job_id=
pub async fn job_status(
    State(state): State<Arc<AppState>>,
    query: Result<Query<JobIdQuery>, QueryRejection>,
) -> ApiResult<Json<JobStatusResponse>> {
    let Query(query) = query?;
    let job = state.jobs.get_status(&query.job_id).await?;
    Ok(Json(job.into()))
}

/// POST /provide_input
pub async fn provide_input(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProvideInputBody>, JsonRejection>,
) -> ApiResult<Json<ProvideInputResponse>> {
    let Json(body) = body?;
    let input = body
        .input_data
        .ok_or_else(|| AppError::Validation("input_data is missing".to_string()))?;
    let job = state.jobs.provide_input(&body.job_id, input).await?;
    Ok(Json(ProvideInputResponse {
        status: "success".to_string(),
        job_id: job.id,
        input_hash: job.input_hash,
    }))
}

/// GET /availability
pub async fn availability(State(state): State<Arc<AppState>>) -> Json<AvailabilityResponse> {
    Json(state.jobs.availability().into())
}

/// GET /input_schema
pub async fn input_schema() -> Json<InputSchemaResponse> {
    Json(InputSchemaResponse {
        input_data: agent_input_schema().into_iter().map(Into::into).collect(),
    })
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// POST /startSuper
pub async fn start_super(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StartSuperBody>, JsonRejection>,
) -> ApiResult<Json<StartSuperResponse>> {
    let Json(body) = body?;
    let receipt = state
        .super_jobs
        .start(StartSuperRequest {
            identifier: body.identifier,
            address: body.address,
        })
        .await?;
    Ok(Json(receipt.into()))
}

/// GET /superStatus?job_id=
pub async fn super_status(
    State(state): State<Arc<AppState>>,
    query: Result<Query<JobIdQuery>, QueryRejection>,
) -> ApiResult<Json<SuperStatusResponse>> {
    let Query(query) = query?;
    let (job, elapsed) = state.super_jobs.status(&query.job_id).await?;
    Ok(Json(SuperStatusResponse::new(job, elapsed)))
}
