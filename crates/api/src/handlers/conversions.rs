//! Handlers for the `/conversions` resource.
//!
//! Submission validates the request, creates a pending record, and
//! returns immediately; everything after that surfaces through
//! polling. Errors inside a running job never reach the submitter as
//! an HTTP error.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use planserve_core::error::CoreError;
use planserve_core::interpreter;
use planserve_core::job::{validate_project_ref, ActiveJobView, ConversionOptions, NewJob, PlanType};
use planserve_core::launcher;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Request body for POST /conversions.
#[derive(Debug, Deserialize)]
pub struct SubmitConversionRequest {
    /// Source file to convert. Relative paths resolve against the
    /// configured upload directory.
    pub input_path: String,
    /// Hint for the output filename; the job id is appended to it.
    pub output_name: Option<String>,
    #[serde(default)]
    pub plan_type: PlanType,
    pub projection: Option<String>,
    /// Opaque project reference for per-project output placement.
    pub project: Option<String>,
    pub submitted_by: Option<String>,
}

/// Response for GET /conversions/runtime.
#[derive(Debug, Serialize)]
pub struct RuntimeAvailability {
    pub available: bool,
    pub runtime: Option<String>,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/conversions
///
/// Validate the submission, create a pending job record, and hand the
/// job to the launcher. Returns 202 with the created record; the
/// conversion itself runs in the background and is observed by
/// polling.
pub async fn submit_conversion(
    State(state): State<AppState>,
    Json(input): Json<SubmitConversionRequest>,
) -> AppResult<impl IntoResponse> {
    if input.input_path.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "input_path must not be empty".to_string(),
        )));
    }
    if let Some(project) = &input.project {
        validate_project_ref(project)?;
    }

    let input_path = resolve_input_path(&state, &input.input_path);
    let requested_output_name = input
        .output_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| input.input_path.clone());

    let record = state.registry.create(NewJob {
        input_path,
        requested_output_name,
        options: ConversionOptions::for_plan_type(input.plan_type, input.projection),
        submitted_by: input
            .submitted_by
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "anonymous".to_string()),
        project: input.project,
    });

    launcher::spawn_job(
        Arc::clone(&state.converter),
        Arc::clone(&state.registry),
        Arc::clone(&state.history),
        Arc::clone(&state.event_bus),
        record.id.clone(),
    );

    tracing::info!(
        job_id = %record.id,
        plan_type = record.options.plan_type.as_str(),
        submitted_by = %record.submitted_by,
        "Conversion submitted",
    );

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: record })))
}

fn resolve_input_path(state: &AppState, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        state.config.upload_dir.join(path)
    }
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/conversions/{id}
///
/// Full snapshot of a single job. 404 for unknown ids, including ids
/// already evicted by the retention sweep.
pub async fn get_conversion(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job = state.registry.get(&job_id).ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Conversion",
            id: job_id.clone(),
        })
    })?;
    Ok(Json(DataResponse { data: job }))
}

// ---------------------------------------------------------------------------
// List active
// ---------------------------------------------------------------------------

/// GET /api/v1/conversions
///
/// Abbreviated snapshots of jobs still pending or processing, newest
/// first.
pub async fn list_active_conversions(
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let jobs: Vec<ActiveJobView> = state
        .registry
        .list_active()
        .iter()
        .map(ActiveJobView::from)
        .collect();
    Ok(Json(DataResponse { data: jobs }))
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// GET /api/v1/conversions/history
///
/// Completed conversions, newest first. Independent of the live
/// registry: entries survive record eviction until capacity pushes
/// them out.
pub async fn get_history(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.history.list(),
    }))
}

// ---------------------------------------------------------------------------
// Runtime availability
// ---------------------------------------------------------------------------

/// GET /api/v1/conversions/runtime
///
/// Probe the configured runtime candidates and report which one, if
/// any, would run the next conversion.
pub async fn runtime_availability(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let runtime = interpreter::locate_runtime(&state.converter.runtime_candidates).await;
    Ok(Json(DataResponse {
        data: RuntimeAvailability {
            available: runtime.is_some(),
            runtime,
        },
    }))
}
