//! Handler serving converted drawings for download.
//!
//! Only bare `.dxf` filenames are served. The default output directory
//! is searched first, then per-project subdirectories one level deep,
//! since a download request carries only the filename.

use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use planserve_core::converter::OUTPUT_EXTENSION;
use planserve_core::error::CoreError;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/v1/downloads/{filename}
///
/// Stream a converted drawing. 400 for anything that is not a bare
/// `.dxf` filename, 404 when the file exists in neither the default
/// nor any per-project output location.
pub async fn download_output(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    validate_filename(&filename)?;

    let candidate = state.config.output_dir.join(&filename);
    let path = if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
        Some(candidate)
    } else {
        find_in_project_dirs(&state.config.output_dir, &filename).await
    };

    let Some(path) = path else {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Output file",
            id: filename,
        }));
    };

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to read output file: {e}")))?;

    tracing::debug!(filename = %filename, size = bytes.len(), "Serving output file");

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((StatusCode::OK, headers, bytes))
}

/// Reject anything that is not a bare `.dxf` filename.
fn validate_filename(filename: &str) -> Result<(), AppError> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::BadRequest(
            "Filename must not contain path components".to_string(),
        ));
    }
    let expected = format!(".{OUTPUT_EXTENSION}");
    if !filename.to_ascii_lowercase().ends_with(&expected) {
        return Err(AppError::BadRequest(format!(
            "Only .{OUTPUT_EXTENSION} files can be downloaded"
        )));
    }
    Ok(())
}

/// Search immediate subdirectories of the output directory (the
/// per-project locations) for the file.
async fn find_in_project_dirs(output_dir: &FsPath, filename: &str) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(output_dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_dir = entry
            .file_type()
            .await
            .map(|ft| ft.is_dir())
            .unwrap_or(false);
        if !is_dir {
            continue;
        }
        let candidate = entry.path().join(filename);
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
