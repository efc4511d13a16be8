//! Conversion job entities: plan types, derived options, job records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Coordinate reference system used when the submission does not name one.
pub const DEFAULT_PROJECTION: &str = "EPSG:3857";

/// Rendering style of the simplified key-plan preset.
pub const DETAIL_SIMPLIFIED: &str = "simplified";

/// Rendering style of the detailed location-plan preset.
pub const DETAIL_DETAILED: &str = "detailed";

/// Maximum length of a project reference.
const MAX_PROJECT_REF_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Plan types and options
// ---------------------------------------------------------------------------

/// Named conversion preset selected at submission time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanType {
    /// Simplified overview sheet.
    #[default]
    KeyPlan,
    /// Detailed location sheet.
    LocationPlan,
}

impl PlanType {
    /// The kebab-case name the converter CLI expects.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyPlan => "key-plan",
            Self::LocationPlan => "location-plan",
        }
    }
}

/// Option bundle fixed by the plan type when the job is created.
///
/// Derivation is a pure function of the plan type so it can be tested
/// independently of the job lifecycle. Options never change once the job
/// exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOptions {
    pub plan_type: PlanType,
    /// `false` renders monochrome output (the converter's `--no-colors`).
    pub use_colors: bool,
    /// Whether footways and paths are kept in the drawing.
    pub include_footpaths: bool,
    /// Rendering style identifier recorded in the stats.
    pub detail_level: &'static str,
    /// Target coordinate reference system, e.g. `EPSG:3857`.
    pub projection: String,
}

impl ConversionOptions {
    /// Derive the full option bundle for a plan type.
    ///
    /// Key plans are the monochrome simplified preset used for overview
    /// sheets; location plans keep colors and footpaths for detail
    /// sheets. The projection defaults to web mercator unless the
    /// submission names another CRS.
    pub fn for_plan_type(plan_type: PlanType, projection: Option<String>) -> Self {
        let projection = projection
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROJECTION.to_string());

        match plan_type {
            PlanType::KeyPlan => Self {
                plan_type,
                use_colors: false,
                include_footpaths: false,
                detail_level: DETAIL_SIMPLIFIED,
                projection,
            },
            PlanType::LocationPlan => Self {
                plan_type,
                use_colors: true,
                include_footpaths: true,
                detail_level: DETAIL_DETAILED,
                projection,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Job status and records
// ---------------------------------------------------------------------------

/// Lifecycle state of a conversion job.
///
/// Transitions only move forward: `pending -> processing -> completed`
/// or `pending -> processing -> error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// The tracked state of one conversion attempt.
///
/// Created by submission, mutated only by the launching task that owns
/// it, read concurrently by status pollers as cloned snapshots, and
/// eventually evicted by the retention sweep once terminal.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: String,
    pub input_path: PathBuf,
    /// User-supplied hint for the output filename, not authoritative.
    pub requested_output_name: String,
    pub options: ConversionOptions,
    pub status: JobStatus,
    /// 0 to 100. Non-decreasing while processing; reset to 0 on error.
    pub progress: u8,
    /// Latest status narrative shown to pollers.
    pub message: String,
    pub created_at: Timestamp,
    /// Set exactly once, when the job completes successfully.
    pub completed_at: Option<Timestamp>,
    pub error_message: Option<String>,
    pub output_file: Option<PathBuf>,
    /// Converter statistics merged with derived fields.
    pub stats: serde_json::Map<String, serde_json::Value>,
    pub submitted_by: String,
    /// Opaque project reference used for per-project output placement.
    pub project: Option<String>,
}

/// Parameters captured at submission time to create a [`JobRecord`].
#[derive(Debug, Clone)]
pub struct NewJob {
    pub input_path: PathBuf,
    pub requested_output_name: String,
    pub options: ConversionOptions,
    pub submitted_by: String,
    pub project: Option<String>,
}

/// Abbreviated job snapshot for the active-jobs listing.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveJobView {
    pub id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub created_at: Timestamp,
    pub submitted_by: String,
}

impl From<&JobRecord> for ActiveJobView {
    fn from(job: &JobRecord) -> Self {
        Self {
            id: job.id.clone(),
            status: job.status,
            progress: job.progress,
            message: job.message.clone(),
            created_at: job.created_at,
            submitted_by: job.submitted_by.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a project reference used for per-project output placement.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_PROJECT_REF_LEN` characters.
/// - Must contain only alphanumeric, hyphen, or underscore characters,
///   so a reference can never name a path outside the output directory.
pub fn validate_project_ref(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation(
            "Project reference must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_PROJECT_REF_LEN {
        return Err(CoreError::Validation(format!(
            "Project reference must not exceed {MAX_PROJECT_REF_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::Validation(
            "Project reference may only contain alphanumeric, hyphen, or underscore characters"
                .to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
