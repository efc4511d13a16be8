//! End-to-end supervision of one conversion job.
//!
//! [`spawn_job`] runs a detached task per job: it validates the input,
//! resolves a Python runtime, spawns the converter with piped stdio,
//! feeds the accumulated stdout to the progress estimator, and
//! finalizes the job record on exit. Errors are captured into the
//! record and never propagate back to the submitter; pollers observe
//! them through the registry.
//!
//! Kept from the reference behavior: no concurrency bound on
//! simultaneous jobs, no deadline, and no cancellation once launched.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::converter;
use crate::events::{ConversionEvent, EventBus};
use crate::history::{HistoryEntry, HistoryLog};
use crate::interpreter::{self, DEFAULT_RUNTIME_CANDIDATES};
use crate::job::JobRecord;
use crate::progress;
use crate::registry::JobRegistry;

/// Progress reported as soon as the job leaves `pending`.
const STARTING_PROGRESS: u8 = 10;

/// Maximum stderr captured from the converter (256 KiB).
///
/// Diagnostic text beyond this limit is truncated to bound memory use.
const MAX_STDERR_BYTES: usize = 256 * 1024;

/// Static configuration the launcher needs to run conversions.
#[derive(Debug, Clone)]
pub struct ConverterContext {
    /// Path to the converter script.
    pub script_path: PathBuf,
    /// Directory drawings are written to. Jobs carrying a project
    /// reference write into a per-project subdirectory.
    pub output_dir: PathBuf,
    /// Runtime candidates probed per launch, in order of preference.
    pub runtime_candidates: Vec<String>,
}

impl ConverterContext {
    /// Context with the default runtime candidates.
    pub fn new(script_path: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            script_path,
            output_dir,
            runtime_candidates: DEFAULT_RUNTIME_CANDIDATES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

/// Launch the job asynchronously.
///
/// Fire-and-forget: the caller keeps only the job id and observes the
/// outcome by polling the registry.
pub fn spawn_job(
    ctx: Arc<ConverterContext>,
    registry: Arc<JobRegistry>,
    history: Arc<HistoryLog>,
    bus: Arc<EventBus>,
    job_id: String,
) {
    tokio::spawn(async move {
        run_job(ctx, registry, history, bus, job_id).await;
    });
}

async fn run_job(
    ctx: Arc<ConverterContext>,
    registry: Arc<JobRegistry>,
    history: Arc<HistoryLog>,
    bus: Arc<EventBus>,
    job_id: String,
) {
    let Some(job) = registry.get(&job_id) else {
        tracing::warn!(job_id = %job_id, "Job vanished before launch");
        return;
    };

    registry.start_processing(&job_id, STARTING_PROGRESS, "Starting conversion");

    // Input must exist at launch time. A missing file is a job error,
    // not a crash: the submitter already got their id back.
    if !tokio::fs::try_exists(&job.input_path).await.unwrap_or(false) {
        fail_job(
            &registry,
            &bus,
            &job_id,
            format!("Input file not found: {}", job.input_path.display()),
        );
        return;
    }

    let Some(runtime) = interpreter::locate_runtime(&ctx.runtime_candidates).await else {
        fail_job(&registry, &bus, &job_id, "Python runtime not found");
        return;
    };

    // Output goes next to other drawings of the same project, or into
    // the shared output directory when the job has no project.
    let output_dir = match &job.project {
        Some(project) => ctx.output_dir.join(project),
        None => ctx.output_dir.clone(),
    };
    if let Err(e) = tokio::fs::create_dir_all(&output_dir).await {
        fail_job(
            &registry,
            &bus,
            &job_id,
            format!("Failed to prepare output directory: {e}"),
        );
        return;
    }

    let output_path = output_dir.join(converter::output_filename(
        &job.requested_output_name,
        &job_id,
    ));
    let stats_path = output_dir.join(format!("{job_id}.stats.json"));

    let mut cmd = Command::new(&runtime);
    cmd.arg(&ctx.script_path)
        .args(converter::converter_args(
            &job.input_path,
            &output_path,
            &stats_path,
            &job.options,
        ))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::info!(
        job_id = %job_id,
        runtime = %runtime,
        input = %job.input_path.display(),
        output = %output_path.display(),
        "Launching converter",
    );

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            fail_job(
                &registry,
                &bus,
                &job_id,
                format!("Failed to launch converter: {e}"),
            );
            return;
        }
    };

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    // stderr drains in its own task so a chatty converter cannot
    // deadlock the stdout loop on a full pipe buffer.
    let stderr_handle = tokio::spawn(read_capped(stderr_pipe));

    // Drain stdout line by line, feeding the accumulated text to the
    // progress estimator after every line. Only progress and message
    // change here; the status stays `processing`.
    let mut output = String::new();
    if let Some(stdout) = stdout_pipe {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            output.push_str(&line);
            output.push('\n');
            if let Some((pct, message)) = progress::classify(&output) {
                registry.update_progress(&job_id, pct, message);
            }
        }
    }

    let status = match child.wait().await {
        Ok(status) => status,
        Err(e) => {
            fail_job(
                &registry,
                &bus,
                &job_id,
                format!("Failed to wait for converter: {e}"),
            );
            return;
        }
    };
    let stderr_text = stderr_handle.await.unwrap_or_default();

    if !status.success() {
        let code = status.code().unwrap_or(-1);
        let stderr_text = stderr_text.trim();
        let error = if stderr_text.is_empty() {
            format!("Converter exited with code {code}")
        } else {
            format!("Converter exited with code {code}: {stderr_text}")
        };
        fail_job(&registry, &bus, &job_id, error);
        return;
    }

    // A zero exit without an artifact still fails the job.
    if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
        fail_job(
            &registry,
            &bus,
            &job_id,
            "Converter reported success but no output was produced",
        );
        return;
    }

    // The stats side-file is scratch: parse what is there (tolerating
    // garbage), then drop it. Only the drawing is durable.
    let mut stats = converter::read_stats_file(&stats_path).await;
    let _ = tokio::fs::remove_file(&stats_path).await;

    let file_size = tokio::fs::metadata(&output_path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);
    stats.insert("file_size".to_string(), file_size.into());
    stats.insert(
        "plan_type".to_string(),
        job.options.plan_type.as_str().into(),
    );
    stats.insert("projection".to_string(), job.options.projection.clone().into());

    let Some(done) = registry.complete(&job_id, output_path, stats) else {
        return;
    };

    history.append(history_entry(&done, file_size));
    bus.publish(ConversionEvent::completed(
        done.id.clone(),
        done.project.clone(),
        serde_json::json!({
            "output_file": done.output_file,
            "plan_type": done.options.plan_type.as_str(),
            "file_size": file_size,
        }),
    ));

    tracing::info!(job_id = %done.id, file_size, "Conversion completed");
}

/// Capture a failed job into the registry and publish the outcome.
fn fail_job(registry: &JobRegistry, bus: &EventBus, job_id: &str, error: impl Into<String>) {
    let error = error.into();
    tracing::warn!(job_id = %job_id, error = %error, "Conversion failed");
    if let Some(record) = registry.fail(job_id, &error) {
        bus.publish(ConversionEvent::failed(record.id, record.project, &error));
    }
}

/// Snapshot a completed record into a history entry.
fn history_entry(done: &JobRecord, file_size: u64) -> HistoryEntry {
    HistoryEntry {
        job_id: done.id.clone(),
        output_file: done.output_file.clone().unwrap_or_default(),
        plan_type: done.options.plan_type,
        projection: done.options.projection.clone(),
        file_size_bytes: file_size,
        completed_at: done.completed_at.unwrap_or_else(chrono::Utc::now),
        submitted_by: done.submitted_by.clone(),
        project: done.project.clone(),
    }
}

/// Read an entire stream into a string, capped at [`MAX_STDERR_BYTES`].
async fn read_capped<R: AsyncRead + Unpin>(handle: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_STDERR_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
