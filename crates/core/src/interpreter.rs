//! Discovery of a Python runtime for the external converter.
//!
//! The converter is a Python script, so every launch needs a working
//! interpreter on the host. Candidates are probed in order with a
//! trivial `--version` invocation; the first one that exits 0 wins.
//! Nothing is cached: hosts change, and a probe is cheap next to a
//! conversion.

use std::process::Stdio;

use tokio::process::Command;

/// Interpreter commands probed in order of preference.
pub const DEFAULT_RUNTIME_CANDIDATES: [&str; 2] = ["python3", "python"];

/// Find the first usable runtime among `candidates`.
///
/// A candidate is usable when `<candidate> --version` runs and exits 0.
/// Probe failures (missing binary, non-zero exit) are not reported as
/// errors; they only mean the next candidate is tried. Returns `None`
/// when no candidate works.
pub async fn locate_runtime<S: AsRef<str>>(candidates: &[S]) -> Option<String> {
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let status = Command::new(candidate)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => return Some(candidate.to_string()),
            _ => continue,
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binaries_yield_none() {
        let found = locate_runtime(&["planserve-no-such-runtime"]).await;
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn first_working_candidate_wins() {
        // `true` ignores its arguments and exits 0, standing in for a
        // runtime that answers its version probe.
        let found = locate_runtime(&["planserve-no-such-runtime", "true"]).await;
        assert_eq!(found.as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn failing_candidate_is_skipped() {
        // `false` exists but exits 1, so the probe moves on.
        let found = locate_runtime(&["false", "true"]).await;
        assert_eq!(found.as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn empty_candidate_list_yields_none() {
        let found = locate_runtime::<&str>(&[]).await;
        assert!(found.is_none());
    }
}
