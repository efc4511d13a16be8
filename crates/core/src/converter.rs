//! Invocation building and statistics for the OSM-to-DXF converter.
//!
//! The converter is a black-box script: positional input path, `-o`
//! output path, plan-type and projection switches, and an optional JSON
//! statistics side-file. This module keeps the argument layout and the
//! side-file handling in one place, away from process supervision.

use std::path::Path;

use serde_json::{Map, Value};

use crate::job::ConversionOptions;

/// File extension of every produced drawing.
pub const OUTPUT_EXTENSION: &str = "dxf";

/// Fallback filename stem when the requested name yields nothing usable.
const DEFAULT_STEM: &str = "plan";

/// Build the output filename for a job.
///
/// The requested name is a user-supplied hint: only its stem is kept,
/// non-portable characters are replaced, and the job id is appended so
/// concurrent jobs can never collide on disk.
pub fn output_filename(requested: &str, job_id: &str) -> String {
    let stem = Path::new(requested)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_STEM);

    let mut stem: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.chars().all(|c| c == '_') {
        stem = DEFAULT_STEM.to_string();
    }

    format!("{stem}_{job_id}.{OUTPUT_EXTENSION}")
}

/// Assemble the converter's command-line arguments.
///
/// Layout matches the converter CLI: positional input, `-o` output,
/// `--plan-type`, `--projection`, `--stats-output`, and `--no-colors`
/// for monochrome presets.
pub fn converter_args(
    input: &Path,
    output: &Path,
    stats: &Path,
    options: &ConversionOptions,
) -> Vec<String> {
    let mut args = vec![
        input.to_string_lossy().into_owned(),
        "-o".to_string(),
        output.to_string_lossy().into_owned(),
        "--plan-type".to_string(),
        options.plan_type.as_str().to_string(),
        "--projection".to_string(),
        options.projection.clone(),
        "--stats-output".to_string(),
        stats.to_string_lossy().into_owned(),
    ];
    if !options.use_colors {
        args.push("--no-colors".to_string());
    }
    args
}

/// Read and parse the statistics side-file.
///
/// The side-file is optional and best-effort: a missing file or
/// malformed JSON yields an empty map rather than a job failure.
pub async fn read_stats_file(path: &Path) -> Map<String, Value> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(_) => return Map::new(),
    };

    match serde_json::from_str::<Map<String, Value>>(&contents) {
        Ok(stats) => stats,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed stats file");
            Map::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::job::PlanType;

    // -- output_filename ------------------------------------------------------

    #[test]
    fn filename_appends_job_id_and_extension() {
        let name = output_filename("site-plan", "abc123");
        assert_eq!(name, "site-plan_abc123.dxf");
    }

    #[test]
    fn filename_strips_directories_and_extension() {
        let name = output_filename("../uploads/town center.osm", "abc123");
        assert_eq!(name, "town_center_abc123.dxf");
    }

    #[test]
    fn empty_request_falls_back_to_default_stem() {
        assert_eq!(output_filename("", "abc123"), "plan_abc123.dxf");
        assert_eq!(output_filename("///", "abc123"), "plan_abc123.dxf");
    }

    #[test]
    fn distinct_job_ids_never_collide() {
        let a = output_filename("site", "job-a");
        let b = output_filename("site", "job-b");
        assert_ne!(a, b);
    }

    // -- converter_args -------------------------------------------------------

    #[test]
    fn key_plan_args_include_no_colors() {
        let options = ConversionOptions::for_plan_type(PlanType::KeyPlan, None);
        let args = converter_args(
            &PathBuf::from("/in/site.osm"),
            &PathBuf::from("/out/site.dxf"),
            &PathBuf::from("/out/site.stats.json"),
            &options,
        );

        assert_eq!(args[0], "/in/site.osm");
        let o = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o + 1], "/out/site.dxf");
        let plan = args.iter().position(|a| a == "--plan-type").unwrap();
        assert_eq!(args[plan + 1], "key-plan");
        let proj = args.iter().position(|a| a == "--projection").unwrap();
        assert_eq!(args[proj + 1], "EPSG:3857");
        assert!(args.contains(&"--no-colors".to_string()));
    }

    #[test]
    fn location_plan_args_keep_colors() {
        let options = ConversionOptions::for_plan_type(PlanType::LocationPlan, None);
        let args = converter_args(
            &PathBuf::from("in.osm"),
            &PathBuf::from("out.dxf"),
            &PathBuf::from("out.stats.json"),
            &options,
        );

        let plan = args.iter().position(|a| a == "--plan-type").unwrap();
        assert_eq!(args[plan + 1], "location-plan");
        assert!(!args.contains(&"--no-colors".to_string()));
    }

    #[test]
    fn stats_side_file_path_is_passed_through() {
        let options = ConversionOptions::for_plan_type(PlanType::KeyPlan, None);
        let args = converter_args(
            &PathBuf::from("in.osm"),
            &PathBuf::from("out.dxf"),
            &PathBuf::from("/scratch/job.stats.json"),
            &options,
        );

        let stats = args.iter().position(|a| a == "--stats-output").unwrap();
        assert_eq!(args[stats + 1], "/scratch/job.stats.json");
    }

    // -- read_stats_file ------------------------------------------------------

    #[tokio::test]
    async fn missing_stats_file_yields_empty_map() {
        let stats = read_stats_file(Path::new("/no/such/stats.json")).await;
        assert!(stats.is_empty());
    }

    #[tokio::test]
    async fn malformed_stats_file_yields_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        std::fs::write(&path, "not json at all {").unwrap();

        let stats = read_stats_file(&path).await;
        assert!(stats.is_empty());
    }

    #[tokio::test]
    async fn valid_stats_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        std::fs::write(&path, r#"{"nodes": 120, "ways": 40, "layers": 7}"#).unwrap();

        let stats = read_stats_file(&path).await;
        assert_eq!(stats["nodes"], 120);
        assert_eq!(stats["ways"], 40);
        assert_eq!(stats["layers"], 7);
    }
}
