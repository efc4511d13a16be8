//! Progress inference from converter output.
//!
//! The converter reports no structured progress; the closest signal is
//! the log lines it prints while working. [`classify`] matches the
//! cumulative output against a fixed milestone table. This is a
//! heuristic: a wording change in the converter silently stops the
//! milestones from matching, and the job then jumps from the start
//! value straight to the terminal one.

/// One row of the milestone table.
#[derive(Debug, Clone, Copy)]
pub struct Milestone {
    /// Fragments that must all appear in the output for the row to match.
    pub fragments: &'static [&'static str],
    /// Progress percentage reported when the row matches.
    pub progress: u8,
    /// Narrative for the job's status message.
    pub message: &'static str,
}

/// Milestones in conversion order. Later rows override earlier ones as
/// output accumulates.
pub const MILESTONES: [Milestone; 4] = [
    Milestone {
        fragments: &["Parsing"],
        progress: 50,
        message: "Parsing OSM data",
    },
    Milestone {
        fragments: &["Processing", "nodes"],
        progress: 65,
        message: "Processing nodes",
    },
    Milestone {
        fragments: &["Processing", "ways"],
        progress: 80,
        message: "Processing ways",
    },
    Milestone {
        fragments: &["Generating"],
        progress: 90,
        message: "Generating DXF output",
    },
];

/// Map the converter's cumulative stdout to the highest milestone reached.
///
/// Rows are evaluated in table order and the last matching row wins.
/// Returns `None` when no row matches, leaving progress unchanged.
pub fn classify(output: &str) -> Option<(u8, &'static str)> {
    MILESTONES
        .iter()
        .filter(|m| m.fragments.iter().all(|f| output.contains(f)))
        .map(|m| (m.progress, m.message))
        .last()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
