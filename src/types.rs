//! Core types for cnc-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// iNaturalist project identifier (one City Nature Challenge city-year)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl ProjectId {
    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl PartialEq<i64> for ProjectId {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProjectId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Event emitted while downloading a project
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Download of a project started
    DownloadStarted {
        /// Project ID
        project_id: ProjectId,
        /// Output name (file stem)
        name: String,
    },

    /// One page of observations was fetched and flattened
    PageFetched {
        /// Project ID
        project_id: ProjectId,
        /// Rows accumulated so far
        downloaded: u64,
        /// `total_results` reported by the first response
        total: u64,
        /// Progress percentage (0.0 to 100.0)
        percent: f32,
        /// Cursor for the next request
        next_id_above: i64,
    },

    /// CSV written
    Saved {
        /// Project ID
        project_id: ProjectId,
        /// File that was written
        path: PathBuf,
        /// Number of data rows
        rows: usize,
    },

    /// Download aborted; nothing was written
    DownloadFailed {
        /// Project ID
        project_id: ProjectId,
        /// Error message
        error: String,
    },
}

/// Outcome of downloading one project
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadSummary {
    /// Project ID
    pub project_id: ProjectId,
    /// Output name (file stem)
    pub name: String,
    /// File that was written
    pub path: PathBuf,
    /// Number of data rows written
    pub rows: usize,
    /// Number of API requests made, including the final empty page
    pub requests: u32,
    /// `total_results` reported by the first response
    pub total_results: u64,
    /// Wall-clock time spent on the project
    #[serde(with = "crate::config::duration_ms_serde")]
    pub elapsed: Duration,
}

/// Fraction of `total` covered by `downloaded`, as a percentage.
///
/// `total_results` is only read from the first response, so `downloaded`
/// can exceed it when observations are added mid-download. A zero total
/// reports 100%.
pub fn progress_percent(downloaded: u64, total: u64) -> f32 {
    if total == 0 {
        return 100.0;
    }
    (downloaded as f64 / total as f64 * 100.0) as f32
}
