//! Configuration types for cnc-dl

use crate::error::{Error, Result};
use crate::types::ProjectId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Projects downloaded when no other list is given
pub const DEFAULT_PROJECTS: [(i64, &str); 11] = [
    (18620, "CNC_London_2018"),
    (33231, "CNC_London_2019"),
    (62227, "CNC_London_2020"),
    (10931, "CNC_Los_Angeles_2017"),
    (16065, "CNC_Los_Angeles_2018"),
    (31997, "CNC_Los_Angeles_2019"),
    (62506, "CNC_Los_Angeles_2020"),
    (11013, "CNC_San_Francisco_2017"),
    (16036, "CNC_San_Francisco_2018"),
    (29624, "CNC_San_Francisco_2019"),
    (62485, "CNC_San_Francisco_2020"),
];

/// Observations API settings
///
/// The public API allows at most 100 requests per minute and recommends 60,
/// hence the one-second default between pages.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Observations endpoint (default: "https://api.inaturalist.org/v1/observations")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Records per page (default: 200, the API maximum)
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Pause after every non-empty page (default: 1000 ms)
    #[serde(default = "default_request_delay", with = "duration_ms_serde")]
    pub request_delay: Duration,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            per_page: default_per_page(),
            request_delay: default_request_delay(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Where CSV files go
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "data/raw/observations_v2")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl OutputConfig {
    /// `<output_dir>/<name>.csv`
    pub fn csv_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.csv", name))
    }
}

/// One project to download
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// iNaturalist project id
    pub id: ProjectId,
    /// Output file stem, by convention "CNC_<City>_<Year>"
    pub name: String,
}

impl ProjectConfig {
    /// Create a project entry
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: ProjectId(id),
            name: name.into(),
        }
    }
}

/// Main configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Observations API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Projects downloaded by the batch driver, in order
    #[serde(default = "default_projects")]
    pub projects: Vec<ProjectConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            output: OutputConfig::default(),
            projects: default_projects(),
        }
    }
}

impl Config {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the download loop misbehave
    pub fn validate(&self) -> Result<()> {
        if self.api.per_page == 0 {
            return Err(Error::config("per_page must be at least 1", "api.per_page"));
        }
        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(Error::config(
                format!("invalid base URL: {}", self.api.base_url),
                "api.base_url",
            ));
        }

        let mut seen = HashSet::new();
        for project in &self.projects {
            if project.name.trim().is_empty() {
                return Err(Error::config(
                    format!("project {} has an empty name", project.id),
                    "projects",
                ));
            }
            if !seen.insert(project.id) {
                return Err(Error::config(
                    format!("project {} is listed twice", project.id),
                    "projects",
                ));
            }
        }
        Ok(())
    }

    /// Keep only the listed projects, in configured order.
    ///
    /// An id that is not configured is an error rather than silently ignored.
    pub fn select_projects(&self, ids: &[ProjectId]) -> Result<Vec<ProjectConfig>> {
        if ids.is_empty() {
            return Ok(self.projects.clone());
        }
        if let Some(unknown) = ids
            .iter()
            .find(|id| !self.projects.iter().any(|p| p.id == **id))
        {
            return Err(Error::config(
                format!("project {} is not configured", unknown),
                "projects",
            ));
        }
        Ok(self
            .projects
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

fn default_base_url() -> String {
    "https://api.inaturalist.org/v1/observations".to_string()
}

fn default_per_page() -> u32 {
    200
}

fn default_request_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("cnc-dl/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/raw/observations_v2")
}

fn default_projects() -> Vec<ProjectConfig> {
    DEFAULT_PROJECTS
        .iter()
        .map(|(id, name)| ProjectConfig::new(*id, *name))
        .collect()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
pub(crate) mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
