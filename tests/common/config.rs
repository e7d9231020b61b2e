//! Test configuration helpers

use cnc_dl::{Config, ObservationDownloader, ProjectConfig};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

/// Path of the mocked observations endpoint
pub const OBSERVATIONS_PATH: &str = "/v1/observations";

/// Config pointing at the mock server, writing into `output`, with no delay
pub fn test_config(server: &MockServer, output: &TempDir) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}{}", server.uri(), OBSERVATIONS_PATH);
    config.api.request_delay = Duration::ZERO;
    config.api.timeout = Duration::from_secs(5);
    config.output.output_dir = output.path().join("observations");
    config
}

/// Downloader for `test_config`, restricted to `projects`
pub fn test_downloader(
    server: &MockServer,
    output: &TempDir,
    projects: Vec<ProjectConfig>,
) -> ObservationDownloader {
    let mut config = test_config(server, output);
    config.projects = projects;
    ObservationDownloader::new(config).expect("test config must be valid")
}
