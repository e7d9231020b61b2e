//! Paginated download of project observations.
//!
//! One project is fetched page by page with an `id_above` cursor, every
//! record is flattened as it arrives, and the accumulated rows are written
//! as one CSV once the API returns an empty page. Nothing is written for a
//! project whose download fails.

use crate::client::{ObservationsClient, PageRequest};
use crate::config::{Config, ProjectConfig};
use crate::error::{Error, Result};
use crate::flatten::{Row, flatten_observation};
use crate::output::write_table_blocking;
use crate::table::Table;
use crate::types::{DownloadSummary, Event, ProjectId, progress_percent};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Cursor value for the first request; observation ids start above it
pub const INITIAL_CURSOR: i64 = 1;

/// Capacity of the event channel; slow subscribers lag instead of blocking
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Rows collected for one project, before they are written
#[derive(Debug, Default)]
pub struct CollectedRows {
    /// Flattened observations, in id order
    pub rows: Vec<Row>,
    /// Requests made, including the final empty page
    pub requests: u32,
    /// `total_results` reported by the first response
    pub total_results: u64,
    /// `id_above` sent with each request, in order
    pub cursors: Vec<i64>,
}

/// Downloads projects one after another (cloneable, fields are Arc-wrapped)
#[derive(Clone)]
pub struct ObservationDownloader {
    client: ObservationsClient,
    config: Arc<Config>,
    event_tx: broadcast::Sender<Event>,
}

impl ObservationDownloader {
    /// Validate the config and build the HTTP client
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = ObservationsClient::new(&config.api)?;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            client,
            config: Arc::new(config),
            event_tx,
        })
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Download every configured project
    pub async fn download_configured(&self) -> Result<Vec<DownloadSummary>> {
        let projects = self.config.projects.clone();
        self.download_all(&projects).await
    }

    /// Download projects sequentially.
    ///
    /// The first failure stops the batch; projects already written stay on
    /// disk and later ones are not attempted.
    pub async fn download_all(&self, projects: &[ProjectConfig]) -> Result<Vec<DownloadSummary>> {
        let mut summaries = Vec::with_capacity(projects.len());
        for (index, project) in projects.iter().enumerate() {
            info!(
                project_id = %project.id,
                name = %project.name,
                "project {}/{}",
                index + 1,
                projects.len()
            );
            summaries.push(self.download_project(project).await?);
        }
        Ok(summaries)
    }

    /// Download one project and write `<output_dir>/<name>.csv`
    pub async fn download_project(&self, project: &ProjectConfig) -> Result<DownloadSummary> {
        let started = Instant::now();
        info!(project_id = %project.id, name = %project.name, "starting download");
        self.emit(Event::DownloadStarted {
            project_id: project.id,
            name: project.name.clone(),
        });

        match self.download_and_save(project, started).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!(project_id = %project.id, error = %e, "download failed");
                self.emit(Event::DownloadFailed {
                    project_id: project.id,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn download_and_save(
        &self,
        project: &ProjectConfig,
        started: Instant,
    ) -> Result<DownloadSummary> {
        let collected = self.collect_rows(project.id).await?;
        let CollectedRows {
            rows,
            requests,
            total_results,
            ..
        } = collected;

        let table = Table::from_rows(rows);
        let row_count = table.len();
        let path = self.config.output.csv_path(&project.name);
        info!(path = %path.display(), rows = row_count, "saving file");
        let path = write_table_blocking(table, path).await?;

        self.emit(Event::Saved {
            project_id: project.id,
            path: path.clone(),
            rows: row_count,
        });
        info!(project_id = %project.id, "done");

        Ok(DownloadSummary {
            project_id: project.id,
            name: project.name.clone(),
            path,
            rows: row_count,
            requests,
            total_results,
            elapsed: started.elapsed(),
        })
    }

    /// Page through a project until the API returns an empty page
    pub async fn collect_rows(&self, project_id: ProjectId) -> Result<CollectedRows> {
        let api = &self.config.api;
        let mut collected = CollectedRows::default();
        let mut cursor = INITIAL_CURSOR;
        let mut total_results: Option<u64> = None;

        loop {
            let request = PageRequest {
                project_id,
                id_above: cursor,
                per_page: api.per_page,
            };
            let page = self.client.fetch_page(&request).await?;
            collected.requests += 1;
            collected.cursors.push(cursor);

            let total = *total_results.get_or_insert(page.total_results);
            if page.is_empty() {
                debug!(project_id = %project_id, cursor, "empty page, download complete");
                break;
            }

            collected.rows.reserve(page.results.len());
            for record in &page.results {
                collected.rows.push(flatten_observation(record)?);
            }

            let last_id = collected
                .rows
                .last()
                .and_then(Row::id)
                .ok_or_else(|| Error::MalformedRecord {
                    record_id: None,
                    reason: "last observation on page has no id".to_string(),
                })?;
            if last_id <= cursor {
                return Err(Error::CursorStalled {
                    project_id: project_id.get(),
                    cursor,
                    last_id,
                });
            }

            let downloaded = collected.rows.len() as u64;
            let percent = progress_percent(downloaded, total);
            info!(
                project_id = %project_id,
                downloaded,
                total,
                "downloaded {:.1}% ({}/{} observations)",
                percent,
                downloaded,
                total
            );
            self.emit(Event::PageFetched {
                project_id,
                downloaded,
                total,
                percent,
                next_id_above: last_id,
            });

            cursor = last_id;

            if !api.request_delay.is_zero() {
                tokio::time::sleep(api.request_delay).await;
            }
        }

        collected.total_results = total_results.unwrap_or_default();
        Ok(collected)
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}
