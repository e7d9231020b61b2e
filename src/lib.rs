//! # cnc-dl
//!
//! Downloads City Nature Challenge observations from the iNaturalist
//! observations API and saves one CSV file per project.
//!
//! ## Pipeline
//!
//! For each project the downloader requests pages of 200 observations
//! ordered by id, using the last id of each page as the `id_above` cursor
//! for the next one. Every observation is flattened into a row (user,
//! location, taxon and identification sub-objects folded into columns),
//! and once the API returns an empty page the rows are aligned into a
//! table, typed per column and written atomically to
//! `<output_dir>/<name>.csv`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cnc_dl::{Config, ObservationDownloader, ProjectConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = ObservationDownloader::new(Config::default())?;
//!
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = downloader
//!         .download_project(&ProjectConfig::new(18620, "CNC_London_2018"))
//!         .await?;
//!     println!("wrote {} rows to {}", summary.rows, summary.path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Observations API client
pub mod client;
/// Configuration types
pub mod config;
/// Paginated download loop and batch driver
pub mod downloader;
/// Error types
pub mod error;
/// Record flattening
pub mod flatten;
/// Atomic CSV output
pub mod output;
/// Table assembly and column typing
pub mod table;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use client::{ObservationPage, ObservationsClient, PageRequest};
pub use config::{ApiConfig, Config, OutputConfig, ProjectConfig};
pub use downloader::{CollectedRows, ObservationDownloader};
pub use error::{Error, Result};
pub use flatten::{Row, flatten_observation, parse_location};
pub use table::{ColumnType, Table};
pub use types::{DownloadSummary, Event, ProjectId};
