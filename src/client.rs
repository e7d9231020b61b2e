//! HTTP client for the iNaturalist observations endpoint.
//!
//! Pages are requested with `order_by=id&order=asc` and an `id_above`
//! cursor rather than `page=N`, because the API refuses to page past
//! 10,000 results.

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::ProjectId;
use serde::Deserialize;
use tracing::debug;

/// Parameters of one page request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Project to filter on
    pub project_id: ProjectId,
    /// Exclusive lower bound on observation id
    pub id_above: i64,
    /// Page size
    pub per_page: u32,
}

impl PageRequest {
    /// Query string pairs in the order the API documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("project_id", self.project_id.to_string()),
            ("per_page", self.per_page.to_string()),
            ("id_above", self.id_above.to_string()),
            ("order", "asc".to_string()),
            ("order_by", "id".to_string()),
        ]
    }
}

/// One decoded response page
#[derive(Clone, Debug, Deserialize)]
pub struct ObservationPage {
    /// Total matches for the filter; only meaningful on the first page
    pub total_results: u64,
    /// Raw observation objects
    pub results: Vec<serde_json::Value>,
}

impl ObservationPage {
    /// True when the cursor has run past the last observation
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Thin wrapper around `reqwest::Client` bound to one endpoint
#[derive(Clone, Debug)]
pub struct ObservationsClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl ObservationsClient {
    /// Build a client from API settings
    ///
    /// # Errors
    /// Returns a configuration error if the base URL does not parse or the
    /// HTTP client cannot be created.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = url::Url::parse(&config.base_url).map_err(|e| {
            Error::config(
                format!("invalid base URL {}: {}", config.base_url, e),
                "api.base_url",
            )
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {}", e),
                key: None,
            })?;

        Ok(Self { http, base_url })
    }

    /// Fetch and decode one page
    ///
    /// # Errors
    /// - `Error::Network` on transport failure
    /// - `Error::HttpStatus` when the API answers with a non-2xx status
    /// - `Error::Serialization` when the body is not the expected JSON shape
    pub async fn fetch_page(&self, request: &PageRequest) -> Result<ObservationPage> {
        debug!(
            project_id = %request.project_id,
            id_above = request.id_above,
            "requesting observations page"
        );

        let response = self
            .http
            .get(self.base_url.clone())
            .query(&request.query_pairs())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let body = response.text().await?;
        let page: ObservationPage = serde_json::from_str(&body)?;

        debug!(
            project_id = %request.project_id,
            results = page.results.len(),
            total_results = page.total_results,
            "page decoded"
        );
        Ok(page)
    }
}
