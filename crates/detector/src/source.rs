//! Cloud provider catalog source.
//!
//! [`HetznerSource`] reads server types and datacenters from the Hetzner
//! Cloud API (`GET /server_types`, `GET /datacenters?per_page=50`).

use std::time::Duration;

use async_trait::async_trait;
use radar_core::types::ExternalId;
use serde::Deserialize;

const USER_AGENT: &str = concat!("server-radar-detector/", env!("CARGO_PKG_VERSION"));

/// HTTP timeout for a single catalog request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The underlying HTTP request failed (network, DNS, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-2xx status code.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    HttpStatus {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
}

// ---------------------------------------------------------------------------
// API model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ApiServerType {
    pub id: ExternalId,
    pub name: String,
    pub cores: u32,
    /// Memory in GB.
    pub memory: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLocation {
    pub id: ExternalId,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiDatacenterServerTypes {
    #[serde(default)]
    pub available: Vec<ExternalId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiDatacenter {
    pub id: ExternalId,
    pub name: String,
    pub location: ApiLocation,
    #[serde(default)]
    pub server_types: ApiDatacenterServerTypes,
}

#[derive(Deserialize)]
struct ServerTypesPage {
    server_types: Vec<ApiServerType>,
}

#[derive(Deserialize)]
struct DatacentersPage {
    datacenters: Vec<ApiDatacenter>,
}

/// One raw read of the provider catalog.
#[derive(Debug, Clone, Default)]
pub struct RawCatalog {
    pub server_types: Vec<ApiServerType>,
    pub datacenters: Vec<ApiDatacenter>,
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Something that can report the current catalog.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn fetch(&self) -> Result<RawCatalog, SourceError>;
}

pub struct HetznerSource {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HetznerSource {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    async fn get(&self, endpoint: &'static str) -> Result<reqwest::Response, SourceError> {
        let url = format!("{}{endpoint}", self.base_url);
        let response = self.client.get(url).bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::HttpStatus {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl AvailabilitySource for HetznerSource {
    async fn fetch(&self) -> Result<RawCatalog, SourceError> {
        let server_types = self
            .get("/server_types")
            .await?
            .json::<ServerTypesPage>()
            .await?
            .server_types;
        tracing::debug!(count = server_types.len(), "Fetched server types");

        let datacenters = self
            .get("/datacenters?per_page=50")
            .await?
            .json::<DatacentersPage>()
            .await?
            .datacenters;
        tracing::debug!(count = datacenters.len(), "Fetched datacenters");

        Ok(RawCatalog {
            server_types,
            datacenters,
        })
    }
}
