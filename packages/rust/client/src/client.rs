//! Service-level operations against a Lumen server.
//!
//! [`Client`] owns the connection pool and the API key. Index-scoped
//! operations live on [`Index`] handles obtained from the client.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::errors::{ErrorCode, Result};
use crate::indexes::{Index, IndexInfo, IndexStats};
use crate::request::{Method, request};

/// User-Agent string for all requests.
const USER_AGENT: &str = concat!("lumen-client/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Handle to a Lumen server.
///
/// Cloning is cheap: clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    host: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl Client {
    /// Connect to `host` with the default timeout.
    ///
    /// `api_key` is `None` for unsecured development instances.
    pub fn new(host: impl Into<String>, api_key: Option<&str>) -> Result<Self> {
        Self::builder(host).api_key(api_key).build()
    }

    /// Start building a client with non-default options.
    pub fn builder(host: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            host: host.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A local handle to the index with the given uid. No network call;
    /// use [`Client::get_index`] to verify the index exists.
    pub fn index(&self, uid: impl Into<String>) -> Index<'_> {
        Index::new(self, uid.into(), None)
    }

    /// List every index on the server.
    #[instrument(skip_all)]
    pub async fn list_indexes(&self) -> Result<Vec<Index<'_>>> {
        let infos: Vec<IndexInfo> = request::<(), _>(
            &self.http,
            &self.url("/indexes"),
            self.api_key(),
            Method::Get,
            StatusCode::OK,
        )
        .await?;

        debug!(count = infos.len(), "listed indexes");
        Ok(infos.into_iter().map(|i| Index::from_info(self, i)).collect())
    }

    /// Fetch the index with the given uid, erroring if it does not exist.
    #[instrument(skip_all, fields(uid = %uid))]
    pub async fn get_index(&self, uid: &str) -> Result<Index<'_>> {
        let info: IndexInfo = request::<(), _>(
            &self.http,
            &self.url(&format!("/indexes/{uid}")),
            self.api_key(),
            Method::Get,
            StatusCode::OK,
        )
        .await?;

        Ok(Index::from_info(self, info))
    }

    /// Create a new index, optionally declaring its primary key.
    #[instrument(skip_all, fields(uid = %uid))]
    pub async fn create_index(&self, uid: &str, primary_key: Option<&str>) -> Result<Index<'_>> {
        let body = CreateIndexBody { uid, primary_key };
        let info: IndexInfo = request(
            &self.http,
            &self.url("/indexes"),
            self.api_key(),
            Method::Post(body),
            StatusCode::CREATED,
        )
        .await?;

        Ok(Index::from_info(self, info))
    }

    /// Create the index, or fetch it if it already exists.
    pub async fn get_or_create(&self, uid: &str) -> Result<Index<'_>> {
        match self.create_index(uid, None).await {
            Ok(index) => Ok(index),
            Err(e) if e.is_code(ErrorCode::IndexAlreadyExists) => self.get_index(uid).await,
            Err(e) => Err(e),
        }
    }

    /// Query the server's health endpoint.
    pub async fn health(&self) -> Result<Health> {
        request::<(), _>(
            &self.http,
            &self.url("/health"),
            self.api_key(),
            Method::Get,
            StatusCode::OK,
        )
        .await
    }

    /// True if the server answers its health endpoint as available.
    /// Never errors; transport failures read as unhealthy.
    pub async fn is_healthy(&self) -> bool {
        matches!(self.health().await, Ok(h) if h.status == "available")
    }

    /// Fetch build/version information.
    pub async fn version(&self) -> Result<Version> {
        request::<(), _>(
            &self.http,
            &self.url("/version"),
            self.api_key(),
            Method::Get,
            StatusCode::OK,
        )
        .await
    }

    /// Fetch server-wide statistics, including per-index stats.
    pub async fn stats(&self) -> Result<ClientStats> {
        request::<(), _>(
            &self.http,
            &self.url("/stats"),
            self.api_key(),
            Method::Get,
            StatusCode::OK,
        )
        .await
    }

    /// Fetch the public/private key pair derived from the master key.
    pub async fn keys(&self) -> Result<Keys> {
        request::<(), _>(
            &self.http,
            &self.url("/keys"),
            self.api_key(),
            Method::Get,
            StatusCode::OK,
        )
        .await
    }

    // -- crate-internal accessors used by Index ----------------------------

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.host)
    }
}

// ---------------------------------------------------------------------------
// ClientBuilder
// ---------------------------------------------------------------------------

/// Builder for [`Client`] with non-default transport options.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    host: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ClientBuilder {
    /// Set the API key sent with every request.
    pub fn api_key(mut self, api_key: Option<&str>) -> Self {
        self.api_key = api_key.map(String::from);
        self
    }

    /// Set the per-request timeout (default 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the host and build the client.
    pub fn build(self) -> Result<Client> {
        let parsed = Url::parse(&self.host)
            .map_err(|e| crate::errors::Error::invalid_host(&self.host, e.to_string()))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(crate::errors::Error::invalid_host(
                &self.host,
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        let host = self.host.trim_end_matches('/').to_string();

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()?;

        Ok(Client {
            host,
            api_key: self.api_key,
            http,
        })
    }
}

// ---------------------------------------------------------------------------
// Service wire types
// ---------------------------------------------------------------------------

/// Response of the `/health` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    /// `"available"` when the engine accepts requests.
    pub status: String,
}

/// Response of the `/version` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub commit_sha: String,
    pub build_date: String,
    pub pkg_version: String,
}

/// Response of the `/stats` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    /// Total on-disk size of the database, in bytes.
    pub database_size: u64,
    /// When the engine last processed an update, if ever.
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    /// Stats for every index, keyed by uid.
    pub indexes: HashMap<String, IndexStats>,
}

/// Response of the `/keys` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Keys {
    #[serde(default)]
    pub public: Option<String>,
    #[serde(default)]
    pub private: Option<String>,
}

/// Request body for index creation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateIndexBody<'a> {
    uid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_key: Option<&'a str>,
}
