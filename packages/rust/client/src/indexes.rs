//! Index handles: document operations, search, settings, update tracking.
//!
//! An [`Index`] borrows its [`Client`] and scopes every request under
//! `/indexes/{uid}`. Write operations return an [`Update`] acknowledgement;
//! see [`Index::wait_for_update`] to block until the engine applied one.

use std::collections::HashMap;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::client::Client;
use crate::errors::{Error, Result};
use crate::request::{Method, request};
use crate::search::{Query, SearchResults};
use crate::settings::Settings;
use crate::updates::{Update, UpdateStatus, WaitOptions};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Index metadata as the engine reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub uid: String,
    #[serde(default)]
    pub primary_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-index statistics from `/indexes/{uid}/stats`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub number_of_documents: u64,
    /// True while an update is being applied.
    pub is_indexing: bool,
    /// Document count per field name.
    #[serde(default)]
    pub fields_distribution: HashMap<String, u64>,
}

/// Request body for `PUT /indexes/{uid}`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateIndexBody<'a> {
    primary_key: &'a str,
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// Handle to one index of a Lumen server.
pub struct Index<'a> {
    client: &'a Client,
    /// Unique identifier of the index.
    pub uid: String,
    /// Primary key attribute, once known (set at creation or inferred by the
    /// engine from the first document batch).
    pub primary_key: Option<String>,
}

impl<'a> Index<'a> {
    pub(crate) fn new(client: &'a Client, uid: String, primary_key: Option<String>) -> Self {
        Self {
            client,
            uid,
            primary_key,
        }
    }

    pub(crate) fn from_info(client: &'a Client, info: IndexInfo) -> Self {
        Self::new(client, info.uid, info.primary_key)
    }

    fn url(&self, path: &str) -> String {
        self.client.url(&format!("/indexes/{}{path}", self.uid))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        request::<(), T>(
            self.client.http(),
            &self.url(path),
            self.client.api_key(),
            Method::Get,
            StatusCode::OK,
        )
        .await
    }

    /// Send a write and decode the update acknowledgement (202 Accepted).
    async fn enqueue<B: Serialize>(&self, path: &str, method: Method<B>) -> Result<Update> {
        request(
            self.client.http(),
            &self.url(path),
            self.client.api_key(),
            method,
            StatusCode::ACCEPTED,
        )
        .await
    }

    // -- index lifecycle ----------------------------------------------------

    /// Re-fetch this index's metadata, refreshing the cached primary key.
    pub async fn fetch_info(&mut self) -> Result<IndexInfo> {
        let info: IndexInfo = self.get("").await?;
        self.primary_key = info.primary_key.clone();
        Ok(info)
    }

    /// Declare the primary key. Only valid while the engine has not inferred
    /// one yet.
    pub async fn update(&mut self, primary_key: &str) -> Result<()> {
        let info: IndexInfo = request(
            self.client.http(),
            &self.url(""),
            self.client.api_key(),
            Method::Put(UpdateIndexBody { primary_key }),
            StatusCode::OK,
        )
        .await?;

        self.primary_key = info.primary_key;
        Ok(())
    }

    /// Delete the index and everything in it.
    pub async fn delete(self) -> Result<()> {
        request::<(), ()>(
            self.client.http(),
            &self.url(""),
            self.client.api_key(),
            Method::Delete,
            StatusCode::NO_CONTENT,
        )
        .await
    }

    /// Fetch document count and indexing state.
    pub async fn stats(&self) -> Result<IndexStats> {
        self.get("/stats").await
    }

    // -- documents ----------------------------------------------------------

    /// Fetch one document by its primary-key value.
    pub async fn get_document<T: DeserializeOwned>(&self, uid: impl Display) -> Result<T> {
        self.get(&format!("/documents/{uid}")).await
    }

    /// Browse documents in storage order.
    pub async fn get_documents<T: DeserializeOwned>(
        &self,
        offset: Option<usize>,
        limit: Option<usize>,
        attributes_to_retrieve: Option<&str>,
    ) -> Result<Vec<T>> {
        let mut pairs = url::form_urlencoded::Serializer::new(String::new());
        if let Some(offset) = offset {
            pairs.append_pair("offset", &offset.to_string());
        }
        if let Some(limit) = limit {
            pairs.append_pair("limit", &limit.to_string());
        }
        if let Some(attributes) = attributes_to_retrieve {
            pairs.append_pair("attributesToRetrieve", attributes);
        }
        let qs = pairs.finish();

        let path = if qs.is_empty() {
            "/documents".to_string()
        } else {
            format!("/documents?{qs}")
        };
        self.get(&path).await
    }

    /// Add documents, replacing any existing document with the same
    /// primary-key value wholesale.
    #[instrument(skip_all, fields(index = %self.uid, count = documents.len()))]
    pub async fn add_or_replace<T: Serialize>(
        &self,
        documents: &[T],
        primary_key: Option<&str>,
    ) -> Result<Update> {
        self.enqueue(&documents_path(primary_key), Method::Post(documents))
            .await
    }

    /// Add documents, merging fields into any existing document with the
    /// same primary-key value.
    #[instrument(skip_all, fields(index = %self.uid, count = documents.len()))]
    pub async fn add_or_update<T: Serialize>(
        &self,
        documents: &[T],
        primary_key: Option<&str>,
    ) -> Result<Update> {
        self.enqueue(&documents_path(primary_key), Method::Put(documents))
            .await
    }

    /// Delete one document by its primary-key value.
    pub async fn delete_document(&self, uid: impl Display) -> Result<Update> {
        self.enqueue::<()>(&format!("/documents/{uid}"), Method::Delete)
            .await
    }

    /// Delete a batch of documents by primary-key value.
    pub async fn delete_documents<U: Serialize>(&self, uids: &[U]) -> Result<Update> {
        self.enqueue("/documents/delete-batch", Method::Post(uids))
            .await
    }

    /// Delete every document, keeping the index and its settings.
    pub async fn delete_all_documents(&self) -> Result<Update> {
        self.enqueue::<()>("/documents", Method::Delete).await
    }

    // -- search -------------------------------------------------------------

    /// Run a search query, deserializing hits into `T`.
    #[instrument(skip_all, fields(index = %self.uid, query = %query.query))]
    pub async fn search<T: DeserializeOwned>(&self, query: &Query<'_>) -> Result<SearchResults<T>> {
        let results: SearchResults<T> = self
            .get(&format!("/search?{}", query.to_query_string()?))
            .await?;

        debug!(
            hits = results.hits.len(),
            nb_hits = results.nb_hits,
            processing_time_ms = results.processing_time_ms,
            "search completed"
        );
        Ok(results)
    }

    // -- updates ------------------------------------------------------------

    /// Fetch the status of one update.
    pub async fn get_update(&self, update_id: u64) -> Result<UpdateStatus> {
        self.get(&format!("/updates/{update_id}")).await
    }

    /// Fetch the status of every known update, oldest first.
    pub async fn list_updates(&self) -> Result<Vec<UpdateStatus>> {
        self.get("/updates").await
    }

    /// Poll an update until it reaches a terminal status.
    ///
    /// A failed update is returned as `Ok(UpdateStatus::Failed { .. })`;
    /// only transport problems and the deadline produce an `Err`.
    #[instrument(skip_all, fields(index = %self.uid, update_id = update_id))]
    pub async fn wait_for_update(
        &self,
        update_id: u64,
        opts: &WaitOptions,
    ) -> Result<UpdateStatus> {
        let deadline = tokio::time::Instant::now() + opts.timeout;

        loop {
            let status = self.get_update(update_id).await?;
            if status.is_terminal() {
                return Ok(status);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Timeout {
                    update_id,
                    waited: opts.timeout,
                });
            }
            tokio::time::sleep(opts.interval).await;
        }
    }

    // -- settings -----------------------------------------------------------

    /// Fetch all settings of this index.
    pub async fn get_settings(&self) -> Result<Settings> {
        self.get("/settings").await
    }

    /// Apply a partial settings object. Only fields present in `settings`
    /// are touched.
    pub async fn set_settings(&self, settings: &Settings) -> Result<Update> {
        self.enqueue("/settings", Method::Post(settings)).await
    }

    /// Reset every setting to engine defaults.
    pub async fn reset_settings(&self) -> Result<Update> {
        self.enqueue::<()>("/settings", Method::Delete).await
    }

    pub async fn get_ranking_rules(&self) -> Result<Option<Vec<String>>> {
        self.get("/settings/ranking-rules").await
    }

    pub async fn set_ranking_rules(&self, rules: &[String]) -> Result<Update> {
        self.enqueue("/settings/ranking-rules", Method::Post(rules))
            .await
    }

    pub async fn reset_ranking_rules(&self) -> Result<Update> {
        self.enqueue::<()>("/settings/ranking-rules", Method::Delete)
            .await
    }

    pub async fn get_distinct_attribute(&self) -> Result<Option<String>> {
        self.get("/settings/distinct-attribute").await
    }

    pub async fn set_distinct_attribute(&self, attribute: &str) -> Result<Update> {
        self.enqueue("/settings/distinct-attribute", Method::Post(attribute))
            .await
    }

    pub async fn reset_distinct_attribute(&self) -> Result<Update> {
        self.enqueue::<()>("/settings/distinct-attribute", Method::Delete)
            .await
    }

    pub async fn get_searchable_attributes(&self) -> Result<Option<Vec<String>>> {
        self.get("/settings/searchable-attributes").await
    }

    pub async fn set_searchable_attributes(&self, attributes: &[String]) -> Result<Update> {
        self.enqueue("/settings/searchable-attributes", Method::Post(attributes))
            .await
    }

    pub async fn reset_searchable_attributes(&self) -> Result<Update> {
        self.enqueue::<()>("/settings/searchable-attributes", Method::Delete)
            .await
    }

    pub async fn get_displayed_attributes(&self) -> Result<Option<Vec<String>>> {
        self.get("/settings/displayed-attributes").await
    }

    pub async fn set_displayed_attributes(&self, attributes: &[String]) -> Result<Update> {
        self.enqueue("/settings/displayed-attributes", Method::Post(attributes))
            .await
    }

    pub async fn reset_displayed_attributes(&self) -> Result<Update> {
        self.enqueue::<()>("/settings/displayed-attributes", Method::Delete)
            .await
    }

    pub async fn get_stop_words(&self) -> Result<Option<Vec<String>>> {
        self.get("/settings/stop-words").await
    }

    pub async fn set_stop_words(&self, words: &[String]) -> Result<Update> {
        self.enqueue("/settings/stop-words", Method::Post(words))
            .await
    }

    pub async fn reset_stop_words(&self) -> Result<Update> {
        self.enqueue::<()>("/settings/stop-words", Method::Delete)
            .await
    }

    pub async fn get_synonyms(&self) -> Result<Option<HashMap<String, Vec<String>>>> {
        self.get("/settings/synonyms").await
    }

    pub async fn set_synonyms(&self, synonyms: &HashMap<String, Vec<String>>) -> Result<Update> {
        self.enqueue("/settings/synonyms", Method::Post(synonyms))
            .await
    }

    pub async fn reset_synonyms(&self) -> Result<Update> {
        self.enqueue::<()>("/settings/synonyms", Method::Delete)
            .await
    }
}

/// Documents endpoint path, with the optional `primaryKey` declaration.
fn documents_path(primary_key: Option<&str>) -> String {
    match primary_key {
        Some(key) => {
            let mut pairs = url::form_urlencoded::Serializer::new(String::new());
            pairs.append_pair("primaryKey", key);
            format!("/documents?{}", pairs.finish())
        }
        None => "/documents".to_string(),
    }
}
