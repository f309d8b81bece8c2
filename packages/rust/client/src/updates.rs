//! Asynchronous update tracking.
//!
//! Every write operation (documents, settings) is asynchronous on the engine
//! side: it enqueues an update and answers immediately with its id. Callers
//! that need confirmation poll the update until it reaches a terminal status,
//! usually through [`Index::wait_for_update`](crate::indexes::Index::wait_for_update).

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Acknowledgement returned by every write operation.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub update_id: u64,
}

/// What an update does, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name")]
pub enum UpdateType {
    DocumentsAddition {
        #[serde(default)]
        number: Option<u64>,
    },
    DocumentsPartial {
        #[serde(default)]
        number: Option<u64>,
    },
    DocumentsDeletion {
        #[serde(default)]
        number: Option<u64>,
    },
    ClearAll {},
    Settings {},
}

/// Lifecycle of an enqueued update.
///
/// `Failed` is a terminal status, not an `Err`: the request to *fetch* the
/// status succeeded, the update itself did not.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UpdateStatus {
    #[serde(rename_all = "camelCase")]
    Enqueued {
        update_id: u64,
        #[serde(rename = "type")]
        update_type: UpdateType,
        enqueued_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Processed {
        update_id: u64,
        #[serde(rename = "type")]
        update_type: UpdateType,
        /// Processing time in seconds.
        duration: f64,
        enqueued_at: DateTime<Utc>,
        processed_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        update_id: u64,
        #[serde(rename = "type")]
        update_type: UpdateType,
        error: String,
        enqueued_at: DateTime<Utc>,
        #[serde(default)]
        processed_at: Option<DateTime<Utc>>,
    },
}

impl UpdateStatus {
    /// The id shared by all statuses of one update.
    pub fn update_id(&self) -> u64 {
        match self {
            Self::Enqueued { update_id, .. }
            | Self::Processed { update_id, .. }
            | Self::Failed { update_id, .. } => *update_id,
        }
    }

    /// True once the engine will not change this status again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Enqueued { .. })
    }
}

/// Polling knobs for [`Index::wait_for_update`](crate::indexes::Index::wait_for_update).
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Delay between status polls.
    pub interval: Duration,
    /// Give up after this long. Exceeding it is [`Error::Timeout`](crate::errors::Error::Timeout).
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
            timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueued_status_decodes() {
        let status: UpdateStatus = serde_json::from_str(
            r#"{
                "status": "enqueued",
                "updateId": 3,
                "type": {"name": "DocumentsAddition", "number": 12},
                "enqueuedAt": "2024-03-01T10:00:00Z"
            }"#,
        )
        .expect("decode enqueued");

        assert_eq!(status.update_id(), 3);
        assert!(!status.is_terminal());
        match status {
            UpdateStatus::Enqueued { update_type, .. } => {
                assert_eq!(
                    update_type,
                    UpdateType::DocumentsAddition { number: Some(12) }
                );
            }
            other => panic!("expected Enqueued, got {other:?}"),
        }
    }

    #[test]
    fn processed_status_decodes() {
        let status: UpdateStatus = serde_json::from_str(
            r#"{
                "status": "processed",
                "updateId": 3,
                "type": {"name": "Settings"},
                "duration": 0.076980613,
                "enqueuedAt": "2024-03-01T10:00:00Z",
                "processedAt": "2024-03-01T10:00:01Z"
            }"#,
        )
        .expect("decode processed");

        assert!(status.is_terminal());
        match status {
            UpdateStatus::Processed { duration, .. } => assert!(duration > 0.0),
            other => panic!("expected Processed, got {other:?}"),
        }
    }

    #[test]
    fn failed_status_keeps_error_message() {
        let status: UpdateStatus = serde_json::from_str(
            r#"{
                "status": "failed",
                "updateId": 9,
                "type": {"name": "DocumentsAddition", "number": 1},
                "error": "document id is missing",
                "enqueuedAt": "2024-03-01T10:00:00Z"
            }"#,
        )
        .expect("decode failed");

        assert!(status.is_terminal());
        match status {
            UpdateStatus::Failed { error, .. } => assert!(error.contains("missing")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn clear_all_type_decodes_without_number() {
        let update_type: UpdateType =
            serde_json::from_str(r#"{"name": "ClearAll"}"#).expect("decode ClearAll");
        assert_eq!(update_type, UpdateType::ClearAll {});
    }
}
