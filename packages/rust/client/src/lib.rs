//! Rust client for the [Lumen](https://lumen.dev) search engine.
//!
//! Lumen is an HTTP JSON search service: indexes hold schemaless documents,
//! write operations enqueue asynchronous *updates*, and search is a typed
//! query over one index. This crate wraps that API:
//!
//! - [`Client`] — connection, index management, health/version/stats/keys
//! - [`Index`] — documents, search, settings, update tracking
//! - [`Query`] / [`SearchResults`] — search parameters and typed hits
//! - [`Settings`] — index tuning (ranking rules, synonyms, stop words, …)
//! - [`Error`] — structured engine errors with machine-readable codes
//!
//! # Example
//!
//! ```no_run
//! use lumen_client::{Client, Query, WaitOptions};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Movie {
//!     id: u64,
//!     title: String,
//! }
//!
//! # async fn run() -> lumen_client::Result<()> {
//! let client = Client::new("http://localhost:7700", None)?;
//! let index = client.get_or_create("movies").await?;
//!
//! let update = index
//!     .add_or_replace(
//!         &[Movie { id: 1, title: "Interstellar".into() }],
//!         Some("id"),
//!     )
//!     .await?;
//! index.wait_for_update(update.update_id, &WaitOptions::default()).await?;
//!
//! let results = index
//!     .search::<Movie>(&Query::new("interstellar").with_limit(5))
//!     .await?;
//! println!("{} hits", results.nb_hits);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod errors;
pub mod indexes;
pub mod search;
pub mod settings;
pub mod updates;

mod request;

// Re-export public API at crate root for ergonomic imports.
pub use client::{Client, ClientBuilder, ClientStats, Health, Keys, Version};
pub use errors::{Error, ErrorCode, Result};
pub use indexes::{Index, IndexInfo, IndexStats};
pub use search::{Query, SearchResults};
pub use settings::Settings;
pub use updates::{Update, UpdateStatus, UpdateType, WaitOptions};
