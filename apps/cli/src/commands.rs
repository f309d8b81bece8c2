//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use lumen_client::{Client, Query, UpdateStatus, WaitOptions};
use tracing::info;

use crate::config::{self, AppConfig};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Lumen — command-line client for the Lumen search engine.
#[derive(Parser)]
#[command(
    name = "lumen",
    version,
    about = "Manage indexes, documents, and searches on a Lumen server.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Server base URL (overrides LUMEN_HOST and the config file).
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// API key (overrides the env var named in the config file).
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Check whether the server is up and accepting requests.
    Health,

    /// Print server build and version information.
    Version,

    /// Print server-wide statistics.
    Stats,

    /// Index management.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Document operations.
    Documents {
        #[command(subcommand)]
        action: DocumentsAction,
    },

    /// Search an index.
    Search {
        /// Index uid to search.
        #[arg(short, long)]
        index: String,

        /// Query text.
        query: String,

        /// Maximum number of hits (defaults from config).
        #[arg(long)]
        limit: Option<usize>,

        /// Number of hits to skip.
        #[arg(long)]
        offset: Option<usize>,

        /// Attribute filter expression, e.g. 'year > 2000'.
        #[arg(long)]
        filters: Option<String>,

        /// Request facet counts for all facets.
        #[arg(long)]
        facets: bool,
    },

    /// Index settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Index subcommands.
#[derive(Subcommand)]
pub(crate) enum IndexAction {
    /// List all indexes.
    List,

    /// Create an index.
    Create {
        /// Index uid.
        uid: String,

        /// Primary key attribute (inferred from documents if omitted).
        #[arg(long)]
        primary_key: Option<String>,
    },

    /// Show one index, with stats.
    Show {
        /// Index uid.
        uid: String,
    },

    /// Delete an index and everything in it.
    Delete {
        /// Index uid.
        uid: String,
    },
}

/// Documents subcommands.
#[derive(Subcommand)]
pub(crate) enum DocumentsAction {
    /// Add documents from a JSON file (an array of objects).
    Add {
        /// Index uid.
        #[arg(short, long)]
        index: String,

        /// Path to a JSON file containing an array of documents.
        file: PathBuf,

        /// Primary key attribute (inferred if omitted).
        #[arg(long)]
        primary_key: Option<String>,

        /// Merge into existing documents instead of replacing them.
        #[arg(long)]
        partial: bool,

        /// Return immediately instead of waiting for the update to process.
        #[arg(long)]
        no_wait: bool,
    },

    /// Fetch documents (all, or one by id).
    Get {
        /// Index uid.
        #[arg(short, long)]
        index: String,

        /// Fetch a single document by primary-key value.
        #[arg(long)]
        id: Option<String>,

        /// Number of documents to skip.
        #[arg(long)]
        offset: Option<usize>,

        /// Maximum number of documents (defaults from config).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Delete documents (by id, or all of them).
    Delete {
        /// Index uid.
        #[arg(short, long)]
        index: String,

        /// Primary-key values to delete (repeatable).
        #[arg(long)]
        id: Vec<String>,

        /// Delete every document in the index.
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
}

/// Settings subcommands.
#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Print the index settings as JSON.
    Show {
        /// Index uid.
        uid: String,
    },

    /// Reset every setting to engine defaults.
    Reset {
        /// Index uid.
        uid: String,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "lumen=info",
        1 => "lumen=debug",
        _ => "lumen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config()?;

    // Config subcommands don't need a server.
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&cli, &config),
        };
    }

    let client = connect(&cli, &config)?;

    match cli.command {
        Command::Health => cmd_health(&client).await,
        Command::Version => cmd_version(&client).await,
        Command::Stats => cmd_stats(&client).await,
        Command::Index { action } => match action {
            IndexAction::List => cmd_index_list(&client).await,
            IndexAction::Create { uid, primary_key } => {
                cmd_index_create(&client, &uid, primary_key.as_deref()).await
            }
            IndexAction::Show { uid } => cmd_index_show(&client, &uid).await,
            IndexAction::Delete { uid } => cmd_index_delete(&client, &uid).await,
        },
        Command::Documents { action } => match action {
            DocumentsAction::Add {
                index,
                file,
                primary_key,
                partial,
                no_wait,
            } => {
                cmd_documents_add(
                    &client,
                    &config,
                    &index,
                    &file,
                    primary_key.as_deref(),
                    partial,
                    no_wait,
                )
                .await
            }
            DocumentsAction::Get {
                index,
                id,
                offset,
                limit,
            } => cmd_documents_get(&client, &config, &index, id.as_deref(), offset, limit).await,
            DocumentsAction::Delete { index, id, all } => {
                cmd_documents_delete(&client, &config, &index, &id, all).await
            }
        },
        Command::Search {
            index,
            query,
            limit,
            offset,
            filters,
            facets,
        } => {
            cmd_search(
                &client,
                &config,
                &index,
                &query,
                limit,
                offset,
                filters.as_deref(),
                facets,
            )
            .await
        }
        Command::Settings { action } => match action {
            SettingsAction::Show { uid } => cmd_settings_show(&client, &uid).await,
            SettingsAction::Reset { uid } => cmd_settings_reset(&client, &config, &uid).await,
        },
        Command::Config { .. } => unreachable!("handled above"),
    }
}

/// Build a client from the resolved connection settings.
fn connect(cli: &Cli, config: &AppConfig) -> Result<Client> {
    let host = config::resolve_host(cli.host.as_deref(), config);
    let api_key = config::resolve_api_key(cli.api_key.as_deref(), config);

    info!(%host, secured = api_key.is_some(), "connecting");
    Ok(Client::new(host, api_key.as_deref())?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_health(client: &Client) -> Result<()> {
    let health = client.health().await?;
    println!("status: {}", health.status);
    Ok(())
}

async fn cmd_version(client: &Client) -> Result<()> {
    let version = client.version().await?;
    println!("version: {}", version.pkg_version);
    println!("commit:  {}", version.commit_sha);
    println!("built:   {}", version.build_date);
    Ok(())
}

async fn cmd_stats(client: &Client) -> Result<()> {
    let stats = client.stats().await?;
    println!("database size: {} bytes", stats.database_size);
    match stats.last_update {
        Some(at) => println!("last update:   {at}"),
        None => println!("last update:   never"),
    }
    println!("indexes:       {}", stats.indexes.len());
    for (uid, index_stats) in &stats.indexes {
        println!(
            "  {uid}: {} documents{}",
            index_stats.number_of_documents,
            if index_stats.is_indexing {
                " (indexing)"
            } else {
                ""
            }
        );
    }
    Ok(())
}

async fn cmd_index_list(client: &Client) -> Result<()> {
    let indexes = client.list_indexes().await?;
    if indexes.is_empty() {
        println!("no indexes");
        return Ok(());
    }
    for index in indexes {
        match &index.primary_key {
            Some(key) => println!("{} (primary key: {key})", index.uid),
            None => println!("{}", index.uid),
        }
    }
    Ok(())
}

async fn cmd_index_create(client: &Client, uid: &str, primary_key: Option<&str>) -> Result<()> {
    let index = client.create_index(uid, primary_key).await?;
    println!("created index '{}'", index.uid);
    Ok(())
}

async fn cmd_index_show(client: &Client, uid: &str) -> Result<()> {
    let index = client.get_index(uid).await?;
    let stats = index.stats().await?;

    println!("uid:         {}", index.uid);
    println!(
        "primary key: {}",
        index.primary_key.as_deref().unwrap_or("(not set)")
    );
    println!("documents:   {}", stats.number_of_documents);
    println!("indexing:    {}", stats.is_indexing);
    if !stats.fields_distribution.is_empty() {
        println!("fields:");
        for (field, count) in &stats.fields_distribution {
            println!("  {field}: {count}");
        }
    }
    Ok(())
}

async fn cmd_index_delete(client: &Client, uid: &str) -> Result<()> {
    client.get_index(uid).await?.delete().await?;
    println!("deleted index '{uid}'");
    Ok(())
}

async fn cmd_documents_add(
    client: &Client,
    config: &AppConfig,
    index_uid: &str,
    file: &Path,
    primary_key: Option<&str>,
    partial: bool,
    no_wait: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read {}: {e}", file.display()))?;
    let documents: Vec<serde_json::Value> = serde_json::from_str(&content)
        .map_err(|e| eyre!("{} is not a JSON array of documents: {e}", file.display()))?;

    info!(
        index = index_uid,
        count = documents.len(),
        partial,
        "adding documents"
    );

    let index = client.index(index_uid);
    let update = if partial {
        index.add_or_update(&documents, primary_key).await?
    } else {
        index.add_or_replace(&documents, primary_key).await?
    };

    println!(
        "enqueued update {} ({} documents)",
        update.update_id,
        documents.len()
    );

    if no_wait {
        return Ok(());
    }

    let spinner = spinner(format!("waiting for update {}", update.update_id));
    let opts = WaitOptions {
        timeout: Duration::from_secs(config.defaults.wait_timeout_secs),
        ..WaitOptions::default()
    };
    let status = index.wait_for_update(update.update_id, &opts).await;
    spinner.finish_and_clear();

    match status? {
        UpdateStatus::Processed { duration, .. } => {
            println!("update {} processed in {duration:.3}s", update.update_id);
            Ok(())
        }
        UpdateStatus::Failed { error, .. } => {
            Err(eyre!("update {} failed: {error}", update.update_id))
        }
        UpdateStatus::Enqueued { .. } => unreachable!("wait_for_update returns terminal statuses"),
    }
}

async fn cmd_documents_get(
    client: &Client,
    config: &AppConfig,
    index_uid: &str,
    id: Option<&str>,
    offset: Option<usize>,
    limit: Option<usize>,
) -> Result<()> {
    let index = client.index(index_uid);

    let json = match id {
        Some(id) => {
            let doc: serde_json::Value = index.get_document(id).await?;
            serde_json::to_string_pretty(&doc)?
        }
        None => {
            let limit = Some(limit.unwrap_or(config.defaults.search_limit));
            let docs: Vec<serde_json::Value> = index.get_documents(offset, limit, None).await?;
            serde_json::to_string_pretty(&docs)?
        }
    };

    println!("{json}");
    Ok(())
}

async fn cmd_documents_delete(
    client: &Client,
    config: &AppConfig,
    index_uid: &str,
    ids: &[String],
    all: bool,
) -> Result<()> {
    if !all && ids.is_empty() {
        return Err(eyre!("pass --id at least once, or --all"));
    }

    let index = client.index(index_uid);
    let update = if all {
        index.delete_all_documents().await?
    } else if ids.len() == 1 {
        index.delete_document(&ids[0]).await?
    } else {
        index.delete_documents(ids).await?
    };

    let opts = WaitOptions {
        timeout: Duration::from_secs(config.defaults.wait_timeout_secs),
        ..WaitOptions::default()
    };
    let status = index.wait_for_update(update.update_id, &opts).await?;

    match status {
        UpdateStatus::Failed { error, .. } => {
            Err(eyre!("update {} failed: {error}", update.update_id))
        }
        _ => {
            println!("deleted (update {})", update.update_id);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_search(
    client: &Client,
    config: &AppConfig,
    index_uid: &str,
    query_text: &str,
    limit: Option<usize>,
    offset: Option<usize>,
    filters: Option<&str>,
    facets: bool,
) -> Result<()> {
    let index = client.index(index_uid);

    let mut query =
        Query::new(query_text).with_limit(limit.unwrap_or(config.defaults.search_limit));
    if let Some(offset) = offset {
        query = query.with_offset(offset);
    }
    if let Some(filters) = filters {
        query = query.with_filters(filters);
    }
    if facets {
        query = query.with_facets_distribution(None);
    }

    let results = index.search::<serde_json::Value>(&query).await?;

    println!(
        "{} hits ({}) in {}ms",
        results.nb_hits,
        if results.exhaustive_nb_hits {
            "exact"
        } else {
            "approximate"
        },
        results.processing_time_ms
    );
    println!("{}", serde_json::to_string_pretty(&results.hits)?);

    if let Some(facets) = &results.facets_distribution {
        println!("facets:");
        for (facet, values) in facets {
            let mut counts: Vec<_> = values.iter().collect();
            counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            let rendered: Vec<String> = counts.iter().map(|(v, n)| format!("{v} ({n})")).collect();
            println!("  {facet}: {}", rendered.join(", "));
        }
    }

    Ok(())
}

async fn cmd_settings_show(client: &Client, uid: &str) -> Result<()> {
    let settings = client.index(uid).get_settings().await?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

async fn cmd_settings_reset(client: &Client, config: &AppConfig, uid: &str) -> Result<()> {
    let index = client.index(uid);
    let update = index.reset_settings().await?;

    let opts = WaitOptions {
        timeout: Duration::from_secs(config.defaults.wait_timeout_secs),
        ..WaitOptions::default()
    };
    index.wait_for_update(update.update_id, &opts).await?;
    println!("settings reset (update {})", update.update_id);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = config::init_config()?;
    println!("wrote {}", path.display());
    Ok(())
}

fn cmd_config_show(cli: &Cli, config: &AppConfig) -> Result<()> {
    let host = config::resolve_host(cli.host.as_deref(), config);
    let api_key = config::resolve_api_key(cli.api_key.as_deref(), config);

    println!("host:        {host}");
    println!(
        "api key:     {}",
        if api_key.is_some() { "set" } else { "not set" }
    );
    println!("api key env: {}", config.connection.api_key_env);
    println!("defaults:");
    println!("  search limit:     {}", config.defaults.search_limit);
    println!("  wait timeout (s): {}", config.defaults.wait_timeout_secs);
    Ok(())
}

// ---------------------------------------------------------------------------
// Spinner
// ---------------------------------------------------------------------------

/// A steady-tick spinner for long-running waits.
fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message);
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_flags_parse() {
        let cli = Cli::parse_from([
            "lumen", "search", "--index", "movies", "space", "--limit", "5", "--facets",
        ]);
        match cli.command {
            Command::Search {
                index,
                query,
                limit,
                facets,
                ..
            } => {
                assert_eq!(index, "movies");
                assert_eq!(query, "space");
                assert_eq!(limit, Some(5));
                assert!(facets);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn documents_delete_all_conflicts_with_id() {
        let result = Cli::try_parse_from([
            "lumen",
            "documents",
            "delete",
            "--index",
            "movies",
            "--id",
            "1",
            "--all",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_host_flag_parses_anywhere() {
        let cli = Cli::parse_from(["lumen", "health", "--host", "http://other:7700"]);
        assert_eq!(cli.host.as_deref(), Some("http://other:7700"));
    }
}
