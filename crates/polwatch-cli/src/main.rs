//! polwatch binary.
//!
//! Reads `polwatch.toml` (or the path specified with `--config`), opens the
//! SQLite revision store, and runs watcher sweeps or renders stored
//! revisions.
//!
//! # Source layout
//!
//! The `watch` subcommand sweeps `<source_root>/<account>/<region>/*.json`,
//! one file per monitored item, and records a new revision for every item
//! whose configuration changed since the last sweep.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use polwatch_core::{revision::PolicyView, store::RevisionStore};
use polwatch_store_sqlite::SqliteStore;
use polwatch_transform::CanonicalTransformer;
use polwatch_watcher::{DirectoryWatcher, IgnoreList, run_sweep};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "polwatch configuration monitor")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "polwatch.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Sweep the configured source and record configuration changes.
  Watch {
    /// Override the configured source root.
    #[arg(long)]
    source: Option<PathBuf>,
  },
  /// List monitored items.
  Items {
    /// Restrict to one watcher technology.
    #[arg(long)]
    technology: Option<String>,
  },
  /// List the revisions recorded for an item, newest first.
  Revisions {
    #[arg(long)]
    item: Uuid,
  },
  /// Render a revision's policy document.
  Show {
    #[arg(long)]
    revision: Uuid,

    /// Render the expanded view instead of the raw document.
    #[arg(long, conflicts_with = "minimized")]
    expanded: bool,

    /// Render the minimized view with this minimum-character threshold.
    #[arg(long, value_name = "MIN_CHARS")]
    minimized: Option<u32>,
  },
}

/// Runtime configuration, deserialised from `polwatch.toml` with
/// `POLWATCH_`-prefixed environment overrides.
#[derive(Deserialize, Clone)]
struct AppConfig {
  #[serde(default = "default_store_path")]
  store_path:  PathBuf,
  #[serde(default = "default_source_root")]
  source_root: PathBuf,
  #[serde(default = "default_technology")]
  technology:  String,
  /// Item-name prefixes watchers should skip.
  #[serde(default)]
  ignore:      Vec<String>,
}

fn default_store_path() -> PathBuf { PathBuf::from("polwatch.db") }
fn default_source_root() -> PathBuf { PathBuf::from("sources") }
fn default_technology() -> String { "policy".to_string() }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("POLWATCH"))
    .build()
    .context("failed to read config file")?;

  let app_cfg: AppConfig = settings
    .try_deserialize()
    .context("failed to deserialise AppConfig")?;

  // Open the revision store.
  let store_path = expand_tilde(&app_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::debug!(path = %store_path.display(), "opened revision store");

  match cli.command {
    Command::Watch { source } => {
      let root =
        expand_tilde(&source.unwrap_or_else(|| app_cfg.source_root.clone()));
      tracing::info!(root = %root.display(), "sweeping source");

      let watcher = DirectoryWatcher::new(
        root,
        app_cfg.technology.clone(),
        IgnoreList::new(app_cfg.ignore.clone()),
      );
      let summary = run_sweep(&store, &watcher).await?;
      println!(
        "swept {} items: {} new, {} changed, {} unchanged, {} exceptions",
        summary.seen,
        summary.created,
        summary.changed,
        summary.unchanged,
        summary.exceptions,
      );
    }

    Command::Items { technology } => {
      for item in store.list_items(technology.as_deref()).await? {
        println!(
          "{}  {}/{}/{}/{}",
          item.item_id, item.technology, item.account, item.region, item.name,
        );
      }
    }

    Command::Revisions { item } => {
      for revision in store.list_revisions(item).await? {
        println!(
          "{}  {}  {:<8}  {} comment(s)",
          revision.revision_id,
          revision.date_created.to_rfc3339(),
          if revision.active { "active" } else { "inactive" },
          revision.comments.len(),
        );
      }
    }

    Command::Show { revision, expanded, minimized } => {
      let mut rev = store
        .get_revision(revision)
        .await?
        .with_context(|| format!("no revision {revision}"))?;

      if expanded {
        print_view("expanded", rev.expanded(&CanonicalTransformer));
      } else if let Some(min_chars) = minimized {
        print_view(
          "minimized",
          rev.minimized(&CanonicalTransformer, min_chars),
        );
      } else {
        println!("{}", rev.raw_rendered());
      }
    }
  }

  Ok(())
}

fn print_view(kind: &str, view: PolicyView<'_>) {
  match view {
    PolicyView::Rendered(text) => println!("{text}"),
    PolicyView::Unavailable => {
      println!("(could not derive the {kind} view for this policy)");
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
