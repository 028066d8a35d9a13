//! A watcher that slurps policy documents from a directory tree.
//!
//! Layout: `<root>/<account>/<region>/<name>.json`, one file per monitored
//! item. Deployments that export cloud inventories to disk (or sync them
//! with an external collector) point polwatch at the export root.

use std::{
  fs, io,
  path::{Path, PathBuf},
};

use crate::{
  exceptions::{ExceptionMap, Location, WatchError, record_exception},
  ignore::IgnoreList,
  watcher::{ItemSnapshot, Watcher},
};

pub struct DirectoryWatcher {
  root:       PathBuf,
  technology: String,
  ignore:     IgnoreList,
}

impl DirectoryWatcher {
  pub fn new(
    root: impl Into<PathBuf>,
    technology: impl Into<String>,
    ignore: IgnoreList,
  ) -> Self {
    Self { root: root.into(), technology: technology.into(), ignore }
  }

  fn location(&self, account: &str, region: &str) -> Location {
    Location::universal(&self.technology, account, region)
  }

  fn slurp_region(
    &self,
    account: &str,
    region: &str,
    dir: &Path,
    items: &mut Vec<ItemSnapshot>,
    exceptions: &mut ExceptionMap,
  ) {
    tracing::debug!(
      technology = %self.technology,
      account,
      region,
      "slurping {}",
      self.plural(),
    );

    let files = match sorted_entries(dir, EntryKind::JsonFile) {
      Ok(files) => files,
      Err(err) => {
        record_exception(
          exceptions,
          self.location(account, region),
          WatchError::Unreadable(err.to_string()),
        );
        return;
      }
    };

    for (name, path) in files {
      if self.ignore.matches(&name) {
        tracing::debug!(account, region, item = %name, "on ignore list, skipping");
        continue;
      }

      let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
          record_exception(
            exceptions,
            Location::named(&self.technology, account, region, &name),
            WatchError::Unreadable(err.to_string()),
          );
          continue;
        }
      };

      match serde_json::from_str(&raw) {
        Ok(config) => items.push(ItemSnapshot {
          technology: self.technology.clone(),
          account:    account.to_string(),
          region:     region.to_string(),
          name,
          config,
        }),
        Err(err) => record_exception(
          exceptions,
          Location::named(&self.technology, account, region, &name),
          WatchError::InvalidJson(err.to_string()),
        ),
      }
    }
  }
}

impl Watcher for DirectoryWatcher {
  fn index(&self) -> &str { &self.technology }

  fn singular(&self) -> &str { "policy document" }

  fn plural(&self) -> &str { "policy documents" }

  fn slurp(&self) -> (Vec<ItemSnapshot>, ExceptionMap) {
    let mut items = Vec::new();
    let mut exceptions = ExceptionMap::new();

    let accounts = match sorted_entries(&self.root, EntryKind::Directory) {
      Ok(accounts) => accounts,
      Err(err) => {
        record_exception(
          &mut exceptions,
          self.location("universal", "universal"),
          WatchError::Unreadable(err.to_string()),
        );
        return (items, exceptions);
      }
    };

    for (account, account_dir) in accounts {
      let regions = match sorted_entries(&account_dir, EntryKind::Directory) {
        Ok(regions) => regions,
        Err(err) => {
          record_exception(
            &mut exceptions,
            self.location(&account, "universal"),
            WatchError::Unreadable(err.to_string()),
          );
          continue;
        }
      };

      for (region, region_dir) in regions {
        self.slurp_region(
          &account,
          &region,
          &region_dir,
          &mut items,
          &mut exceptions,
        );
      }
    }

    (items, exceptions)
  }
}

// ─── Directory listing ───────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum EntryKind {
  Directory,
  JsonFile,
}

/// List a directory's entries of the requested kind, sorted by name so
/// sweeps are deterministic. For files, the returned name is the stem
/// without the `.json` extension.
fn sorted_entries(
  dir: &Path,
  kind: EntryKind,
) -> io::Result<Vec<(String, PathBuf)>> {
  let mut entries = Vec::new();
  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    let path = entry.path();
    let keep = match kind {
      EntryKind::Directory => path.is_dir(),
      EntryKind::JsonFile => {
        path.is_file()
          && path.extension().is_some_and(|extension| extension == "json")
      }
    };
    if !keep {
      continue;
    }
    let name = match kind {
      EntryKind::Directory => entry.file_name().to_string_lossy().into_owned(),
      EntryKind::JsonFile => match path.file_stem() {
        Some(stem) => stem.to_string_lossy().into_owned(),
        None => continue,
      },
    };
    entries.push((name, path));
  }
  entries.sort();
  Ok(entries)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::fs;

  use serde_json::json;

  use super::DirectoryWatcher;
  use crate::{
    exceptions::WatchError,
    ignore::IgnoreList,
    watcher::Watcher,
  };

  fn write(dir: &std::path::Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
  }

  #[test]
  fn slurps_every_account_and_region() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "prod/us-east-1/api-role.json", r#"{"Statement": []}"#);
    write(root.path(), "prod/us-west-2/api-role.json", r#"{"Statement": []}"#);
    write(root.path(), "staging/us-east-1/worker.json", r#"{"Statement": []}"#);

    let watcher =
      DirectoryWatcher::new(root.path(), "policy", IgnoreList::default());
    let (items, exceptions) = watcher.slurp();

    assert!(exceptions.is_empty());
    assert_eq!(items.len(), 3);
    // Deterministic ordering: accounts, then regions, then names.
    assert_eq!(items[0].account, "prod");
    assert_eq!(items[0].region, "us-east-1");
    assert_eq!(items[2].account, "staging");
    assert_eq!(items[2].name, "worker");
    assert_eq!(items[0].config, json!({"Statement": []}));
  }

  #[test]
  fn invalid_json_is_recorded_and_sweep_continues() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "prod/us-east-1/broken.json", "{not json");
    write(root.path(), "prod/us-east-1/healthy.json", r#"{"ok": true}"#);

    let watcher =
      DirectoryWatcher::new(root.path(), "policy", IgnoreList::default());
    let (items, exceptions) = watcher.slurp();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "healthy");

    assert_eq!(exceptions.len(), 1);
    let (location, error) = exceptions.iter().next().unwrap();
    assert_eq!(location.name.as_deref(), Some("broken"));
    assert!(matches!(error, WatchError::InvalidJson(_)));
  }

  #[test]
  fn ignored_names_are_skipped() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "prod/us-east-1/legacy-admin.json", r#"{}"#);
    write(root.path(), "prod/us-east-1/api-role.json", r#"{}"#);

    let ignore = IgnoreList::new(["legacy-".to_string()]);
    let watcher = DirectoryWatcher::new(root.path(), "policy", ignore);
    let (items, exceptions) = watcher.slurp();

    assert!(exceptions.is_empty());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "api-role");
  }

  #[test]
  fn missing_root_is_one_universal_exception() {
    let root = tempfile::tempdir().unwrap();
    let gone = root.path().join("nope");

    let watcher = DirectoryWatcher::new(gone, "policy", IgnoreList::default());
    let (items, exceptions) = watcher.slurp();

    assert!(items.is_empty());
    assert_eq!(exceptions.len(), 1);
    let location = exceptions.keys().next().unwrap();
    assert_eq!(location.account, "universal");
    assert!(location.name.is_none());
  }

  #[test]
  fn non_json_files_are_not_slurped() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "prod/us-east-1/readme.txt", "notes");
    write(root.path(), "prod/us-east-1/role.json", r#"{}"#);

    let watcher =
      DirectoryWatcher::new(root.path(), "policy", IgnoreList::default());
    let (items, exceptions) = watcher.slurp();

    assert!(exceptions.is_empty());
    assert_eq!(items.len(), 1);
  }
}
