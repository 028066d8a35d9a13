//! Watcher framework for polwatch.
//!
//! A watcher sweeps a source of monitored resources and slurps each one's
//! current configuration document. Sweeps are resilient by construction: a
//! failure at one location is recorded in an exception map and the sweep
//! moves on, so one unreadable resource never hides the rest. The reporter
//! reconciles slurped snapshots against the revision store, recording a new
//! revision whenever a configuration actually changed.

pub mod directory;
pub mod exceptions;
pub mod ignore;
pub mod reporter;
pub mod watcher;

pub use directory::DirectoryWatcher;
pub use exceptions::{ExceptionMap, Location, WatchError, record_exception};
pub use ignore::IgnoreList;
pub use reporter::{SweepSummary, run_sweep};
pub use watcher::{ItemSnapshot, Watcher};
