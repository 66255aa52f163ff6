//! Configuration reconciler (C6): seeds job definitions from a declarative
//! file, reconciles the store against the live scheduling engine, and
//! watches the declarative file for changes that should trigger a
//! database-driven sync (never a blind file re-seed).

mod seed;
mod sync;
mod watch;

pub use seed::{seed_from_file, DeclarativeJob, SeedReport};
pub use sync::{ConfigReconciler, ReconcilerConfig, SyncReport};
pub use watch::start as start_watcher;
