// Process configuration (§6 "Environment", SPEC_FULL §4.8): a layered
// `SchedulerConfig` read from an optional YAML file (the same format the
// declarative job seed file uses) and overridden by environment variables,
// the way the teacher's `auth/config.rs` loads its own settings from
// `env::var` with `dotenvy` populating the process environment first. The
// SMTP password is the one value read from the environment only, never the
// file, per spec.md §6.

use std::path::PathBuf;

use anyhow::{Context, Result};
use scheduler_dispatcher::{DispatcherConfig, EmailConfig};
use serde::Deserialize;

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("./scheduler-work")
}

fn default_true() -> bool {
    true
}

fn default_periodic_sync_seconds() -> u64 {
    60
}

fn default_smtp_port() -> u16 {
    587
}

/// On-disk shape of the YAML configuration file. Every field has a default
/// so an empty or absent file still produces a usable config driven
/// entirely by environment variables.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileConfig {
    pub bind_address: Option<String>,
    pub database_url: Option<String>,
    pub work_dir: Option<PathBuf>,
    pub declarative_seed_path: Option<PathBuf>,
    pub python_wrapper_path: Option<PathBuf>,
    pub periodic_sync_enabled: Option<bool>,
    pub periodic_sync_interval_seconds: Option<u64>,
    pub delete_orphaned_jobs_on_sync: Option<bool>,
    pub smtp_sender_account: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
}

/// The process's fully-resolved configuration, after the file has been read
/// and every field has had a chance to be overridden by an environment
/// variable of the same name, upper-cased with a `SCHEDULER_` prefix.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub bind_address: String,
    pub database_url: String,
    pub work_dir: PathBuf,
    pub declarative_seed_path: Option<PathBuf>,
    pub python_wrapper_path: PathBuf,
    pub periodic_sync_enabled: bool,
    pub periodic_sync_interval_seconds: u64,
    pub delete_orphaned_jobs_on_sync: bool,
    pub email: EmailConfig,
}

impl SchedulerConfig {
    /// Loads `dotenvy`, then an optional file at `path` (missing file is not
    /// an error -- env vars alone can drive the whole process), then
    /// applies environment overrides. `DATABASE_URL` is required; the SMTP
    /// password is only required if an email task ever actually dispatches
    /// (the dispatcher, not this loader, enforces that).
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let file: FileConfig = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("reading config file {}", p.display()))?;
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", p.display()))?
            }
            _ => FileConfig::default(),
        };

        let database_url = env_override("DATABASE_URL")
            .or(file.database_url)
            .context("DATABASE_URL must be set (environment or config file)")?;

        Ok(SchedulerConfig {
            bind_address: env_override("SCHEDULER_BIND_ADDRESS")
                .or(file.bind_address)
                .unwrap_or_else(default_bind_address),
            database_url,
            work_dir: env_override("SCHEDULER_WORK_DIR")
                .map(PathBuf::from)
                .or(file.work_dir)
                .unwrap_or_else(default_work_dir),
            declarative_seed_path: env_override("SCHEDULER_SEED_PATH")
                .map(PathBuf::from)
                .or(file.declarative_seed_path),
            python_wrapper_path: env_override("SCHEDULER_PYTHON_WRAPPER_PATH")
                .map(PathBuf::from)
                .or(file.python_wrapper_path)
                .unwrap_or_else(|| PathBuf::from("scheduler-python-wrapper")),
            periodic_sync_enabled: env_bool("SCHEDULER_PERIODIC_SYNC_ENABLED")
                .or(file.periodic_sync_enabled)
                .unwrap_or_else(default_true),
            periodic_sync_interval_seconds: env_override("SCHEDULER_PERIODIC_SYNC_SECONDS")
                .and_then(|v| v.parse().ok())
                .or(file.periodic_sync_interval_seconds)
                .unwrap_or_else(default_periodic_sync_seconds),
            delete_orphaned_jobs_on_sync: env_bool("SCHEDULER_DELETE_ORPHANED_JOBS")
                .or(file.delete_orphaned_jobs_on_sync)
                .unwrap_or_else(default_true),
            email: EmailConfig {
                sender_account: env_override("SCHEDULER_SMTP_SENDER")
                    .or(file.smtp_sender_account)
                    .unwrap_or_default(),
                smtp_host: env_override("SCHEDULER_SMTP_HOST")
                    .or(file.smtp_host)
                    .unwrap_or_default(),
                smtp_port: env_override("SCHEDULER_SMTP_PORT")
                    .and_then(|v| v.parse().ok())
                    .or(file.smtp_port)
                    .unwrap_or_else(default_smtp_port),
                // Fatal only at send time if an email task actually needs it
                // (spec.md §6 "Environment"), not at startup.
                smtp_password: std::env::var("SCHEDULER_SMTP_PASSWORD").ok(),
            },
        })
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            work_dir: self.work_dir.clone(),
            python_wrapper_path: self.python_wrapper_path.clone(),
            email: self.email.clone(),
        }
    }
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    env_override(key).and_then(|v| match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}
