// Declarative-file seeding (§4.6 "Seed"): a YAML sequence of job records is
// validated and written into the store. Invalid entries are logged and
// skipped; seeding continues with the rest of the file.

use std::path::Path;
use std::sync::Arc;

use scheduler_core::{JobDefinition, SchedulerError, SchedulerStore, TaskParameters, Trigger};
use serde::Deserialize;
use tracing::{error, info};

/// One record of the declarative seed file (§6 "Declarative file").
#[derive(Debug, Clone, Deserialize)]
pub struct DeclarativeJob {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    pub trigger: Trigger,
    pub task_parameters: TaskParameters,
    #[serde(default = "default_max_instances")]
    pub max_instances: u32,
    #[serde(default)]
    pub coalesce: bool,
    #[serde(default)]
    pub misfire_grace_time: Option<i64>,
    /// If an entry with this id already exists in the store, it is only
    /// overwritten when this is set; otherwise the existing row wins.
    #[serde(default)]
    pub replace_existing: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_instances() -> u32 {
    1
}

impl From<DeclarativeJob> for JobDefinition {
    fn from(record: DeclarativeJob) -> Self {
        JobDefinition {
            name: record.name.clone().unwrap_or_else(|| record.id.clone()),
            id: record.id,
            description: record.description,
            is_enabled: record.is_enabled,
            trigger: record.trigger,
            task_parameters: record.task_parameters,
            max_instances: record.max_instances,
            coalesce: record.coalesce,
            misfire_grace_time: record.misfire_grace_time,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub updated: usize,
    pub skipped_existing: usize,
    pub invalid: usize,
}

/// Reads `path` as a YAML sequence of [`DeclarativeJob`] records and applies
/// each to `store`. Never fails outright on a malformed individual record --
/// only an unreadable file or malformed top-level YAML structure is fatal.
pub async fn seed_from_file(store: &Arc<dyn SchedulerStore>, path: &Path) -> scheduler_core::Result<SeedReport> {
    info!(path = %path.display(), "seeding database from declarative file");
    let contents = std::fs::read_to_string(path)
        .map_err(|e| SchedulerError::validation(format!("could not read declarative file {}: {e}", path.display())))?;

    if contents.trim().is_empty() {
        info!("declarative file is empty, no jobs to seed");
        return Ok(SeedReport::default());
    }

    let records: Vec<DeclarativeJob> = serde_yaml::from_str(&contents)
        .map_err(|e| SchedulerError::validation(format!("malformed declarative file: {e}")))?;
    info!(count = records.len(), "found job records in declarative file");

    let mut report = SeedReport::default();
    for record in records {
        let id = record.id.clone();
        match apply_one(store, record).await {
            Ok(Outcome::Created) => {
                info!(job_id = %id, "created job from declarative file");
                report.created += 1;
            }
            Ok(Outcome::Updated) => {
                info!(job_id = %id, "updated job from declarative file");
                report.updated += 1;
            }
            Ok(Outcome::SkippedExisting) => {
                info!(job_id = %id, "skipped existing job (replace_existing not set)");
                report.skipped_existing += 1;
            }
            Err(e) => {
                error!(job_id = %id, error = %e, "rejecting job record from declarative file");
                report.invalid += 1;
            }
        }
    }
    Ok(report)
}

enum Outcome {
    Created,
    Updated,
    SkippedExisting,
}

async fn apply_one(store: &Arc<dyn SchedulerStore>, record: DeclarativeJob) -> scheduler_core::Result<Outcome> {
    let replace_existing = record.replace_existing;
    let def: JobDefinition = record.into();
    def.validate()?;

    match store.get_job(&def.id).await? {
        Some(_) if !replace_existing => Ok(Outcome::SkippedExisting),
        existing => {
            store.upsert_job(&def).await?;
            if existing.is_some() {
                Ok(Outcome::Updated)
            } else {
                Ok(Outcome::Created)
            }
        }
    }
}
