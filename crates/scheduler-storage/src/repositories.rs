// Repository layer: `Database` wraps a `PgPool` and implements
// `scheduler_core::SchedulerStore` against it, following the teacher's
// `Database`-struct-over-`PgPool` pattern (one struct, one method per
// store operation, `query_as` with explicit columns and `RETURNING`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scheduler_core::{
    ExecutionLog, JobDefinition, LogFilters, LogStatus, Pagination, Result as SchedulerResult,
    RunStatus, SchedulerError, SchedulerStore, StoredEntry, Workflow, WorkflowRun,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{
    assemble_workflow, job_type_as_str, log_status_as_str, on_failure_as_str, run_status_as_str,
    ExecutionLogRow, JobRow, StoredEntryRow, WorkflowRow, WorkflowRunRow, WorkflowStepRow,
};

fn store_err(e: sqlx::Error) -> SchedulerError {
    SchedulerError::store(e.to_string())
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Database { pool }
    }

    pub async fn from_url(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Database { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SchedulerStore for Database {
    async fn get_job(&self, id: &str) -> SchedulerResult<Option<JobDefinition>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, name, description, is_enabled, trigger, task_parameters,
                   max_instances, coalesce, misfire_grace_time
            FROM job_definitions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(JobDefinition::from))
    }

    async fn list_jobs(&self, paging: Pagination) -> SchedulerResult<Vec<JobDefinition>> {
        let limit = if paging.limit <= 0 { i64::MAX } else { paging.limit };
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, name, description, is_enabled, trigger, task_parameters,
                   max_instances, coalesce, misfire_grace_time
            FROM job_definitions
            ORDER BY id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(paging.skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.into_iter().map(JobDefinition::from).collect())
    }

    async fn upsert_job(&self, def: &JobDefinition) -> SchedulerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO job_definitions
                (id, name, description, is_enabled, trigger, task_parameters,
                 max_instances, coalesce, misfire_grace_time, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                is_enabled = EXCLUDED.is_enabled,
                trigger = EXCLUDED.trigger,
                task_parameters = EXCLUDED.task_parameters,
                max_instances = EXCLUDED.max_instances,
                coalesce = EXCLUDED.coalesce,
                misfire_grace_time = EXCLUDED.misfire_grace_time,
                updated_at = NOW()
            "#,
        )
        .bind(&def.id)
        .bind(&def.name)
        .bind(&def.description)
        .bind(def.is_enabled)
        .bind(sqlx::types::Json(&def.trigger))
        .bind(sqlx::types::Json(&def.task_parameters))
        .bind(def.max_instances as i32)
        .bind(def.coalesce)
        .bind(def.misfire_grace_time)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> SchedulerResult<()> {
        sqlx::query("DELETE FROM job_definitions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn get_workflow(&self, id: i64) -> SchedulerResult<Option<Workflow>> {
        let Some(row) = sqlx::query_as::<_, WorkflowRow>(
            r#"
            SELECT id, name, description, schedule, is_enabled, params_def
            FROM workflows
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        else {
            return Ok(None);
        };

        let steps = self.fetch_workflow_steps(id).await?;
        Ok(Some(assemble_workflow(row, steps)?))
    }

    async fn list_workflows(&self) -> SchedulerResult<Vec<Workflow>> {
        let rows = sqlx::query_as::<_, WorkflowRow>(
            r#"
            SELECT id, name, description, schedule, is_enabled, params_def
            FROM workflows
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut workflows = Vec::with_capacity(rows.len());
        for row in rows {
            let steps = self.fetch_workflow_steps(row.id).await?;
            workflows.push(assemble_workflow(row, steps)?);
        }
        Ok(workflows)
    }

    async fn upsert_workflow_with_steps(&self, workflow: &Workflow) -> SchedulerResult<i64> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let id: i64 = if workflow.id == 0 {
            sqlx::query_scalar(
                r#"
                INSERT INTO workflows (name, description, schedule, is_enabled, params_def)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(&workflow.name)
            .bind(&workflow.description)
            .bind(&workflow.schedule)
            .bind(workflow.is_enabled)
            .bind(workflow.params_def.as_ref().map(sqlx::types::Json))
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err)?
        } else {
            sqlx::query(
                r#"
                INSERT INTO workflows (id, name, description, schedule, is_enabled, params_def)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO UPDATE SET
                    name = EXCLUDED.name,
                    description = EXCLUDED.description,
                    schedule = EXCLUDED.schedule,
                    is_enabled = EXCLUDED.is_enabled,
                    params_def = EXCLUDED.params_def
                "#,
            )
            .bind(workflow.id)
            .bind(&workflow.name)
            .bind(&workflow.description)
            .bind(&workflow.schedule)
            .bind(workflow.is_enabled)
            .bind(workflow.params_def.as_ref().map(sqlx::types::Json))
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
            workflow.id
        };

        // Steps replace as a unit: delete and reinsert, matching the
        // "replacing steps as a unit" CRUD contract.
        sqlx::query("DELETE FROM workflow_steps WHERE workflow_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        for step in &workflow.steps {
            sqlx::query(
                r#"
                INSERT INTO workflow_steps
                    (workflow_id, step_order, name, job_type, target, args, kwargs,
                     on_failure, timeout, run_in_background)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(id)
            .bind(step.step_order)
            .bind(&step.name)
            .bind(job_type_as_str(step.job_type))
            .bind(&step.target)
            .bind(sqlx::types::Json(&step.args))
            .bind(sqlx::types::Json(&step.kwargs))
            .bind(on_failure_as_str(step.on_failure))
            .bind(step.timeout.map(|t| t as i64))
            .bind(step.run_in_background)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)?;
        Ok(id)
    }

    async fn delete_workflow(&self, id: i64) -> SchedulerResult<()> {
        sqlx::query("DELETE FROM workflows WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn create_workflow_run(&self, run: &WorkflowRun) -> SchedulerResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO workflow_runs (workflow_id, status, current_step, start_time, end_time, params_val)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(run.workflow_id)
        .bind(run_status_as_str(run.status))
        .bind(run.current_step)
        .bind(run.start_time)
        .bind(run.end_time)
        .bind(run.params_val.as_ref().map(sqlx::types::Json))
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(id)
    }

    async fn update_workflow_run(
        &self,
        id: i64,
        status: RunStatus,
        end_time: Option<DateTime<Utc>>,
        current_step: i32,
    ) -> SchedulerResult<()> {
        sqlx::query(
            r#"
            UPDATE workflow_runs
            SET status = $2, end_time = $3, current_step = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(run_status_as_str(status))
        .bind(end_time)
        .bind(current_step)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn list_workflow_runs_since(&self, since: DateTime<Utc>) -> SchedulerResult<Vec<WorkflowRun>> {
        let rows = sqlx::query_as::<_, WorkflowRunRow>(
            r#"
            SELECT id, workflow_id, status, current_step, start_time, end_time, params_val
            FROM workflow_runs
            WHERE start_time >= $1
            ORDER BY start_time DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter().map(WorkflowRun::try_from).collect()
    }

    async fn create_log(&self, log: &ExecutionLog) -> SchedulerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO execution_logs
                (id, job_id, workflow_run_id, command, start_time, end_time,
                 exit_code, stdout, stderr, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(log.id)
        .bind(&log.job_id)
        .bind(log.workflow_run_id)
        .bind(&log.command)
        .bind(log.start_time)
        .bind(log.end_time)
        .bind(log.exit_code)
        .bind(&log.stdout)
        .bind(&log.stderr)
        .bind(log_status_as_str(log.status))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn update_log(
        &self,
        id: Uuid,
        end_time: DateTime<Utc>,
        exit_code: i32,
        stdout: &str,
        stderr: &str,
        status: LogStatus,
    ) -> SchedulerResult<()> {
        sqlx::query(
            r#"
            UPDATE execution_logs
            SET end_time = $2, exit_code = $3, stdout = $4, stderr = $5, status = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(end_time)
        .bind(exit_code)
        .bind(stdout)
        .bind(stderr)
        .bind(log_status_as_str(status))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn list_logs(&self, filters: LogFilters, paging: Pagination) -> SchedulerResult<Vec<ExecutionLog>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, job_id, workflow_run_id, command, start_time, end_time, exit_code, stdout, stderr, status FROM execution_logs WHERE 1=1",
        );
        if let Some(job_id) = &filters.job_id {
            qb.push(" AND job_id = ").push_bind(job_id.clone());
        }
        if let Some(run_id) = filters.workflow_run_id {
            qb.push(" AND workflow_run_id = ").push_bind(run_id);
        }
        if let Some(status) = filters.status {
            qb.push(" AND status = ").push_bind(log_status_as_str(status));
        }
        qb.push(" ORDER BY start_time DESC OFFSET ")
            .push_bind(paging.skip)
            .push(" LIMIT ")
            .push_bind(if paging.limit <= 0 { i64::MAX } else { paging.limit });

        let rows: Vec<ExecutionLogRow> = qb.build_query_as().fetch_all(&self.pool).await.map_err(store_err)?;
        rows.into_iter().map(ExecutionLog::try_from).collect()
    }

    async fn list_logs_by_job(&self, job_id: &str) -> SchedulerResult<Vec<ExecutionLog>> {
        let rows = sqlx::query_as::<_, ExecutionLogRow>(
            r#"
            SELECT id, job_id, workflow_run_id, command, start_time, end_time, exit_code, stdout, stderr, status
            FROM execution_logs
            WHERE job_id = $1
            ORDER BY start_time DESC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter().map(ExecutionLog::try_from).collect()
    }

    async fn list_stored_entries(&self) -> SchedulerResult<Vec<StoredEntry>> {
        let rows = sqlx::query_as::<_, StoredEntryRow>(
            "SELECT id, trigger_blob, next_fire_time, job_state_blob FROM scheduled_entries",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.into_iter().map(StoredEntry::from).collect())
    }

    async fn upsert_stored_entry(&self, entry: &StoredEntry) -> SchedulerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO scheduled_entries (id, trigger_blob, next_fire_time, job_state_blob)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                trigger_blob = EXCLUDED.trigger_blob,
                next_fire_time = EXCLUDED.next_fire_time,
                job_state_blob = EXCLUDED.job_state_blob
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.trigger_blob)
        .bind(entry.next_fire_time)
        .bind(&entry.job_state_blob)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn delete_stored_entry(&self, id: &str) -> SchedulerResult<()> {
        sqlx::query("DELETE FROM scheduled_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

impl Database {
    async fn fetch_workflow_steps(&self, workflow_id: i64) -> SchedulerResult<Vec<WorkflowStepRow>> {
        sqlx::query_as::<_, WorkflowStepRow>(
            r#"
            SELECT workflow_id, step_order, name, job_type, target, args, kwargs,
                   on_failure, timeout, run_in_background
            FROM workflow_steps
            WHERE workflow_id = $1
            ORDER BY step_order
            "#,
        )
        .bind(workflow_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)
    }
}
