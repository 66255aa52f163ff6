// Process composition root (C8): loads configuration, builds the Postgres
// pool, wires the store/dispatcher/workflow-runner/engine/reconciler,
// seeds from the declarative file, starts the scheduler loop and the
// config watcher, then serves the HTTP control plane with a graceful
// shutdown hook.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use scheduler_api::config::SchedulerConfig;
use scheduler_api::state::AppState;
use scheduler_api::app_router;
use scheduler_config::{seed_from_file, start_watcher, ConfigReconciler, ReconcilerConfig};
use scheduler_core::{JobDispatcher, SchedulerStore, WorkflowDispatcher};
use scheduler_dispatcher::Dispatcher;
use scheduler_engine::{ExecutorPoolsConfig, Scheduler};
use scheduler_storage::Database;
use scheduler_workflow::WorkflowRunner;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scheduler_api=info,scheduler_engine=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("scheduler-api starting...");

    let cfg = SchedulerConfig::load(
        std::env::var("SCHEDULER_CONFIG_PATH").ok().map(std::path::PathBuf::from).as_deref(),
    )
    .context("loading process configuration")?;

    let db = Database::from_url(&cfg.database_url)
        .await
        .context("connecting to database")?;
    db.migrate().await.context("running database migrations")?;
    tracing::info!("connected to database and applied migrations");

    std::fs::create_dir_all(&cfg.work_dir).context("creating work_dir")?;

    let store: Arc<dyn SchedulerStore> = Arc::new(db);

    let dispatcher = Arc::new(Dispatcher::new(store.clone(), cfg.dispatcher_config()));
    let workflow_runner = Arc::new(WorkflowRunner::new(store.clone(), dispatcher.clone(), cfg.work_dir.clone()));

    let job_dispatcher: Arc<dyn JobDispatcher> = dispatcher.clone();
    let workflow_dispatcher: Arc<dyn WorkflowDispatcher> = workflow_runner.clone();

    let scheduler = Scheduler::new(store.clone(), job_dispatcher, workflow_dispatcher.clone(), ExecutorPoolsConfig::default());

    let reconciler = Arc::new(ConfigReconciler::new(
        store.clone(),
        scheduler.clone(),
        ReconcilerConfig {
            delete_orphaned_jobs_on_sync: cfg.delete_orphaned_jobs_on_sync,
            ..Default::default()
        },
    ));

    if let Some(seed_path) = &cfg.declarative_seed_path {
        if seed_path.exists() {
            let report = seed_from_file(&store, seed_path).await.context("seeding from declarative file")?;
            tracing::info!(?report, "declarative seed applied");
        } else {
            tracing::warn!(path = %seed_path.display(), "declarative seed file configured but not found, skipping");
        }
    }

    scheduler.load_from_store().await.context("restoring scheduled entries")?;
    reconciler.sync().await.context("initial configuration sync")?;
    let scheduler_handle = scheduler.start();

    let _watcher = match &cfg.declarative_seed_path {
        Some(path) => Some(start_watcher(path.clone(), reconciler.clone()).context("starting declarative file watcher")?),
        None => None,
    };

    if cfg.periodic_sync_enabled {
        let reconciler = reconciler.clone();
        let interval = Duration::from_secs(cfg.periodic_sync_interval_seconds);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = reconciler.sync().await {
                    tracing::warn!(error = %e, "periodic sync failed");
                }
            }
        });
    }

    let state = AppState {
        store: store.clone(),
        scheduler: scheduler.clone(),
        reconciler: reconciler.clone(),
        workflow_dispatcher,
        work_dir: cfg.work_dir.clone(),
    };

    let app = app_router(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    ).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_address)
        .await
        .with_context(|| format!("binding to {}", cfg.bind_address))?;
    tracing::info!(address = %cfg.bind_address, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(scheduler.clone()))
        .await
        .context("server error")?;

    scheduler_handle.await.ok();
    Ok(())
}

async fn shutdown_signal(scheduler: Arc<Scheduler>) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received, stopping scheduler loop");
    scheduler.shutdown();
}
