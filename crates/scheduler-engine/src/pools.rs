// Executor pools (§4.3): a worker pool for I/O-bound tasks (shell, email,
// python — the subprocess itself provides isolation) and a process pool
// reserved for heavyweight isolated execution. Sizing and Semaphore-based
// capping follow the teacher's worker pool pattern.

use std::sync::Arc;

use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
pub struct ExecutorPoolsConfig {
    pub worker_pool_size: usize,
    pub process_pool_size: usize,
}

impl Default for ExecutorPoolsConfig {
    fn default() -> Self {
        ExecutorPoolsConfig {
            worker_pool_size: 20,
            process_pool_size: 5,
        }
    }
}

/// Concurrency caps for the two pools. Dispatch submission acquires a permit
/// before spawning the task's own tokio task; the permit is held for the
/// lifetime of that spawned task, not just the submission.
pub struct ExecutorPools {
    pub worker: Arc<Semaphore>,
    pub process: Arc<Semaphore>,
}

impl ExecutorPools {
    pub fn new(config: &ExecutorPoolsConfig) -> Self {
        ExecutorPools {
            worker: Arc::new(Semaphore::new(config.worker_pool_size)),
            process: Arc::new(Semaphore::new(config.process_pool_size)),
        }
    }
}
