// Shared request/response DTOs (C7) used across the per-resource route
// modules: list endpoints return a bare JSON array, matching the teacher's
// `agents.rs` convention.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Query params shared by the job/log listing endpoints.
#[derive(Debug, Clone, Copy, Deserialize, utoipa::IntoParams)]
pub struct PageParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

impl From<PageParams> for scheduler_core::Pagination {
    fn from(p: PageParams) -> Self {
        scheduler_core::Pagination {
            skip: p.skip,
            limit: p.limit,
        }
    }
}

/// Best-effort bulk-operation result (§6 "Job CRUD ... bulk versions"):
/// each id either succeeds or carries its own failure reason, mirroring the
/// source's `delete_bulk_jobs`/`pause_bulk_scheduled_jobs` response shape.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct BulkResult {
    pub done: Vec<String>,
    pub failed: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BulkIdsRequest {
    pub ids: Vec<String>,
}
