// Filesystem browsing for the cwd-picker UI (§4.7 "Filesystem browsing"):
// lists immediate subdirectories under `work_dir`, fail-closed on any path
// that doesn't validate as a sandboxed relative cwd.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use scheduler_core::sandbox::validate_relative_cwd;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/fs/subdirectories", get(list_subdirectories))
        .with_state(state)
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct FsQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, ToSchema, Default)]
pub struct SubdirectoryList {
    pub subdirectories: Vec<String>,
}

/// Never returns an error: any invalid or non-existent path just yields an
/// empty list, since this only feeds UI autocompletion.
#[utoipa::path(
    get,
    path = "/v1/fs/subdirectories",
    params(FsQuery),
    responses((status = 200, description = "Immediate subdirectories under the given relative path", body = SubdirectoryList)),
    tag = "fs"
)]
pub async fn list_subdirectories(State(state): State<AppState>, Query(q): Query<FsQuery>) -> Json<SubdirectoryList> {
    if validate_relative_cwd(&q.path).is_err() {
        return Json(SubdirectoryList::default());
    }
    let target = if q.path.is_empty() {
        state.work_dir.clone()
    } else {
        state.work_dir.join(&q.path)
    };

    let mut names = match std::fs::read_dir(&target) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect::<Vec<_>>(),
        Err(_) => return Json(SubdirectoryList::default()),
    };
    names.sort();
    Json(SubdirectoryList { subdirectories: names })
}
