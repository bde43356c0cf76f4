use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::Value;

use super::{find_version, CHANGES_PATH};
use crate::api::format::version_to_api_value;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::permissions::Caller;
use crate::server::AppState;

/// GET /changes/:id - show a single version
pub async fn show(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let version = find_version(&state, &id).await?;

    if !state.permissions.allow_show(&caller, &version) {
        return Err(ApiError::forbidden("You do not have permission to show that change.", CHANGES_PATH));
    }

    Ok(ApiResponse::success(version_to_api_value(&version, &state.registry)))
}
