use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};

use super::{find_version, CHANGES_PATH};
use crate::api::format::{entity_to_api_value, version_to_api_value};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Flash};
use crate::permissions::Caller;
use crate::revert::RevertEngine;
use crate::server::AppState;

/// PUT|PATCH /changes/:id - roll back the change
///
/// Every engine outcome, failed or not, answers 200 with a message and the
/// listing to return to.
pub async fn revert(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let version = find_version(&state, &id).await?;

    if !state.permissions.allow_revert(&caller, &version) {
        return Err(ApiError::forbidden("You do not have permission to revert this change.", CHANGES_PATH));
    }

    let engine = RevertEngine::new(state.versions.as_ref(), state.entities.as_ref());
    let outcome = engine.attempt_revert(&version).await?;

    let flash = if outcome.succeeded() {
        Flash::Notice(outcome.message().to_string())
    } else {
        Flash::Error(outcome.message().to_string())
    };

    let data = json!({
        "outcome": outcome.tag(),
        "version": version_to_api_value(&version, &state.registry),
        "record": outcome.entity().map(entity_to_api_value),
    });

    Ok(ApiResponse::success(data).with_flash(flash).redirect_to(CHANGES_PATH))
}
