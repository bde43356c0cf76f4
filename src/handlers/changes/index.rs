use axum::{
    extract::{Query, State},
    Extension,
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::format::version_page_to_api_value;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::pagination::PageParams;
use crate::permissions::Caller;
use crate::server::AppState;
use crate::store::VersionFilter;

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    /// Only versions of this item type
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    /// Only versions of this item id
    pub id: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// GET /changes - list versions, newest first
pub async fn index(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<IndexQuery>,
) -> ApiResult<Value> {
    if !state.permissions.allow_index(&caller) {
        return Err(ApiError::forbidden("You do not have permission to list changes.", "/"));
    }

    let filter = VersionFilter {
        item_type: query.item_type.filter(|t| !t.is_empty()),
        item_id: match query.id.as_deref().filter(|id| !id.is_empty()) {
            None => None,
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| ApiError::bad_request(format!("Invalid item id filter: {}", raw)))?,
            ),
        },
    };
    let params = PageParams::coerce(query.page.as_deref(), query.per_page.as_deref(), &state.config.pagination);

    let page = state.versions.list(&filter, params).await?;
    tracing::debug!(
        "Listed {} of {} versions (page {}, filter {:?})",
        page.items.len(),
        page.total_count,
        page.page,
        filter
    );

    Ok(ApiResponse::success(version_page_to_api_value(&page, &state.registry)))
}
