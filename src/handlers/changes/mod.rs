mod index;
mod revert;
mod show;

pub use index::index;
pub use revert::revert;
pub use show::show;

use crate::error::ApiError;
use crate::models::Version;
use crate::server::AppState;

pub(crate) const CHANGES_PATH: &str = "/changes";
pub(crate) const NO_SUCH_VERSION: &str = "No such version.";

/// Look up a version by its path id; unknown or malformed ids are "No such version."
pub(crate) async fn find_version(state: &AppState, raw_id: &str) -> Result<Version, ApiError> {
    let Ok(id) = raw_id.parse::<i64>() else {
        return Err(ApiError::not_found(NO_SUCH_VERSION, CHANGES_PATH));
    };

    state
        .versions
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NO_SUCH_VERSION, CHANGES_PATH))
}
