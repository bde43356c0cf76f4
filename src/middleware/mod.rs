pub mod caller;
pub mod response;

pub use caller::caller_middleware;
pub use response::{ApiResponse, ApiResult, Flash};
