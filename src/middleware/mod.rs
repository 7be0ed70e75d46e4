pub mod auth;
pub mod response;

pub use auth::actor_middleware;
pub use response::{ApiResponse, ApiResult, Page, PageInfo};
