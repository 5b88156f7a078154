pub mod error;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod scenes;

pub use error::{ApiError, ApiResult};
