//! HTTP API Layer
//!
//! MIP-003 agent endpoints (`/start_job`, `/status`, `/availability`,
//! `/input_schema`, `/provide_input`), the one-click super job endpoints and
//! live log streaming.

pub mod error;
pub mod handlers;
pub mod logs;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use logs::{LogBuffer, LogBufferLayer, LogEntry};
pub use routes::create_router;
pub use state::AppState;
