// Paygate Core - Domain Logic & Ports
// NO infrastructure dependencies (ports & adapters)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};
