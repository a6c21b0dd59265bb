//! HTTP surface: JSON handlers over the finance engine and stores.

pub mod error;
pub mod finance;
pub mod logs;
pub mod manifest;
pub mod payments;
pub mod routes;
pub mod upload;

pub use routes::{create_router, AppState};
