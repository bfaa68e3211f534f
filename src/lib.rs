//! Rollbook: JSON-over-HTTP roster backend over SQLite.

pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod schema;
pub mod sql;
pub mod state;
pub mod store;
pub mod tables;

pub use error::AppError;
pub use response::RunResult;
pub use routes::{api_routes, app, common_routes};
pub use schema::{compile, Checker, FieldRule, ValidationError};
pub use state::AppState;
pub use store::Database;
