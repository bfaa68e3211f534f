//! Shared application state for all routes.

use crate::store::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}
