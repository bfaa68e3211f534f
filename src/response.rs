//! Response bodies for mutating statements.

use serde::Serialize;

/// Summary of one executed mutating statement.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    pub changes: u64,
    pub last_insert_rowid: i64,
}
