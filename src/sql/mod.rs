//! Statement building and parameter binding.

pub mod builder;
pub mod params;

pub use builder::{delete, delete_by, insert, select, select_all, update, Select, Statement};
pub use params::BindValue;
