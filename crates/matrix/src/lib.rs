//! Matrix data for hclaudit.
//!
//! Loads the environmental and what-if matrices from CSV, renders them into
//! the text block that is embedded in every prompt, and checks that the
//! files the dashboard depends on exist.

pub mod check;
pub mod store;
pub mod table;

pub use check::{EnvironmentReport, FileCheck, FileRole, FileStatus, verify};
pub use store::{Matrix, MatrixContext, MatrixSource, MatrixStore};
pub use table::Table;
