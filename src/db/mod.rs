//! Database module: row models, pool setup and SQL repositories.
//!
//! - `model`: rows as SQLite returns them, converted into entities.
//! - `repo`: SQL-only functions, parameterized by `SchemaVariant` table names.
//!
//! Callers go through `crate::context::BloggingContext`; the repository API is
//! re-exported here for the context, the schema checks and the tests.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::{BlogRow, PostRow};
