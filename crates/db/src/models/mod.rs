//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the operations that create or mutate it

pub mod annotation;
pub mod evaluator;
pub mod mark;
pub mod page;
pub mod progress;
pub mod subject;
pub mod task;
