//! Domain logic for the booklet evaluation engine.
//!
//! Everything in this crate is independent of axum and sqlx: the error
//! taxonomy, the on-disk directory layout, PDF inspection and rasterization,
//! the classification report format, and the pure set computations used by
//! allocation and delivery.

pub mod error;
pub mod layout;
pub mod pdf;
pub mod report;
pub mod retry;
pub mod rubric;
pub mod types;
