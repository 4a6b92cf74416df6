//! HTTP handlers, one module per resource.

pub mod annotation;
pub mod evaluator;
pub mod mark;
pub mod page;
pub mod progress;
pub mod subject;
pub mod task;
pub mod work_item;
