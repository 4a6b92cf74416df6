//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Multi-record mutations that
//! must be all-or-nothing open a transaction internally.

pub mod annotation_repo;
pub mod evaluator_repo;
pub mod mark_repo;
pub mod page_repo;
pub mod progress_repo;
pub mod subject_repo;
pub mod task_repo;
pub mod work_item_repo;

pub use annotation_repo::{AnnotationRepo, RemoveOutcome};
pub use evaluator_repo::EvaluatorRepo;
pub use mark_repo::MarkRepo;
pub use page_repo::PageRepo;
pub use progress_repo::ProgressRepo;
pub use subject_repo::SubjectRepo;
pub use task_repo::TaskRepo;
pub use work_item_repo::WorkItemRepo;
