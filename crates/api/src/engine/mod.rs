//! The workflow engine: classification of raw scans and lazy page
//! extraction. Both coordinate filesystem state with database records and
//! publish progress on the event bus.

pub mod classifier;
pub mod extraction;
