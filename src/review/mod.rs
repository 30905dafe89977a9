//! Review orchestration: per-subject threads and the run driver.

pub mod orchestrator;
pub mod threads;

pub use orchestrator::{ChangeKind, ReviewOrchestrator, ReviewRequest};
pub use threads::{InMemoryThreadStore, JsonThreadStore, ThreadStore};
