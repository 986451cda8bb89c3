//! Review state held in memory: the loaded record list, optimistic writes,
//! and the filtered/paged view of it.

pub mod cache;
pub mod orchestrator;
pub mod view;

pub use cache::RecordCache;
pub use orchestrator::{ReviewOrchestrator, ReviewOutcome};
pub use view::{PageView, ReviewStats};
