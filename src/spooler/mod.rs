pub mod heap;
pub mod index;
pub mod job;
pub mod store;

use std::sync::Arc;

use tokio::sync::Mutex;

// Re-export commonly used types
pub use heap::JobHeap;
pub use job::{Job, JobKind, JobStatus};
pub use store::JobRecord;

/// The scheduler shared between the HTTP layer and the dispatch worker.
/// Every compound heap operation runs under this one lock.
pub type SharedHeap = Arc<Mutex<JobHeap>>;

pub fn shared(heap: JobHeap) -> SharedHeap {
    Arc::new(Mutex::new(heap))
}
