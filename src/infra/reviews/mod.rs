// Review store implementations.

pub mod in_memory;
pub mod sqlite_review_store;

pub use in_memory::InMemoryReviewStore;
pub use sqlite_review_store::SqliteReviewStore;
