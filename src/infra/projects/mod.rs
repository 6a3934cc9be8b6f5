// Infra implementations of the project store.

pub mod in_memory;
pub mod sqlite_store;

pub use in_memory::InMemoryProjectStore;
pub use sqlite_store::SqliteProjectStore;
