//! Storage interfaces and the in-memory reference implementation

pub mod memory;
pub mod revocation;
pub mod traits;

// Re-export the main entry points
pub use memory::{create_memory_storage, MemoryStorageProvider};
pub use revocation::{create_memory_revocation_store, RevocationStore, SharedRevocationStore};
pub use traits::{ContentStore, IdentityStore, SharedStorage, StorageProvider};
