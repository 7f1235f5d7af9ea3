//! Storage abstraction for document number counters

use async_trait::async_trait;

use crate::types::*;

/// Persistent home of the per-(document type, segment) counters
///
/// Implementations decide where counters live (files, a database row, memory)
/// but must make [`CounterStore::advance`] serializable per key: two callers
/// advancing the same key never observe the same sequence, while callers on
/// different keys never wait on each other.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Last sequence issued for the key, 0 if the counter does not exist yet
    async fn last_sequence(&self, key: &CounterKey) -> Result<u64, AllocationError>;

    /// Read, increment and persist the counter under the key's exclusive
    /// lock. The new value is durable before the lock is released.
    async fn advance(&self, key: &CounterKey) -> Result<DocumentNumberCounter, AllocationError>;

    /// Every counter that has issued at least one number
    async fn list(&self) -> Result<Vec<DocumentNumberCounter>, AllocationError>;
}
