//! In-memory counter store for testing and single-process deployments

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::traits::*;
use crate::types::*;

type CounterCell = Arc<Mutex<Option<DocumentNumberCounter>>>;

/// Counters held in process memory. Each key has its own mutex, so advancing
/// one counter never waits on another.
#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    counters: Arc<RwLock<HashMap<CounterKey, CounterCell>>>,
}

impl MemoryCounterStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a store with counters already at the given sequences
    pub fn seeded<I>(counters: I) -> Self
    where
        I: IntoIterator<Item = (CounterKey, u64)>,
    {
        let map = counters
            .into_iter()
            .map(|(key, last_sequence)| {
                let mut counter = DocumentNumberCounter::fresh(&key);
                counter.last_sequence = last_sequence;
                (key, Arc::new(Mutex::new(Some(counter))))
            })
            .collect();
        Self {
            counters: Arc::new(RwLock::new(map)),
        }
    }

    fn cell(&self, key: &CounterKey) -> Result<CounterCell, AllocationError> {
        if let Some(cell) = self.counters.read().map_err(poisoned)?.get(key) {
            return Ok(cell.clone());
        }

        let mut counters = self.counters.write().map_err(poisoned)?;
        Ok(counters.entry(key.clone()).or_default().clone())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AllocationError {
    AllocationError::Unavailable("counter map lock poisoned".to_string())
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn last_sequence(&self, key: &CounterKey) -> Result<u64, AllocationError> {
        let cell = self.cell(key)?;
        let counter = cell.lock().map_err(poisoned)?;
        Ok(counter.as_ref().map_or(0, |c| c.last_sequence))
    }

    async fn advance(&self, key: &CounterKey) -> Result<DocumentNumberCounter, AllocationError> {
        let cell = self.cell(key)?;
        let mut slot = cell.lock().map_err(poisoned)?;

        let mut counter = slot
            .clone()
            .unwrap_or_else(|| DocumentNumberCounter::fresh(key));
        counter.advance()?;
        *slot = Some(counter.clone());

        Ok(counter)
    }

    async fn list(&self) -> Result<Vec<DocumentNumberCounter>, AllocationError> {
        let cells: Vec<CounterCell> = self
            .counters
            .read()
            .map_err(poisoned)?
            .values()
            .cloned()
            .collect();

        let mut counters = Vec::with_capacity(cells.len());
        for cell in cells {
            if let Some(counter) = cell.lock().map_err(poisoned)?.clone() {
                counters.push(counter);
            }
        }
        counters.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(document_type: DocumentType, code: &str) -> CounterKey {
        CounterKey::new(
            document_type,
            SegmentCatalog::default().resolve(code).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_advance_starts_at_one() {
        let store = MemoryCounterStore::new();
        let quotations = key(DocumentType::Quotation, "RES");

        assert_eq!(store.last_sequence(&quotations).await.unwrap(), 0);
        assert_eq!(store.advance(&quotations).await.unwrap().last_sequence, 1);
        assert_eq!(store.advance(&quotations).await.unwrap().last_sequence, 2);
        assert_eq!(store.last_sequence(&quotations).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = MemoryCounterStore::seeded([(key(DocumentType::Challan, "COM"), 41)]);

        assert_eq!(
            store.advance(&key(DocumentType::Challan, "COM")).await.unwrap().last_sequence,
            42
        );
        assert_eq!(
            store.advance(&key(DocumentType::Challan, "RES")).await.unwrap().last_sequence,
            1
        );
    }

    #[tokio::test]
    async fn test_list_skips_untouched_counters() {
        let store = MemoryCounterStore::new();
        store.last_sequence(&key(DocumentType::Receipt, "IND")).await.unwrap();
        store.advance(&key(DocumentType::Proforma, "PROD")).await.unwrap();

        let counters = store.list().await.unwrap();
        assert_eq!(counters.len(), 1);
        assert_eq!(counters[0].document_type, DocumentType::Proforma);
        assert_eq!(counters[0].last_sequence, 1);
    }

    #[tokio::test]
    async fn test_exhausted_counter_is_not_advanced() {
        let exhausted = key(DocumentType::Agreement, "INST");
        let store = MemoryCounterStore::seeded([(exhausted.clone(), u64::MAX)]);

        assert!(matches!(
            store.advance(&exhausted).await,
            Err(AllocationError::Exhausted { .. })
        ));
        assert_eq!(store.last_sequence(&exhausted).await.unwrap(), u64::MAX);
    }
}
