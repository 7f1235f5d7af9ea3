//! Sequential document number allocation

use crate::traits::*;
use crate::types::*;

/// Hands out unique, monotonically increasing numbers per (document type, segment)
///
/// Numbers are allocated, never reclaimed: if the caller fails to save the
/// document afterwards the number is simply skipped.
#[derive(Debug, Clone)]
pub struct DocumentNumberAllocator<S: CounterStore> {
    store: S,
    segments: SegmentCatalog,
}

impl<S: CounterStore> DocumentNumberAllocator<S> {
    /// Create an allocator for the default segments
    pub fn new(store: S) -> Self {
        Self::with_segments(store, SegmentCatalog::default())
    }

    /// Create an allocator for a configured segment catalog
    pub fn with_segments(store: S, segments: SegmentCatalog) -> Self {
        Self { store, segments }
    }

    pub fn segments(&self) -> &SegmentCatalog {
        &self.segments
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn key(&self, document_type: &str, segment: &str) -> NumberingResult<CounterKey> {
        let document_type: DocumentType = document_type.parse()?;
        let segment = self.segments.resolve(segment)?;
        Ok(CounterKey::new(document_type, segment))
    }

    /// Mint the next number, e.g. `allocate_next("challan", "RES")` -> `DC-RES-0001`
    pub async fn allocate_next(
        &self,
        document_type: &str,
        segment: &str,
    ) -> NumberingResult<AllocatedNumber> {
        let key = self.key(document_type, segment)?;
        let counter = self.store.advance(&key).await?;

        let number = AllocatedNumber::new(key.document_type, key.segment, counter.last_sequence);
        tracing::debug!(
            document_type = %number.document_type,
            segment = %number.segment,
            sequence = number.sequence,
            number = %number.formatted,
            "document number issued"
        );

        Ok(number)
    }

    /// Last sequence issued for the pair, 0 if none has been issued
    pub async fn last_issued(&self, document_type: &str, segment: &str) -> NumberingResult<u64> {
        let key = self.key(document_type, segment)?;
        Ok(self.store.last_sequence(&key).await?)
    }

    /// All counters that have issued at least one number
    pub async fn counters(&self) -> NumberingResult<Vec<DocumentNumberCounter>> {
        Ok(self.store.list().await?)
    }
}
