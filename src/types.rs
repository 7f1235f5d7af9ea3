//! Core types and data structures for document numbering

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::tax::pricing::PricingError;

/// Minimum width of the zero-padded sequence in a formatted document number
pub const SEQUENCE_WIDTH: usize = 4;

/// Commercial documents that carry a sequential number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Price quotation sent to a lead or customer
    Quotation,
    /// Delivery challan accompanying dispatched material
    Challan,
    /// Proforma invoice raised ahead of payment
    Proforma,
    /// Installation / supply agreement
    Agreement,
    /// Payment receipt
    Receipt,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Quotation,
        DocumentType::Challan,
        DocumentType::Proforma,
        DocumentType::Agreement,
        DocumentType::Receipt,
    ];

    /// Lowercase name used in requests and counter file names
    pub fn name(&self) -> &'static str {
        match self {
            DocumentType::Quotation => "quotation",
            DocumentType::Challan => "challan",
            DocumentType::Proforma => "proforma",
            DocumentType::Agreement => "agreement",
            DocumentType::Receipt => "receipt",
        }
    }

    /// Prefix printed at the start of the document number
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentType::Quotation => "QTN",
            DocumentType::Challan => "DC",
            DocumentType::Proforma => "PI",
            DocumentType::Agreement => "AGR",
            DocumentType::Receipt => "RCT",
        }
    }

    /// Look up a document type by its number prefix
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.prefix() == prefix)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DocumentType {
    type Err = NumberingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| NumberingError::UnknownDocumentType(s.to_string()))
    }
}

/// Business-line code attached to customers and documents (RES, COM, ...)
///
/// Only a [`SegmentCatalog`] hands these out, so a `Segment` in hand is
/// always one of the configured codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Segment(String);

impl Segment {
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The configured set of segment codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentCatalog {
    segments: Vec<Segment>,
}

impl SegmentCatalog {
    /// Segment codes used when nothing else is configured
    pub const DEFAULT_CODES: [&'static str; 5] = ["RES", "COM", "IND", "INST", "PROD"];

    /// Build a catalog from configured codes
    pub fn new<I, S>(codes: I) -> NumberingResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments: Vec<Segment> = Vec::new();
        for code in codes {
            let code = code.into();
            crate::utils::validation::validate_segment_code(&code)?;
            if segments.iter().any(|s| s.0 == code) {
                return Err(NumberingError::InvalidSegmentCode(format!(
                    "Segment '{}' is listed more than once",
                    code
                )));
            }
            segments.push(Segment(code));
        }

        if segments.is_empty() {
            return Err(NumberingError::InvalidSegmentCode(
                "At least one segment must be configured".to_string(),
            ));
        }

        Ok(Self { segments })
    }

    /// Resolve a caller-supplied code. Matching is exact; `"res"` is not `RES`.
    pub fn resolve(&self, code: &str) -> NumberingResult<Segment> {
        self.segments
            .iter()
            .find(|s| s.0 == code)
            .cloned()
            .ok_or_else(|| NumberingError::UnknownSegment(code.to_string()))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl Default for SegmentCatalog {
    fn default() -> Self {
        Self {
            segments: Self::DEFAULT_CODES
                .iter()
                .map(|c| Segment((*c).to_string()))
                .collect(),
        }
    }
}

/// Identifies one counter: a (document type, segment) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CounterKey {
    pub document_type: DocumentType,
    pub segment: Segment,
}

impl CounterKey {
    pub fn new(document_type: DocumentType, segment: Segment) -> Self {
        Self {
            document_type,
            segment,
        }
    }

    /// Stable name for storage, e.g. `challan-RES`
    pub fn storage_name(&self) -> String {
        format!("{}-{}", self.document_type.name(), self.segment.code())
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.document_type, self.segment)
    }
}

/// Persisted state of one counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNumberCounter {
    pub document_type: DocumentType,
    pub segment: Segment,
    /// Last sequence handed out; 0 means nothing has been issued yet
    pub last_sequence: u64,
    /// When the counter was last advanced
    pub updated_at: NaiveDateTime,
}

impl DocumentNumberCounter {
    /// A counter that has never issued a number
    pub fn fresh(key: &CounterKey) -> Self {
        Self {
            document_type: key.document_type,
            segment: key.segment.clone(),
            last_sequence: 0,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn key(&self) -> CounterKey {
        CounterKey::new(self.document_type, self.segment.clone())
    }

    /// Move to the next sequence. Counters only ever go up.
    pub fn advance(&mut self) -> Result<u64, AllocationError> {
        let next = self
            .last_sequence
            .checked_add(1)
            .ok_or_else(|| AllocationError::Exhausted {
                counter: self.key().to_string(),
            })?;
        self.last_sequence = next;
        self.updated_at = chrono::Utc::now().naive_utc();
        Ok(next)
    }
}

/// A document number that has been issued. Never reused, even if the
/// document it was minted for is never saved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocatedNumber {
    /// Printable form, e.g. `QTN-RES-0007`
    pub formatted: String,
    pub sequence: u64,
    pub document_type: DocumentType,
    pub segment: Segment,
}

impl AllocatedNumber {
    pub fn new(document_type: DocumentType, segment: Segment, sequence: u64) -> Self {
        let formatted = format!(
            "{}-{}-{:0width$}",
            document_type.prefix(),
            segment.code(),
            sequence,
            width = SEQUENCE_WIDTH
        );
        Self {
            formatted,
            sequence,
            document_type,
            segment,
        }
    }

    pub fn key(&self) -> CounterKey {
        CounterKey::new(self.document_type, self.segment.clone())
    }
}

impl fmt::Display for AllocatedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted)
    }
}

impl FromStr for AllocatedNumber {
    type Err = NumberingError;

    /// Parse a printed number back into its parts. The segment is checked for
    /// shape only; use [`SegmentCatalog::resolve`] to check membership.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NumberingError::InvalidNumber(s.to_string());

        let mut parts = s.splitn(3, '-');
        let (Some(prefix), Some(code), Some(digits)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let document_type = DocumentType::from_prefix(prefix).ok_or_else(invalid)?;
        crate::utils::validation::validate_segment_code(code).map_err(|_| invalid())?;

        if digits.len() < SEQUENCE_WIDTH || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let sequence: u64 = digits.parse().map_err(|_| invalid())?;
        if sequence == 0 {
            return Err(invalid());
        }

        let number = Self::new(document_type, Segment(code.to_string()), sequence);
        // "DC-RES-00007" parses to 7 but prints as DC-RES-0007
        if number.formatted != s {
            return Err(invalid());
        }
        Ok(number)
    }
}

/// Failures while reading or advancing a persistent counter. All of these are
/// transient from the caller's point of view: retry the whole
/// allocate-then-persist sequence from scratch.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("Timed out after {waited_ms}ms waiting for the lock on counter {counter}")]
    LockTimeout { counter: String, waited_ms: u64 },
    #[error("I/O error on counter {counter}: {source}")]
    Io {
        counter: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Counter {counter} is corrupt: {reason}")]
    Corrupt { counter: String, reason: String },
    #[error("Counter {counter} has no sequence numbers left")]
    Exhausted { counter: String },
    #[error("Counter store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while issuing document numbers
#[derive(Debug, thiserror::Error)]
pub enum NumberingError {
    #[error("Unknown segment: {0}")]
    UnknownSegment(String),
    #[error("Invalid segment code: {0}")]
    InvalidSegmentCode(String),
    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),
    #[error("Invalid document number: {0}")]
    InvalidNumber(String),
    #[error("Allocation failed: {0}")]
    Allocation(#[from] AllocationError),
}

impl NumberingError {
    /// Whether a fresh allocation attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, NumberingError::Allocation(_))
    }
}

/// Result type for numbering operations
pub type NumberingResult<T> = Result<T, NumberingError>;

/// Any error raised while preparing a billing document
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Numbering(#[from] NumberingError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for billing operations
pub type BillingResult<T> = Result<T, BillingError>;
