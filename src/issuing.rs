//! Issuing a priced, numbered document
//!
//! Ties the pricing engine and the number allocator together for one
//! document-creation request. Persisting the document is the caller's job.

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::BillingConfig;
use crate::numbering::DocumentNumberAllocator;
use crate::tax::gst::Supply;
use crate::tax::pricing::{PricingEngine, PricingResult};
use crate::traits::*;
use crate::types::*;

/// What the form layer collects for a new quotation, challan, proforma, ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub document_type: String,
    pub segment: String,
    pub final_amount_inclusive: BigDecimal,
    /// Customer's state; blank means the seller's own state
    pub place_of_supply_state: String,
}

impl IssueRequest {
    pub fn new(
        document_type: impl Into<String>,
        segment: impl Into<String>,
        final_amount_inclusive: BigDecimal,
    ) -> Self {
        Self {
            document_type: document_type.into(),
            segment: segment.into(),
            final_amount_inclusive,
            place_of_supply_state: String::new(),
        }
    }

    pub fn place_of_supply(mut self, state: impl Into<String>) -> Self {
        self.place_of_supply_state = state.into();
        self
    }
}

/// Number and tax breakdown to embed in the document record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedDocument {
    pub number: AllocatedNumber,
    pub pricing: PricingResult,
    pub issued_at: NaiveDateTime,
}

/// Prices and numbers documents for one seller
#[derive(Debug, Clone)]
pub struct DocumentIssuer<S: CounterStore> {
    home_state: String,
    engine: PricingEngine,
    allocator: DocumentNumberAllocator<S>,
}

impl<S: CounterStore> DocumentIssuer<S> {
    pub fn new(
        home_state: impl Into<String>,
        engine: PricingEngine,
        allocator: DocumentNumberAllocator<S>,
    ) -> Self {
        Self {
            home_state: home_state.into(),
            engine,
            allocator,
        }
    }

    /// Build an issuer from loaded configuration and a counter store
    pub fn from_config(config: &BillingConfig, store: S) -> BillingResult<Self> {
        let engine = config.pricing_engine()?;
        let segments = config.segment_catalog()?;
        Ok(Self::new(
            config.home_state.clone(),
            engine,
            DocumentNumberAllocator::with_segments(store, segments),
        ))
    }

    pub fn allocator(&self) -> &DocumentNumberAllocator<S> {
        &self.allocator
    }

    pub fn engine(&self) -> &PricingEngine {
        &self.engine
    }

    /// Price the amount, then mint a number. Pricing runs first because it is
    /// pure: a rejected amount never consumes a sequence number.
    pub async fn issue(&self, request: &IssueRequest) -> BillingResult<IssuedDocument> {
        let supply = Supply::resolve(&self.home_state, &request.place_of_supply_state);
        let pricing = self
            .engine
            .compute(&request.final_amount_inclusive, supply.is_intra_state())?;

        let number = self
            .allocator
            .allocate_next(&request.document_type, &request.segment)
            .await?;

        Ok(IssuedDocument {
            number,
            pricing,
            issued_at: chrono::Utc::now().naive_utc(),
        })
    }
}
