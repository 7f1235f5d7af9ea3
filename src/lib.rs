//! # Solar Billing Core
//!
//! Pricing and numbering for the commercial documents of a solar EPC business:
//! quotations, delivery challans, proforma invoices, agreements and receipts.
//!
//! ## Features
//!
//! - **GST-inclusive pricing split**: one customer-facing amount is split into a
//!   goods bucket (70% @ 5%) and a services bucket (30% @ 18%), with CGST/SGST
//!   or IGST and a round-off line that reconciles to the rupee
//! - **Document numbering**: `QTN-RES-0007` style numbers, sequential per
//!   document type and segment, never duplicated across threads or processes
//! - **Storage abstraction**: counters live behind the [`CounterStore`] trait,
//!   with file-backed and in-memory implementations
//!
//! ## Quick Start
//!
//! ```rust
//! use solar_billing_core::compute_pricing;
//! use bigdecimal::BigDecimal;
//!
//! let pricing = compute_pricing(&BigDecimal::from(100000), true).unwrap();
//! assert_eq!(pricing.grand_total, BigDecimal::from(100000));
//! assert!(pricing.check_reconciliation().is_ok());
//! ```

pub mod config;
pub mod issuing;
pub mod numbering;
pub mod observability;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::{BillingConfig, ConfigError};
pub use issuing::*;
pub use numbering::*;
pub use tax::*;
pub use traits::*;
pub use types::*;
