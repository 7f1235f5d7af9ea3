//! Issuing numbered, priced documents against a file-backed counter store

use bigdecimal::BigDecimal;
use solar_billing_core::observability::init_tracing;
use solar_billing_core::utils::FileCounterStore;
use solar_billing_core::{BillingConfig, DocumentIssuer, IssueRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BillingConfig::load()?;
    init_tracing(&config.log_level);

    let store = FileCounterStore::open(&config.counter_dir)?.with_lock_timeout(config.lock_timeout());
    let issuer = DocumentIssuer::from_config(&config, store)?;

    println!("Issuing documents for a seller in {}\n", config.home_state);

    let requests = [
        IssueRequest::new("quotation", "RES", BigDecimal::from(185000))
            .place_of_supply(config.home_state.clone()),
        IssueRequest::new("challan", "RES", BigDecimal::from(185000))
            .place_of_supply(config.home_state.clone()),
        IssueRequest::new("proforma", "COM", BigDecimal::from(1250000)).place_of_supply("Karnataka"),
        IssueRequest::new("quotation", "XYZ", BigDecimal::from(1000)),
    ];

    for request in &requests {
        match issuer.issue(request).await {
            Ok(issued) => println!(
                "  {}  grand total ₹{}  tax ₹{}  round off ₹{}  ({:?})",
                issued.number,
                issued.pricing.grand_total,
                issued.pricing.total_tax(),
                issued.pricing.round_off,
                issued.pricing.supply
            ),
            Err(e) => println!("  rejected {} / {}: {}", request.document_type, request.segment, e),
        }
    }

    println!("\nCounters:");
    for counter in issuer.allocator().counters().await? {
        println!(
            "  {} / {}: last sequence {}",
            counter.document_type, counter.segment, counter.last_sequence
        );
    }

    Ok(())
}
