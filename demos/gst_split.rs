//! GST-inclusive pricing split examples

use bigdecimal::BigDecimal;
use solar_billing_core::{
    compute_pricing, BucketConfig, PricingConfig, PricingEngine, PricingResult, Supply,
};

fn print_breakdown(title: &str, pricing: &PricingResult) {
    println!("{}", title);
    println!("  Basic total:          ₹{}", pricing.basic_total);
    for (name, bucket) in [("Goods", &pricing.goods), ("Services", &pricing.services)] {
        println!(
            "  {:<8} @ {:>2}%  basic ₹{}  CGST ₹{}  SGST ₹{}  IGST ₹{}",
            name,
            bucket.tax_rate_percent,
            bucket.basic_amount,
            bucket.cgst_amount,
            bucket.sgst_amount,
            bucket.igst_amount
        );
    }
    println!("  Total tax:            ₹{}", pricing.total_tax());
    println!("  Round off:            ₹{}", pricing.round_off);
    println!("  Grand total:          ₹{}", pricing.grand_total);
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Solar Billing Core - GST Split Examples\n");

    // 1. A 3 kW rooftop system sold within the seller's state
    let amount = BigDecimal::from(185000);
    let local = compute_pricing(&amount, Supply::resolve("Gujarat", "gujarat").is_intra_state())?;
    print_breakdown("Intra-state (CGST + SGST), ₹1,85,000:", &local);

    // 2. Same system shipped to another state
    let outstation = compute_pricing(&amount, Supply::resolve("Gujarat", "Rajasthan").is_intra_state())?;
    print_breakdown("Inter-state (IGST), ₹1,85,000:", &outstation);

    // 3. Product-only sale priced with a different split
    let product_only = PricingEngine::new(PricingConfig {
        goods: BucketConfig::new(BigDecimal::from(1), BigDecimal::from(12)),
        services: BucketConfig::new(BigDecimal::from(0), BigDecimal::from(18)),
    })?;
    println!("Blended factor for product-only split: {}", product_only.blended_factor());
    print_breakdown(
        "Product-only, ₹45,999.50:",
        &product_only.compute(&"45999.50".parse()?, true)?,
    );

    // 4. Validation
    match compute_pricing(&BigDecimal::from(0), true) {
        Ok(_) => println!("zero amount accepted?"),
        Err(e) => println!("Rejected: {}", e),
    }

    Ok(())
}
