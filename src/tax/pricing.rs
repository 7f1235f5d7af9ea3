//! GST-inclusive pricing split
//!
//! A solar system is sold at one GST-inclusive figure. For the tax invoice that
//! figure is split back into a goods share (modules, inverters, structure) and
//! a services share (installation), each taxed at its own rate. With the
//! default 70% @ 5% / 30% @ 18% split the blended factor is
//! `0.70 * 1.05 + 0.30 * 1.18 = 1.089`, so the basic value of a ₹1,00,000
//! system is `100000 / 1.089`.
//!
//! All arithmetic runs at full `BigDecimal` precision. Sub-amounts are rounded
//! to paise once, when the [`PricingResult`] is built, and `round_off`
//! reconciles those displayed figures with the whole-rupee grand total.

use bigdecimal::BigDecimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::tax::gst::{GstComponents, GstRate, Supply};
use crate::utils::rounding::{round_money, round_whole};

/// One share of the basic value and the GST rate it attracts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Fraction of the basic value in this bucket (0.70 for 70%)
    #[serde(deserialize_with = "deserialize_decimal")]
    pub share: BigDecimal,
    /// GST rate percentage (5 for 5%)
    #[serde(deserialize_with = "deserialize_decimal")]
    pub rate_percent: BigDecimal,
}

impl BucketConfig {
    pub fn new(share: BigDecimal, rate_percent: BigDecimal) -> Self {
        Self {
            share,
            rate_percent,
        }
    }
}

/// How the basic value is split between goods and services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub goods: BucketConfig,
    pub services: BucketConfig,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            goods: BucketConfig::new(
                BigDecimal::from(70) / BigDecimal::from(100),
                BigDecimal::from(5),
            ),
            services: BucketConfig::new(
                BigDecimal::from(30) / BigDecimal::from(100),
                BigDecimal::from(18),
            ),
        }
    }
}

impl PricingConfig {
    /// Shares must be non-negative and add up to exactly 1; rates must be in [0, 100)
    pub fn validate(&self) -> Result<(), PricingError> {
        let zero = BigDecimal::from(0);

        for (name, bucket) in [("goods", &self.goods), ("services", &self.services)] {
            if bucket.share < zero {
                return Err(PricingError::InvalidConfig(format!(
                    "{} share cannot be negative: {}",
                    name, bucket.share
                )));
            }
            GstRate::inter_state(bucket.rate_percent.clone()).validate()?;
        }

        let total_share = &self.goods.share + &self.services.share;
        if total_share != BigDecimal::from(1) {
            return Err(PricingError::InvalidConfig(format!(
                "Bucket shares must add up to 1, got {}",
                total_share
            )));
        }

        Ok(())
    }

    /// `goods.share * (1 + goods.rate) + services.share * (1 + services.rate)`
    pub fn blended_factor(&self) -> BigDecimal {
        [&self.goods, &self.services]
            .into_iter()
            .map(|bucket| {
                &bucket.share * GstRate::inter_state(bucket.rate_percent.clone()).inclusive_factor()
            })
            .sum()
    }
}

/// Tax breakdown of one bucket, rounded to paise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBucket {
    pub basic_amount: BigDecimal,
    pub tax_rate_percent: BigDecimal,
    pub cgst_amount: BigDecimal,
    pub sgst_amount: BigDecimal,
    pub igst_amount: BigDecimal,
}

impl TaxBucket {
    fn from_basic(basic_amount: &BigDecimal, rate_percent: &BigDecimal, supply: Supply) -> Self {
        let rate = GstRate::for_supply(rate_percent.clone(), supply);
        let tax = GstComponents::compute(basic_amount, &rate);

        Self {
            basic_amount: round_money(basic_amount),
            tax_rate_percent: rate.total_rate,
            cgst_amount: round_money(&tax.cgst_amount),
            sgst_amount: round_money(&tax.sgst_amount),
            igst_amount: round_money(&tax.igst_amount),
        }
    }

    /// CGST + SGST + IGST
    pub fn tax_amount(&self) -> BigDecimal {
        &self.cgst_amount + &self.sgst_amount + &self.igst_amount
    }

    /// Basic amount plus tax
    pub fn total(&self) -> BigDecimal {
        &self.basic_amount + self.tax_amount()
    }
}

/// Auditable tax breakdown of a GST-inclusive amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    /// Basic (pre-tax) value of the whole supply
    pub basic_total: BigDecimal,
    /// Goods bucket (70% @ 5% by default)
    pub goods: TaxBucket,
    /// Services bucket (30% @ 18% by default)
    pub services: TaxBucket,
    /// Signed adjustment that makes the displayed lines add up to `grand_total`
    pub round_off: BigDecimal,
    /// Customer-facing total, the input rounded to the whole rupee
    pub grand_total: BigDecimal,
    pub supply: Supply,
}

impl PricingResult {
    /// Sum of both buckets' basic amounts as displayed
    pub fn taxable_total(&self) -> BigDecimal {
        &self.goods.basic_amount + &self.services.basic_amount
    }

    /// Sum of both buckets' tax as displayed
    pub fn total_tax(&self) -> BigDecimal {
        self.goods.tax_amount() + self.services.tax_amount()
    }

    /// Check that every displayed line plus `round_off` equals `grand_total`
    pub fn check_reconciliation(&self) -> Result<(), PricingError> {
        let lines = self.taxable_total() + self.total_tax() + &self.round_off;
        if lines != self.grand_total {
            return Err(PricingError::ReconciliationInvariant(format!(
                "lines add up to {} but grand total is {}",
                lines, self.grand_total
            )));
        }
        Ok(())
    }
}

/// Pricing errors
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid pricing configuration: {0}")]
    InvalidConfig(String),
    #[error("Reconciliation invariant violated: {0}")]
    ReconciliationInvariant(String),
}

/// Splits GST-inclusive amounts using a validated [`PricingConfig`]
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
    blended_factor: BigDecimal,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Result<Self, PricingError> {
        config.validate()?;
        let blended_factor = config.blended_factor();
        Ok(Self {
            config,
            blended_factor,
        })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn blended_factor(&self) -> &BigDecimal {
        &self.blended_factor
    }

    /// Split a GST-inclusive amount into basic value, tax and round-off
    pub fn compute(
        &self,
        final_amount_inclusive: &BigDecimal,
        is_intra_state: bool,
    ) -> Result<PricingResult, PricingError> {
        if *final_amount_inclusive <= BigDecimal::from(0) {
            return Err(PricingError::InvalidAmount(format!(
                "Amount must be greater than zero, got {}",
                final_amount_inclusive
            )));
        }

        let supply = Supply::from_intra_state(is_intra_state);
        let basic_total = final_amount_inclusive / &self.blended_factor;

        let goods = TaxBucket::from_basic(
            &(&basic_total * &self.config.goods.share),
            &self.config.goods.rate_percent,
            supply,
        );
        let services = TaxBucket::from_basic(
            &(&basic_total * &self.config.services.share),
            &self.config.services.rate_percent,
            supply,
        );

        let grand_total = round_whole(final_amount_inclusive);
        let round_off = &grand_total - (goods.total() + services.total());

        let result = PricingResult {
            basic_total: round_money(&basic_total),
            goods,
            services,
            round_off,
            grand_total,
            supply,
        };
        debug_assert!(result.check_reconciliation().is_ok());

        Ok(result)
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        let config = PricingConfig::default();
        let blended_factor = config.blended_factor();
        Self {
            config,
            blended_factor,
        }
    }
}

/// Price an amount with the default 70/30 split
pub fn compute_pricing(
    final_amount_inclusive: &BigDecimal,
    is_intra_state: bool,
) -> Result<PricingResult, PricingError> {
    PricingEngine::default().compute(final_amount_inclusive, is_intra_state)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalInput {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Accept decimals as strings or numbers. Floats go through their shortest
/// text form so `0.7` becomes exactly `0.7`.
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    match DecimalInput::deserialize(deserializer)? {
        DecimalInput::Text(text) => BigDecimal::from_str(text.trim()).map_err(D::Error::custom),
        DecimalInput::Integer(value) => Ok(BigDecimal::from(value)),
        DecimalInput::Float(value) => {
            BigDecimal::from_str(&value.to_string()).map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_default_blended_factor() {
        assert_eq!(PricingConfig::default().blended_factor(), dec("1.089"));
        assert_eq!(*PricingEngine::default().blended_factor(), dec("1.089"));
    }

    #[test]
    fn test_one_lakh_intra_state() {
        let result = compute_pricing(&BigDecimal::from(100000), true).unwrap();

        assert_eq!(result.basic_total, dec("91827.36"));
        assert_eq!(result.goods.basic_amount, dec("64279.16"));
        assert_eq!(result.goods.tax_rate_percent, BigDecimal::from(5));
        assert_eq!(result.goods.cgst_amount, dec("1606.98"));
        assert_eq!(result.goods.sgst_amount, dec("1606.98"));
        assert_eq!(result.goods.igst_amount, BigDecimal::from(0));
        assert_eq!(result.services.basic_amount, dec("27548.21"));
        assert_eq!(result.services.tax_rate_percent, BigDecimal::from(18));
        assert_eq!(result.services.cgst_amount, dec("2479.34"));
        assert_eq!(result.services.sgst_amount, dec("2479.34"));
        assert_eq!(result.services.igst_amount, BigDecimal::from(0));
        assert_eq!(result.round_off, dec("-0.01"));
        assert_eq!(result.grand_total, BigDecimal::from(100000));
        assert_eq!(result.supply, Supply::IntraState);
        assert!(result.check_reconciliation().is_ok());
    }

    #[test]
    fn test_one_lakh_inter_state() {
        let result = compute_pricing(&BigDecimal::from(100000), false).unwrap();

        assert_eq!(result.goods.igst_amount, dec("3213.96"));
        assert_eq!(result.goods.cgst_amount, BigDecimal::from(0));
        assert_eq!(result.services.igst_amount, dec("4958.68"));
        assert_eq!(result.services.sgst_amount, BigDecimal::from(0));
        assert_eq!(result.total_tax(), dec("8172.64"));
        assert_eq!(result.round_off, dec("-0.01"));
        assert_eq!(result.grand_total, BigDecimal::from(100000));
        assert_eq!(result.supply, Supply::InterState);
    }

    #[test]
    fn test_fractional_amount_rounds_grand_total() {
        let result = compute_pricing(&dec("249999.50"), true).unwrap();
        assert_eq!(result.grand_total, BigDecimal::from(250000));
        assert!(result.check_reconciliation().is_ok());

        let result = compute_pricing(&dec("249999.49"), false).unwrap();
        assert_eq!(result.grand_total, BigDecimal::from(249999));
        assert!(result.check_reconciliation().is_ok());
    }

    #[test]
    fn test_invalid_amounts() {
        for amount in [BigDecimal::from(0), BigDecimal::from(-5), dec("-0.01")] {
            for intra in [true, false] {
                assert!(matches!(
                    compute_pricing(&amount, intra),
                    Err(PricingError::InvalidAmount(_))
                ));
            }
        }
    }

    #[test]
    fn test_small_amount_never_negative() {
        let zero = BigDecimal::from(0);
        let result = compute_pricing(&BigDecimal::from(1), true).unwrap();

        assert!(result.basic_total > zero);
        assert!(result.goods.basic_amount > zero);
        assert!(result.services.basic_amount > zero);
        assert!(result.goods.cgst_amount > zero);
        assert!(result.services.sgst_amount > zero);
        assert_eq!(result.grand_total, BigDecimal::from(1));
        assert!(result.check_reconciliation().is_ok());
    }

    #[test]
    fn test_sub_rupee_amount_rounds_tax_to_zero() {
        for intra in [true, false] {
            let result = compute_pricing(&dec("0.05"), intra).unwrap();

            assert_eq!(result.goods.basic_amount.to_string(), "0.03");
            assert_eq!(result.services.basic_amount.to_string(), "0.01");
            for bucket in [&result.goods, &result.services] {
                assert_eq!(bucket.cgst_amount.to_string(), "0.00");
                assert_eq!(bucket.sgst_amount.to_string(), "0.00");
                assert_eq!(bucket.igst_amount.to_string(), "0.00");
            }
            assert_eq!(result.grand_total.to_string(), "0.00");
            assert_eq!(result.round_off, dec("-0.04"));
            assert!(result.check_reconciliation().is_ok());
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = PricingConfig::default();
        config.services.share = dec("0.31");
        assert!(matches!(
            PricingEngine::new(config),
            Err(PricingError::InvalidConfig(_))
        ));

        let mut config = PricingConfig::default();
        config.goods.share = dec("1.10");
        config.services.share = dec("-0.10");
        assert!(PricingEngine::new(config).is_err());

        let mut config = PricingConfig::default();
        config.goods.rate_percent = BigDecimal::from(120);
        assert!(PricingEngine::new(config).is_err());

        assert!(PricingEngine::new(PricingConfig::default()).is_ok());
    }

    #[test]
    fn test_custom_split() {
        let config = PricingConfig {
            goods: BucketConfig::new(BigDecimal::from(1), BigDecimal::from(12)),
            services: BucketConfig::new(BigDecimal::from(0), BigDecimal::from(18)),
        };
        let engine = PricingEngine::new(config).unwrap();
        assert_eq!(*engine.blended_factor(), dec("1.12"));

        let result = engine.compute(&BigDecimal::from(1120), false).unwrap();
        assert_eq!(result.goods.basic_amount, BigDecimal::from(1000));
        assert_eq!(result.goods.igst_amount, BigDecimal::from(120));
        assert_eq!(result.services.basic_amount, BigDecimal::from(0));
        assert_eq!(result.services.tax_amount(), BigDecimal::from(0));
        assert_eq!(result.round_off, BigDecimal::from(0));
    }

    #[test]
    fn test_config_accepts_numbers_and_strings() {
        let config: PricingConfig = serde_json::from_str(
            r#"{
                "goods": { "share": 0.7, "rate_percent": 5 },
                "services": { "share": "0.30", "rate_percent": 18.0 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.goods.share, dec("0.7"));
        assert_eq!(config.services.rate_percent, BigDecimal::from(18));
        assert_eq!(config.blended_factor(), dec("1.089"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reconciliation_check_detects_drift() {
        let mut result = compute_pricing(&BigDecimal::from(50000), true).unwrap();
        result.round_off = &result.round_off + dec("0.01");
        assert!(matches!(
            result.check_reconciliation(),
            Err(PricingError::ReconciliationInvariant(_))
        ));
    }
}
