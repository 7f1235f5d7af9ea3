//! GST (Goods and Services Tax) rate splitting for Indian tax compliance

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::tax::pricing::PricingError;

/// Whether a supply stays within the seller's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Supply {
    /// Same state: tax is levied as CGST + SGST
    IntraState,
    /// Different state: tax is levied as IGST
    InterState,
}

impl Supply {
    pub fn from_intra_state(is_intra_state: bool) -> Self {
        if is_intra_state {
            Supply::IntraState
        } else {
            Supply::InterState
        }
    }

    pub fn is_intra_state(&self) -> bool {
        matches!(self, Supply::IntraState)
    }
}

/// GST rate structure for one tax bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstRate {
    /// Total GST rate percentage (e.g., 18 for 18%)
    pub total_rate: BigDecimal,
    /// CGST rate percentage (Central GST)
    pub cgst_rate: BigDecimal,
    /// SGST rate percentage (State GST)
    pub sgst_rate: BigDecimal,
    /// IGST rate percentage (Integrated GST)
    pub igst_rate: BigDecimal,
}

impl GstRate {
    /// Split a total rate for the given supply
    pub fn for_supply(total_rate: BigDecimal, supply: Supply) -> Self {
        match supply {
            Supply::IntraState => Self::intra_state(total_rate),
            Supply::InterState => Self::inter_state(total_rate),
        }
    }

    /// CGST and SGST each take half of the rate
    pub fn intra_state(total_rate: BigDecimal) -> Self {
        let half_rate = &total_rate / BigDecimal::from(2);
        Self {
            total_rate,
            cgst_rate: half_rate.clone(),
            sgst_rate: half_rate,
            igst_rate: BigDecimal::from(0),
        }
    }

    /// IGST takes the whole rate
    pub fn inter_state(total_rate: BigDecimal) -> Self {
        Self {
            total_rate: total_rate.clone(),
            cgst_rate: BigDecimal::from(0),
            sgst_rate: BigDecimal::from(0),
            igst_rate: total_rate,
        }
    }

    /// Validate that the GST rate structure is correct
    pub fn validate(&self) -> Result<(), PricingError> {
        let zero = BigDecimal::from(0);
        let calculated_total = &self.cgst_rate + &self.sgst_rate + &self.igst_rate;

        if calculated_total != self.total_rate {
            return Err(PricingError::InvalidConfig(format!(
                "GST components don't add up to total rate: {} != {}",
                calculated_total, self.total_rate
            )));
        }

        if self.total_rate < zero || self.total_rate >= BigDecimal::from(100) {
            return Err(PricingError::InvalidConfig(format!(
                "GST rate must be between 0 and 100 percent, got {}",
                self.total_rate
            )));
        }

        if self.igst_rate == zero && self.cgst_rate != self.sgst_rate {
            return Err(PricingError::InvalidConfig(
                "CGST and SGST must be equal for intra-state supply".to_string(),
            ));
        }

        if self.igst_rate > zero && (self.cgst_rate > zero || self.sgst_rate > zero) {
            return Err(PricingError::InvalidConfig(
                "Only IGST applies to inter-state supply".to_string(),
            ));
        }

        Ok(())
    }

    /// Multiplier that turns a basic amount into a GST-inclusive amount (1.18 for 18%)
    pub fn inclusive_factor(&self) -> BigDecimal {
        BigDecimal::from(1) + &self.total_rate / BigDecimal::from(100)
    }
}

/// Unrounded tax levied on one basic amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstComponents {
    pub cgst_amount: BigDecimal,
    pub sgst_amount: BigDecimal,
    pub igst_amount: BigDecimal,
}

impl GstComponents {
    /// Apply a rate to a basic amount at full precision
    pub fn compute(basic_amount: &BigDecimal, rate: &GstRate) -> Self {
        Self {
            cgst_amount: (basic_amount * &rate.cgst_rate) / BigDecimal::from(100),
            sgst_amount: (basic_amount * &rate.sgst_rate) / BigDecimal::from(100),
            igst_amount: (basic_amount * &rate.igst_rate) / BigDecimal::from(100),
        }
    }

    pub fn total(&self) -> BigDecimal {
        &self.cgst_amount + &self.sgst_amount + &self.igst_amount
    }
}
