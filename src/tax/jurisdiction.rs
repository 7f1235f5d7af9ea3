//! Place-of-supply resolution

use crate::tax::gst::Supply;

/// Normalise a state name for comparison: trimmed, single-spaced, lowercase
pub fn normalize_state(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl Supply {
    /// Decide intra- vs inter-state supply by comparing the customer's place
    /// of supply with the seller's home state. A blank place of supply falls
    /// back to the seller's state.
    pub fn resolve(home_state: &str, place_of_supply: &str) -> Self {
        let place = normalize_state(place_of_supply);
        if place.is_empty() || place == normalize_state(home_state) {
            Supply::IntraState
        } else {
            Supply::InterState
        }
    }
}
