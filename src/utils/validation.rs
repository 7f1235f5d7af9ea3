//! Validation utilities

use crate::types::*;

/// Longest segment code accepted in configuration
pub const MAX_SEGMENT_CODE_LEN: usize = 8;

/// Validate the shape of a segment code: 1-8 uppercase ASCII letters or digits.
/// Dashes are reserved as the separator inside document numbers.
pub fn validate_segment_code(code: &str) -> NumberingResult<()> {
    if code.is_empty() {
        return Err(NumberingError::InvalidSegmentCode(
            "Segment code cannot be empty".to_string(),
        ));
    }

    if code.len() > MAX_SEGMENT_CODE_LEN {
        return Err(NumberingError::InvalidSegmentCode(format!(
            "Segment code '{}' cannot exceed {} characters",
            code, MAX_SEGMENT_CODE_LEN
        )));
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(NumberingError::InvalidSegmentCode(format!(
            "Segment code '{}' can only contain uppercase letters and digits",
            code
        )));
    }

    Ok(())
}

/// Validate a state name used for place-of-supply comparison
pub fn validate_state_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("State name cannot be empty".to_string());
    }

    if name.len() > 100 {
        return Err("State name cannot exceed 100 characters".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_codes() {
        for ok in ["RES", "COM", "IND", "INST", "PROD", "B2B", "ABCDEFGH"] {
            assert!(validate_segment_code(ok).is_ok(), "{}", ok);
        }
        for bad in ["", "res", "RE-S", "R S", "ABCDEFGHI"] {
            assert!(validate_segment_code(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_state_names() {
        assert!(validate_state_name("Tamil Nadu").is_ok());
        assert!(validate_state_name("   ").is_err());
    }
}
