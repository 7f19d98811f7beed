//! Input sanity checks for calibration data typed as text

use serde::Serialize;

use super::point::parse_number;

pub const INVALID_REFERENCE: &str = "Valor de referência deve ser um número válido";
pub const INVALID_MEASURED: &str = "Valor medido deve ser um número válido";
pub const INVALID_UNCERTAINTY: &str = "Incerteza deve ser um número válido maior ou igual a zero";
pub const INVALID_ERROR_LIMIT: &str = "Erro máximo admissível (EMA) deve ser um número maior que zero";

/// Outcome of [`validate_calibration_data`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalibrationValidation {
    pub is_valid: bool,
    /// Every violated rule, in field order
    pub errors: Vec<String>,
}

/// Check raw inputs before they reach the arithmetic
///
/// Reference and measured values may have any sign, uncertainty must be
/// >= 0 and the error limit > 0. All violations are reported, not just
/// the first. Non-finite values (NaN, inf) are rejected.
pub fn validate_calibration_data(
    reference_value: &str,
    measured_value: &str,
    uncertainty: &str,
    error_limit: &str,
) -> CalibrationValidation {
    let mut errors = Vec::new();

    if finite(reference_value).is_none() {
        errors.push(INVALID_REFERENCE.to_string());
    }
    if finite(measured_value).is_none() {
        errors.push(INVALID_MEASURED.to_string());
    }
    if !finite(uncertainty).is_some_and(|u| u >= 0.0) {
        errors.push(INVALID_UNCERTAINTY.to_string());
    }
    if !finite(error_limit).is_some_and(|l| l > 0.0) {
        errors.push(INVALID_ERROR_LIMIT.to_string());
    }

    CalibrationValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn finite(text: &str) -> Option<f64> {
    parse_number(text).filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_data() {
        let v = validate_calibration_data("100.0000", "100.05", "0.02", "0.10");
        assert!(v.is_valid);
        assert!(v.errors.is_empty());
    }

    #[test]
    fn test_non_numeric_reference() {
        let v = validate_calibration_data("abc", "100", "0.02", "0.1");
        assert!(!v.is_valid);
        assert_eq!(v.errors, vec![INVALID_REFERENCE.to_string()]);
        assert!(v.errors[0].contains("referência"));
    }

    #[test]
    fn test_negative_uncertainty() {
        let v = validate_calibration_data("100", "100", "-1", "0.1");
        assert!(!v.is_valid);
        assert_eq!(v.errors, vec![INVALID_UNCERTAINTY.to_string()]);
    }

    #[test]
    fn test_zero_uncertainty_allowed_zero_limit_rejected() {
        let v = validate_calibration_data("1", "1", "0", "0");
        assert_eq!(v.errors, vec![INVALID_ERROR_LIMIT.to_string()]);
    }

    #[test]
    fn test_errors_accumulate() {
        let v = validate_calibration_data("x", "", "-0.5", "-2");
        assert!(!v.is_valid);
        assert_eq!(v.errors.len(), 4);
        assert_eq!(v.errors[0], INVALID_REFERENCE);
        assert_eq!(v.errors[3], INVALID_ERROR_LIMIT);
    }

    #[test]
    fn test_negative_values_and_decimal_comma() {
        let v = validate_calibration_data("-20,5", "-20,48", "0,01", "0,05");
        assert!(v.is_valid);
    }

    #[test]
    fn test_non_finite_rejected() {
        let v = validate_calibration_data("NaN", "inf", "0.1", "1");
        assert_eq!(v.errors.len(), 2);
    }
}
