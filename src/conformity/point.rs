//! Calibration points and the per-point decision rule

use serde::{Deserialize, Serialize};

/// Decimal places kept for a calculated error
pub const ERROR_DECIMALS: i32 = 4;

/// Origin of a point's conformity flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointSource {
    /// Calculated from the decision rule
    Auto,
    /// Set by the reviewer, overriding the decision rule
    Manual,
}

impl Default for PointSource {
    fn default() -> Self {
        PointSource::Auto
    }
}

impl std::fmt::Display for PointSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointSource::Auto => write!(f, "auto"),
            PointSource::Manual => write!(f, "manual"),
        }
    }
}

/// Raw measurement inputs for a single calibration point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointInput {
    /// Point label as printed on the certificate (e.g. "P1", "25%")
    pub point: String,

    /// Value indicated by the reference standard
    pub reference_value: f64,

    /// Value indicated by the instrument under calibration
    pub measured_value: f64,

    /// Expanded uncertainty (k=2)
    pub uncertainty: f64,

    /// Maximum permissible error (EMA)
    pub error_limit: f64,
}

/// An evaluated calibration point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Point label as printed on the certificate
    pub point: String,

    /// Value indicated by the reference standard
    pub reference_value: f64,

    /// Value indicated by the instrument under calibration
    pub measured_value: f64,

    /// measured - reference, rounded to four decimal places
    #[serde(default)]
    pub error: f64,

    /// Expanded uncertainty (k=2)
    pub uncertainty: f64,

    /// Maximum permissible error (EMA)
    pub error_limit: f64,

    /// Whether |error| + uncertainty <= error_limit (or the manual verdict)
    #[serde(default)]
    pub ok: bool,

    /// Whether `ok` was calculated or set by the reviewer
    #[serde(default)]
    pub source: PointSource,

    /// Reviewer justification for a manual verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

impl CalibrationPoint {
    /// Recompute error and verdict from the raw inputs, dropping any manual verdict
    pub fn recalculate(&mut self) {
        self.error = calculate_error(self.measured_value, self.reference_value);
        self.ok = evaluate_point_conformity(self.error, self.uncertainty, self.error_limit);
        self.source = PointSource::Auto;
        self.justification = None;
    }

    /// Recompute the error, and the verdict unless it was set manually
    pub fn refresh(&mut self) {
        if self.is_auto_calculated() {
            self.recalculate();
        } else {
            self.error = calculate_error(self.measured_value, self.reference_value);
        }
    }

    /// Replace the calculated verdict with a reviewer decision
    pub fn override_status(&mut self, ok: bool, justification: impl Into<String>) {
        self.ok = ok;
        self.source = PointSource::Manual;
        self.justification = Some(justification.into());
    }

    /// Is the verdict the one the decision rule gives?
    pub fn is_auto_calculated(&self) -> bool {
        self.source == PointSource::Auto
    }

    /// Remaining budget: error_limit - (|error| + uncertainty)
    ///
    /// Negative when the point is non-conforming under the decision rule.
    pub fn margin(&self) -> f64 {
        round4(self.error_limit - (self.error.abs() + self.uncertainty))
    }

    /// Whether the stored error and flag disagree with a fresh calculation
    ///
    /// Manual verdicts only have their error checked.
    pub fn is_stale(&self) -> bool {
        let error = calculate_error(self.measured_value, self.reference_value);
        if !same_value(error, self.error) {
            return true;
        }
        self.is_auto_calculated()
            && evaluate_point_conformity(error, self.uncertainty, self.error_limit) != self.ok
    }
}

fn same_value(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

/// Round half away from zero to [`ERROR_DECIMALS`] places
///
/// Magnitudes too large to carry a fractional part at that precision are
/// returned unchanged, so the scaling never overflows.
pub fn round4(value: f64) -> f64 {
    let factor = 10f64.powi(ERROR_DECIMALS);
    if value.abs() >= 2f64.powi(f64::MANTISSA_DIGITS as i32 - 1) / factor {
        return value;
    }
    (value * factor).round() / factor
}

/// Measurement error: `measured - reference`, rounded to four decimal places
pub fn calculate_error(measured: f64, reference: f64) -> f64 {
    round4(measured - reference)
}

/// Decision rule: conforming iff `|error| + uncertainty <= error_limit`
///
/// Equality conforms. Any NaN operand yields `false`.
pub fn evaluate_point_conformity(error: f64, uncertainty: f64, error_limit: f64) -> bool {
    error.abs() + uncertainty <= error_limit
}

/// Evaluate one calibration point from raw inputs
pub fn process_calibration_point(
    point: impl Into<String>,
    reference: f64,
    measured: f64,
    uncertainty: f64,
    error_limit: f64,
) -> CalibrationPoint {
    let error = calculate_error(measured, reference);
    CalibrationPoint {
        point: point.into(),
        reference_value: reference,
        measured_value: measured,
        error,
        uncertainty,
        error_limit,
        ok: evaluate_point_conformity(error, uncertainty, error_limit),
        source: PointSource::Auto,
        justification: None,
    }
}

/// Evaluate a sequence of points, preserving order and count
pub fn process_calibration_points(inputs: &[PointInput]) -> Vec<CalibrationPoint> {
    inputs
        .iter()
        .map(|p| {
            process_calibration_point(
                p.point.clone(),
                p.reference_value,
                p.measured_value,
                p.uncertainty,
                p.error_limit,
            )
        })
        .collect()
}

/// Parse a number as typed on a certificate form
///
/// Accepts a decimal comma ("100,05") when no dot is present. Text that is
/// not a number yields NaN, which then propagates through the arithmetic.
pub fn parse_measurement(text: &str) -> f64 {
    parse_number(text).unwrap_or(f64::NAN)
}

pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };
    normalized.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_error_rounds_to_four_places() {
        assert_eq!(calculate_error(100.05, 100.0), 0.05);
        assert_eq!(calculate_error(100.09, 100.0), 0.09);
        assert_eq!(calculate_error(10.123456, 10.0), 0.1235);
        assert_eq!(calculate_error(9.876544, 10.0), -0.1235);
    }

    #[test]
    fn test_round4_half_away_from_zero() {
        assert_eq!(round4(0.00005), 0.0001);
        assert_eq!(round4(-0.00005), -0.0001);
        assert_eq!(round4(1.23444), 1.2344);
    }

    #[test]
    fn test_round4_keeps_huge_finite_values() {
        assert_eq!(round4(1e305), 1e305);
        assert_eq!(round4(-f64::MAX), -f64::MAX);
        assert_eq!(calculate_error(1e305, 0.0), 1e305);

        let p = process_calibration_point("P1", 0.0, 1e305, 0.0, 1e306);
        assert!(p.error.is_finite());
        assert!(p.ok);
    }

    #[test]
    fn test_conformity_boundary_is_inclusive() {
        // exactly representable: 0.5 + 0.25 == 0.75
        assert!(evaluate_point_conformity(0.5, 0.25, 0.75));
        assert!(evaluate_point_conformity(-0.5, 0.25, 0.75));
        assert!(!evaluate_point_conformity(0.5, 0.25, 0.7));
    }

    #[test]
    fn test_conforming_point() {
        let p = process_calibration_point("P1", 100.0, 100.05, 0.02, 0.10);
        assert_eq!(p.error, 0.05);
        assert!(p.ok);
        assert!(p.is_auto_calculated());
    }

    #[test]
    fn test_non_conforming_point() {
        let p = process_calibration_point("P2", 100.0, 100.09, 0.02, 0.10);
        assert_eq!(p.error, 0.09);
        assert!(!p.ok);
        assert!(p.margin() < 0.0);
    }

    #[test]
    fn test_point_verdict_matches_rule() {
        let cases = [
            (0.0, 1.2, 0.3, 1.0),
            (50.0, 49.7, 0.1, 0.5),
            (-20.0, -20.4, 0.05, 0.4),
            (4.0, 4.0, 0.0, 0.01),
        ];
        for (r, m, u, l) in cases {
            let p = process_calibration_point("X", r, m, u, l);
            assert_eq!(p.ok, evaluate_point_conformity(calculate_error(m, r), u, l));
        }
    }

    #[test]
    fn test_process_points_preserves_order() {
        let inputs: Vec<PointInput> = ["P3", "P1", "P2"]
            .iter()
            .enumerate()
            .map(|(i, label)| PointInput {
                point: label.to_string(),
                reference_value: i as f64 * 10.0,
                measured_value: i as f64 * 10.0 + 0.01,
                uncertainty: 0.01,
                error_limit: 0.1,
            })
            .collect();

        let points = process_calibration_points(&inputs);
        let labels: Vec<&str> = points.iter().map(|p| p.point.as_str()).collect();
        assert_eq!(labels, vec!["P3", "P1", "P2"]);
        assert!(process_calibration_points(&[]).is_empty());
    }

    #[test]
    fn test_processing_is_deterministic() {
        let a = process_calibration_point("P1", 12.3456, 12.4, 0.013, 0.05);
        let b = process_calibration_point("P1", 12.3456, 12.4, 0.013, 0.05);
        assert_eq!(a, b);
        assert_eq!(a.error.to_bits(), b.error.to_bits());
    }

    #[test]
    fn test_override_and_recalculate() {
        let mut p = process_calibration_point("P2", 100.0, 100.09, 0.02, 0.10);
        p.override_status(true, "Ponto fora da faixa de uso");
        assert!(p.ok);
        assert_eq!(p.source, PointSource::Manual);
        assert!(!p.is_stale());

        p.recalculate();
        assert!(!p.ok);
        assert_eq!(p.source, PointSource::Auto);
        assert!(p.justification.is_none());
    }

    #[test]
    fn test_stale_detection() {
        let mut p = process_calibration_point("P1", 100.0, 100.05, 0.02, 0.10);
        assert!(!p.is_stale());
        p.measured_value = 100.2;
        assert!(p.is_stale());
    }

    #[test]
    fn test_parse_measurement() {
        assert_eq!(parse_measurement("100,05"), 100.05);
        assert_eq!(parse_measurement(" -3.5 "), -3.5);
        assert!(parse_measurement("abc").is_nan());
        assert!(parse_measurement("").is_nan());
    }

    #[test]
    fn test_nan_propagates_to_non_conforming() {
        let p = process_calibration_point("P1", parse_measurement("abc"), 100.0, 0.02, 0.1);
        assert!(p.error.is_nan());
        assert!(!p.ok);
    }

    #[test]
    fn test_point_yaml_roundtrip() {
        let p = process_calibration_point("P1", 100.0, 100.05, 0.02, 0.10);
        let yaml = serde_yml::to_string(&p).unwrap();
        assert!(yaml.contains("source: auto"));
        assert!(!yaml.contains("justification"));

        let parsed: CalibrationPoint = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed, p);
    }
}
