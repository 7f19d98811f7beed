//! Calibration analysis: ranges, points, assessment and recommendation

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::assessment::{generate_conformity_assessment, ConformityAssessment};
use super::point::CalibrationPoint;

/// A declared range of an instrument
///
/// No ordering is enforced between `min` and `max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRange {
    pub min: f64,
    pub max: f64,
    pub unit: String,
}

impl CalibrationRange {
    pub fn new(min: f64, max: f64, unit: impl Into<String>) -> Self {
        Self {
            min,
            max,
            unit: unit.into(),
        }
    }

    /// Whether `other` lies entirely within this range
    pub fn contains(&self, other: &CalibrationRange) -> bool {
        other.min >= self.min && other.max <= self.max
    }
}

impl std::fmt::Display for CalibrationRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} a {} {}", self.min, self.max, self.unit)
    }
}

/// Action suggested by the analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum Recommendation {
    /// No points were supplied
    NoData,
    /// Every point conforms
    NoAction,
    /// Non-conformities sit below the lowest conforming point
    NarrowOperationalRange { min: f64, unit: String },
    /// Some points fail but narrowing the lower bound does not help
    ReviewNonConformities,
    /// No point conforms
    Recalibrate,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::NoData => {
                write!(f, "Sem pontos de calibração para avaliar.")
            }
            Recommendation::NoAction => write!(
                f,
                "Instrumento conforme em toda a faixa calibrada; nenhuma ação necessária."
            ),
            Recommendation::NarrowOperationalRange { min, unit } => write!(
                f,
                "Recomenda-se restringir a faixa operacional a partir de {} {}, menor valor de referência entre os pontos conformes.",
                min, unit
            ),
            Recommendation::ReviewNonConformities => write!(
                f,
                "Avaliar os pontos não conformes quanto ao impacto na faixa operacional e considerar ajuste do instrumento."
            ),
            Recommendation::Recalibrate => write!(
                f,
                "Nenhum ponto conforme: instrumento deve ser ajustado e recalibrado antes do uso."
            ),
        }
    }
}

/// Ranges, evaluated points and their assessment, bundled for review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationAnalysis {
    pub calibration_range: CalibrationRange,
    pub operational_range: CalibrationRange,
    pub points: Vec<CalibrationPoint>,
    pub assessment: ConformityAssessment,
    pub recommendation: Recommendation,
    pub operational_within_calibration: bool,
}

/// Bundle evaluated points with range metadata
///
/// `operational_range` defaults to the calibration range.
pub fn generate_calibration_analysis(
    points: Vec<CalibrationPoint>,
    calibration_range: CalibrationRange,
    operational_range: Option<CalibrationRange>,
) -> CalibrationAnalysis {
    let operational_range = operational_range.unwrap_or_else(|| calibration_range.clone());
    let assessment = generate_conformity_assessment(&points);
    let recommendation = recommend(&points, &operational_range.unit);
    let operational_within_calibration = calibration_range.contains(&operational_range);

    debug!(
        points = points.len(),
        non_conforming = assessment.non_conforming_points,
        ?recommendation,
        "generated calibration analysis"
    );

    CalibrationAnalysis {
        calibration_range,
        operational_range,
        points,
        assessment,
        recommendation,
        operational_within_calibration,
    }
}

/// One-sided range tightening: if a failure sits below every conforming
/// reference value, start the operational range at the lowest conforming one.
fn recommend(points: &[CalibrationPoint], unit: &str) -> Recommendation {
    let (conforming, non_conforming): (Vec<&CalibrationPoint>, Vec<&CalibrationPoint>) =
        points.iter().partition(|p| p.ok);

    if points.is_empty() {
        return Recommendation::NoData;
    }
    if non_conforming.is_empty() {
        return Recommendation::NoAction;
    }
    if conforming.is_empty() {
        return Recommendation::Recalibrate;
    }

    let min_conforming = conforming
        .iter()
        .map(|p| p.reference_value)
        .fold(f64::INFINITY, f64::min);

    if non_conforming
        .iter()
        .any(|p| p.reference_value < min_conforming)
    {
        Recommendation::NarrowOperationalRange {
            min: min_conforming,
            unit: unit.to_string(),
        }
    } else {
        Recommendation::ReviewNonConformities
    }
}
