//! Conformity assessment over a set of evaluated points

use serde::{Deserialize, Serialize};

use super::point::CalibrationPoint;

/// Decision rule as printed on reports
pub const DECISION_RULE: &str = "|Erro| + U ≤ EMA";

/// Narrative explanation of [`DECISION_RULE`]
pub const DECISION_RULE_DESCRIPTION: &str = "Um ponto de calibração é considerado conforme quando o módulo do erro somado à incerteza expandida não excede o erro máximo admissível (EMA), conforme regra de decisão da ABNT NBR ISO/IEC 17025.";

/// Confidence statement attached to every assessment
pub const CONFIDENCE_STATEMENT: &str = "Incerteza expandida declarada com fator de abrangência k=2, correspondente a um nível de confiança de aproximadamente 95%.";

/// Overall outcome of an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConformityStatus {
    /// Every point conforms
    Conforming,
    /// At least one point does not conform
    NonConforming,
    /// No points to assess
    NoData,
}

impl std::fmt::Display for ConformityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConformityStatus::Conforming => write!(f, "conforming"),
            ConformityStatus::NonConforming => write!(f, "non_conforming"),
            ConformityStatus::NoData => write!(f, "no_data"),
        }
    }
}

/// Aggregate derived from a list of calibration points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformityAssessment {
    pub total_points: usize,
    pub conforming_points: usize,
    pub non_conforming_points: usize,

    /// Labels of non-conforming points, in original order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_conforming_labels: Vec<String>,

    pub status: ConformityStatus,
    pub summary: String,
    pub decision_rule: String,
    pub decision_rule_description: String,
    pub confidence_level: String,
}

impl ConformityAssessment {
    pub fn is_conforming(&self) -> bool {
        self.status == ConformityStatus::Conforming
    }
}

/// Partition points by their `ok` flag and summarize
pub fn generate_conformity_assessment(points: &[CalibrationPoint]) -> ConformityAssessment {
    let non_conforming_labels: Vec<String> = points
        .iter()
        .filter(|p| !p.ok)
        .map(|p| p.point.clone())
        .collect();

    let total_points = points.len();
    let non_conforming_points = non_conforming_labels.len();
    let conforming_points = total_points - non_conforming_points;

    let (status, summary) = if total_points == 0 {
        (
            ConformityStatus::NoData,
            "Nenhum ponto de calibração informado.".to_string(),
        )
    } else if non_conforming_points == 0 {
        (
            ConformityStatus::Conforming,
            format!(
                "Todos os {} pontos de calibração estão conformes.",
                total_points
            ),
        )
    } else {
        (
            ConformityStatus::NonConforming,
            format!(
                "{} de {} pontos conformes. Pontos não conformes: {}.",
                conforming_points,
                total_points,
                non_conforming_labels.join(", ")
            ),
        )
    };

    ConformityAssessment {
        total_points,
        conforming_points,
        non_conforming_points,
        non_conforming_labels,
        status,
        summary,
        decision_rule: DECISION_RULE.to_string(),
        decision_rule_description: DECISION_RULE_DESCRIPTION.to_string(),
        confidence_level: CONFIDENCE_STATEMENT.to_string(),
    }
}
