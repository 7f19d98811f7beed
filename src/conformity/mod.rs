//! Conformity evaluation of calibration results
//!
//! Stateless functions that compute the error of each calibration point,
//! apply the decision rule `|Erro| + U ≤ EMA` and summarize the result:
//!
//! - [`point`] - error calculation and per-point verdict
//! - [`assessment`] - conforming / non-conforming partition
//! - [`analysis`] - ranges, assessment and range recommendation
//! - [`export`] - fixed-shape JSON export
//! - [`validate`] - sanity checks for text inputs

pub mod analysis;
pub mod assessment;
pub mod export;
pub mod point;
pub mod validate;

pub use analysis::{
    generate_calibration_analysis, CalibrationAnalysis, CalibrationRange, Recommendation,
};
pub use assessment::{
    generate_conformity_assessment, ConformityAssessment, ConformityStatus, CONFIDENCE_STATEMENT,
    DECISION_RULE,
};
pub use export::export_calibration_analysis_to_json;
pub use point::{
    calculate_error, evaluate_point_conformity, parse_measurement, process_calibration_point,
    process_calibration_points, round4, CalibrationPoint, PointInput, PointSource,
};
pub use validate::{validate_calibration_data, CalibrationValidation};
