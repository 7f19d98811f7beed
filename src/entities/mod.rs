//! Record types kept in the store
//!
//! - [`AnalysisRecord`] - critical analysis of one calibration certificate

pub mod analysis;

pub use analysis::{
    AnalysisRecord, CertificateInfo, ChecklistAnswer, Conclusion, CriticalAnalysisChecklist,
    EnvironmentalConditions, InstrumentInfo, ReferenceStandard, RegulatoryRequirements,
};
