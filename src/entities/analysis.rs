//! Analysis record - critical analysis of one calibration certificate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::conformity::{
    generate_calibration_analysis, generate_conformity_assessment, CalibrationAnalysis,
    CalibrationPoint, CalibrationRange, ConformityAssessment,
};
use crate::core::entity::{Entity, ReviewStatus};
use crate::core::identity::RecordId;
use crate::reference::{Category, MeasurementApplication, ReferenceRow, ReferenceTables};

/// Data identifying the calibration certificate under review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// Certificate number as printed by the laboratory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    /// Calibration laboratory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laboratory: Option<String>,

    /// Accreditation number (e.g. "CAL 0123")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accreditation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_date: Option<NaiveDate>,

    /// Where the calibration was performed (laboratory or field)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Calibration procedure reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,

    /// Person who signed the certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatory: Option<String>,
}

/// The calibrated instrument
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    /// Plant tag (e.g. "FT-101")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Instrument type, matched against the regulatory tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<MeasurementApplication>,

    /// Installation or measurement point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
}

impl InstrumentInfo {
    /// Text used to query the regulatory tables
    pub fn lookup_query(&self) -> Option<&str> {
        self.instrument_type
            .as_deref()
            .or(self.description.as_deref())
            .filter(|q| !q.trim().is_empty())
    }
}

/// Environmental conditions reported on the certificate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atmospheric_pressure: Option<String>,
}

/// A reference standard used by the laboratory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStandard {
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification: Option<String>,

    /// Calibration certificate of the standard itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,

    /// Traceability chain (e.g. "RBC / INMETRO")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceability: Option<String>,
}

impl ReferenceStandard {
    /// Whether the standard's own calibration had lapsed on `date`
    pub fn expired_on(&self, date: NaiveDate) -> bool {
        self.valid_until.is_some_and(|until| until < date)
    }
}

/// Regulatory budget the instrument is held to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryRequirements {
    /// Maximum uncertainty (e.g. "0.3 %")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uncertainty: Option<String>,

    /// Calibration interval (e.g. "60 dias")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_interval: Option<String>,

    /// Table rows the values came from (e.g. "calibration#4")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<String>,
}

impl RegulatoryRequirements {
    /// Fill from the first matching rows of the regulatory tables
    ///
    /// Component uncertainty is matched on the instrument type; when no
    /// component row matches, the first system row for the instrument's
    /// application is used instead.
    pub fn prefill(tables: &ReferenceTables, instrument: &InstrumentInfo) -> Self {
        let mut requirements = Self::default();
        let category = instrument.category;
        let query = instrument.lookup_query().unwrap_or_default();

        if let Some(row) = tables.max_uncertainty_component(category, query) {
            requirements.max_uncertainty = Some(row.requirement());
            requirements
                .source
                .push(format!("component-uncertainty#{}", row.id));
        } else if let Some(application) = instrument.application {
            if let Some(row) = tables.system_uncertainty.iter().find(|r| {
                r.application == application && category.is_none_or(|c| r.category == c)
            }) {
                requirements.max_uncertainty = Some(row.requirement());
                requirements
                    .source
                    .push(format!("system-uncertainty#{}", row.id));
            }
        }

        if let Some(row) = tables.calibration_periodicity(category, query) {
            requirements.calibration_interval = Some(row.requirement());
            requirements.source.push(format!("calibration#{}", row.id));
        }

        requirements
    }

    pub fn is_empty(&self) -> bool {
        self.max_uncertainty.is_none() && self.calibration_interval.is_none()
    }
}

/// Answer to a checklist question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistAnswer {
    Yes,
    No,
    NotApplicable,
}

impl std::fmt::Display for ChecklistAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecklistAnswer::Yes => write!(f, "yes"),
            ChecklistAnswer::No => write!(f, "no"),
            ChecklistAnswer::NotApplicable => write!(f, "not_applicable"),
        }
    }
}

impl std::str::FromStr for ChecklistAnswer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "yes" | "y" | "sim" | "s" => Ok(ChecklistAnswer::Yes),
            "no" | "n" | "nao" | "não" => Ok(ChecklistAnswer::No),
            "not_applicable" | "na" | "n/a" => Ok(ChecklistAnswer::NotApplicable),
            _ => Err(format!(
                "Invalid answer: {}. Use yes, no, or not_applicable",
                s
            )),
        }
    }
}

/// Critical-analysis questions asked of every certificate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalAnalysisChecklist {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accredited_laboratory: Option<ChecklistAnswer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_covers_range: Option<ChecklistAnswer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceability_stated: Option<ChecklistAnswer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty_stated: Option<ChecklistAnswer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_factor_stated: Option<ChecklistAnswer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_recorded: Option<ChecklistAnswer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_cover_operational_range: Option<ChecklistAnswer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_matches: Option<ChecklistAnswer>,

    /// As-found results reported when the instrument was adjusted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_before_adjustment: Option<ChecklistAnswer>,
}

impl CriticalAnalysisChecklist {
    /// Every question as (key, Portuguese label, answer)
    pub fn items(&self) -> [(&'static str, &'static str, Option<ChecklistAnswer>); 9] {
        [
            (
                "accredited_laboratory",
                "Laboratório acreditado na RBC",
                self.accredited_laboratory,
            ),
            (
                "scope_covers_range",
                "Escopo de acreditação cobre a faixa calibrada",
                self.scope_covers_range,
            ),
            (
                "traceability_stated",
                "Rastreabilidade dos padrões declarada",
                self.traceability_stated,
            ),
            (
                "uncertainty_stated",
                "Incerteza de medição declarada",
                self.uncertainty_stated,
            ),
            (
                "coverage_factor_stated",
                "Fator de abrangência e nível de confiança declarados",
                self.coverage_factor_stated,
            ),
            (
                "environment_recorded",
                "Condições ambientais registradas",
                self.environment_recorded,
            ),
            (
                "points_cover_operational_range",
                "Pontos de calibração cobrem a faixa operacional",
                self.points_cover_operational_range,
            ),
            (
                "identification_matches",
                "Identificação do instrumento confere",
                self.identification_matches,
            ),
            (
                "results_before_adjustment",
                "Resultados antes do ajuste informados",
                self.results_before_adjustment,
            ),
        ]
    }

    /// Keys of unanswered questions
    pub fn pending(&self) -> Vec<&'static str> {
        self.items()
            .into_iter()
            .filter(|(_, _, answer)| answer.is_none())
            .map(|(key, _, _)| key)
            .collect()
    }

    /// Keys of questions answered `no`
    pub fn failed(&self) -> Vec<&'static str> {
        self.items()
            .into_iter()
            .filter(|(_, _, answer)| *answer == Some(ChecklistAnswer::No))
            .map(|(key, _, _)| key)
            .collect()
    }

    /// Set one answer by key
    pub fn set(&mut self, key: &str, answer: ChecklistAnswer) -> Result<(), String> {
        let slot = match key.replace('-', "_").as_str() {
            "accredited_laboratory" => &mut self.accredited_laboratory,
            "scope_covers_range" => &mut self.scope_covers_range,
            "traceability_stated" => &mut self.traceability_stated,
            "uncertainty_stated" => &mut self.uncertainty_stated,
            "coverage_factor_stated" => &mut self.coverage_factor_stated,
            "environment_recorded" => &mut self.environment_recorded,
            "points_cover_operational_range" => &mut self.points_cover_operational_range,
            "identification_matches" => &mut self.identification_matches,
            "results_before_adjustment" => &mut self.results_before_adjustment,
            _ => return Err(format!("Unknown checklist item: {}", key)),
        };
        *slot = Some(answer);
        Ok(())
    }
}

/// Reviewer's final decision on the certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Accepted,
    AcceptedWithRestrictions,
    Rejected,
}

impl std::fmt::Display for Conclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conclusion::Accepted => write!(f, "accepted"),
            Conclusion::AcceptedWithRestrictions => write!(f, "accepted_with_restrictions"),
            Conclusion::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for Conclusion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "accepted" | "accept" => Ok(Conclusion::Accepted),
            "accepted_with_restrictions" | "restricted" => Ok(Conclusion::AcceptedWithRestrictions),
            "rejected" | "reject" => Ok(Conclusion::Rejected),
            _ => Err(format!(
                "Invalid conclusion: {}. Use accepted, accepted_with_restrictions, or rejected",
                s
            )),
        }
    }
}

/// One completed (or in-progress) certificate review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Store-assigned id
    pub id: RecordId,

    /// Short title (e.g. "FT-101 - certificado 1234/24")
    pub title: String,

    #[serde(default)]
    pub status: ReviewStatus,

    #[serde(default)]
    pub certificate: CertificateInfo,

    #[serde(default)]
    pub instrument: InstrumentInfo,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_range: Option<CalibrationRange>,

    /// Range the instrument is used in; defaults to the calibration range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operational_range: Option<CalibrationRange>,

    #[serde(default)]
    pub environment: EnvironmentalConditions,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub standards: Vec<ReferenceStandard>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calibration_points: Vec<CalibrationPoint>,

    /// Embedded by [`AnalysisRecord::evaluate`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conformity: Option<ConformityAssessment>,

    /// Embedded by [`AnalysisRecord::evaluate`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,

    #[serde(default)]
    pub requirements: RegulatoryRequirements,

    #[serde(default)]
    pub checklist: CriticalAnalysisChecklist,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<Conclusion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub author: String,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,

    #[serde(default = "default_revision")]
    pub revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for AnalysisRecord {
    const KIND: &'static str = "analysis";

    fn id(&self) -> RecordId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        self.status.as_str()
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn stamp(&mut self, id: RecordId, created: DateTime<Utc>, updated: DateTime<Utc>) {
        self.id = id;
        self.created = created;
        self.updated = updated;
    }
}

impl AnalysisRecord {
    /// Create an empty draft; the store assigns the id on create
    pub fn new(title: String, author: String) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::FIRST,
            title,
            status: ReviewStatus::default(),
            certificate: CertificateInfo::default(),
            instrument: InstrumentInfo::default(),
            calibration_range: None,
            operational_range: None,
            environment: EnvironmentalConditions::default(),
            standards: Vec::new(),
            calibration_points: Vec::new(),
            conformity: None,
            recommendation: None,
            requirements: RegulatoryRequirements::default(),
            checklist: CriticalAnalysisChecklist::default(),
            conclusion: None,
            reviewer: None,
            reviewed_date: None,
            notes: None,
            author,
            created: now,
            updated: now,
            revision: 1,
        }
    }

    /// Recompute automatic points and embed the assessment and recommendation
    ///
    /// Manually overridden points keep their verdict.
    pub fn evaluate(&mut self) {
        for point in self.calibration_points.iter_mut() {
            point.refresh();
        }

        self.conformity = Some(generate_conformity_assessment(&self.calibration_points));
        self.recommendation = self.analysis().map(|a| a.recommendation.to_string());
    }

    /// Full calibration analysis, if a calibration range has been declared
    pub fn analysis(&self) -> Option<CalibrationAnalysis> {
        let calibration_range = self.calibration_range.clone()?;
        Some(generate_calibration_analysis(
            self.calibration_points.clone(),
            calibration_range,
            self.operational_range.clone(),
        ))
    }

    /// Points whose stored error or verdict no longer matches their inputs
    pub fn stale_points(&self) -> Vec<&CalibrationPoint> {
        self.calibration_points
            .iter()
            .filter(|p| p.is_stale())
            .collect()
    }

    /// Standards whose calibration had lapsed on the calibration date
    pub fn expired_standards(&self) -> Vec<&ReferenceStandard> {
        let Some(date) = self.certificate.calibration_date else {
            return Vec::new();
        };
        self.standards.iter().filter(|s| s.expired_on(date)).collect()
    }

    /// Index of the point with the given label
    pub fn point_index(&self, label: &str) -> Option<usize> {
        self.calibration_points.iter().position(|p| p.point == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformity::{process_calibration_point, ConformityStatus, Recommendation};

    fn record() -> AnalysisRecord {
        let mut record = AnalysisRecord::new("FT-101".to_string(), "tester".to_string());
        record.calibration_range = Some(CalibrationRange::new(0.0, 100.0, "kPa"));
        record
    }

    #[test]
    fn test_record_creation() {
        let record = AnalysisRecord::new("PT-200".to_string(), "ana".to_string());
        assert_eq!(record.title(), "PT-200");
        assert_eq!(record.status(), "draft");
        assert_eq!(record.author(), "ana");
        assert_eq!(AnalysisRecord::KIND, "analysis");
        assert!(record.conformity.is_none());
    }

    #[test]
    fn test_evaluate_embeds_assessment() {
        let mut record = record();
        record.calibration_points = vec![
            process_calibration_point("P1", 10.0, 10.4, 0.05, 0.2),
            process_calibration_point("P2", 50.0, 50.05, 0.02, 0.2),
            process_calibration_point("P3", 90.0, 90.1, 0.02, 0.2),
        ];
        record.evaluate();

        let conformity = record.conformity.as_ref().unwrap();
        assert_eq!(conformity.total_points, 3);
        assert_eq!(conformity.non_conforming_labels, vec!["P1".to_string()]);
        assert_eq!(conformity.status, ConformityStatus::NonConforming);
        assert!(record
            .recommendation
            .as_deref()
            .unwrap()
            .contains("a partir de 50 kPa"));
    }

    #[test]
    fn test_evaluate_refreshes_edited_points() {
        let mut record = record();
        record.calibration_points = vec![process_calibration_point("P1", 100.0, 100.05, 0.02, 0.1)];
        record.calibration_points[0].measured_value = 100.09;
        assert_eq!(record.stale_points().len(), 1);

        record.evaluate();
        assert!(record.stale_points().is_empty());
        assert!(!record.calibration_points[0].ok);
        assert_eq!(record.calibration_points[0].error, 0.09);
    }

    #[test]
    fn test_evaluate_keeps_manual_override() {
        let mut record = record();
        let mut point = process_calibration_point("P1", 100.0, 100.09, 0.02, 0.1);
        point.override_status(true, "Aceito pelo cliente");
        record.calibration_points = vec![point];
        record.evaluate();

        assert!(record.calibration_points[0].ok);
        assert!(record.conformity.as_ref().unwrap().is_conforming());
    }

    #[test]
    fn test_analysis_requires_calibration_range() {
        let mut record = AnalysisRecord::new("x".to_string(), "t".to_string());
        assert!(record.analysis().is_none());
        record.evaluate();
        assert!(record.recommendation.is_none());
        assert_eq!(
            record.conformity.as_ref().unwrap().status,
            ConformityStatus::NoData
        );
    }

    #[test]
    fn test_analysis_uses_operational_range() {
        let mut record = record();
        record.operational_range = Some(CalibrationRange::new(20.0, 80.0, "kPa"));
        record.calibration_points = vec![process_calibration_point("P1", 50.0, 50.0, 0.0, 0.1)];
        let analysis = record.analysis().unwrap();
        assert_eq!(analysis.operational_range.min, 20.0);
        assert!(analysis.operational_within_calibration);
        assert_eq!(analysis.recommendation, Recommendation::NoAction);
    }

    #[test]
    fn test_checklist_pending_and_failed() {
        let mut checklist = CriticalAnalysisChecklist::default();
        assert_eq!(checklist.pending().len(), 9);

        checklist.set("accredited-laboratory", ChecklistAnswer::Yes).unwrap();
        checklist.set("uncertainty_stated", ChecklistAnswer::No).unwrap();
        checklist
            .set("results_before_adjustment", ChecklistAnswer::NotApplicable)
            .unwrap();

        assert_eq!(checklist.pending().len(), 6);
        assert_eq!(checklist.failed(), vec!["uncertainty_stated"]);
        assert!(checklist.set("bogus", ChecklistAnswer::Yes).is_err());
    }

    #[test]
    fn test_expired_standards() {
        let mut record = record();
        record.certificate.calibration_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        record.standards = vec![
            ReferenceStandard {
                description: "Manômetro padrão".to_string(),
                identification: Some("PD-01".to_string()),
                certificate: None,
                valid_until: NaiveDate::from_ymd_opt(2024, 5, 31),
                traceability: None,
            },
            ReferenceStandard {
                description: "Termômetro padrão".to_string(),
                identification: None,
                certificate: None,
                valid_until: NaiveDate::from_ymd_opt(2024, 6, 1),
                traceability: None,
            },
        ];
        let expired = record.expired_standards();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].identification.as_deref(), Some("PD-01"));
    }

    #[test]
    fn test_prefill_requirements() {
        let tables = ReferenceTables::global().unwrap();
        let instrument = InstrumentInfo {
            instrument_type: Some("Transmissor de temperatura".to_string()),
            category: Some(Category::Petroleum),
            ..Default::default()
        };
        let requirements = RegulatoryRequirements::prefill(tables, &instrument);
        assert_eq!(requirements.max_uncertainty.as_deref(), Some("0.3 °C"));
        assert!(requirements.calibration_interval.is_some());
        assert_eq!(requirements.source.len(), 2);
    }

    #[test]
    fn test_prefill_falls_back_to_system_application() {
        let tables = ReferenceTables::global().unwrap();
        let instrument = InstrumentInfo {
            instrument_type: Some("Sistema sem componente tabelado".to_string()),
            category: Some(Category::Petroleum),
            application: Some(MeasurementApplication::Fiscal),
            ..Default::default()
        };
        let requirements = RegulatoryRequirements::prefill(tables, &instrument);
        assert_eq!(requirements.max_uncertainty.as_deref(), Some("0.3 %"));
        assert_eq!(requirements.source, vec!["system-uncertainty#1".to_string()]);
    }

    #[test]
    fn test_record_roundtrip() {
        let mut record = record();
        record.instrument.category = Some(Category::NaturalGas);
        record.calibration_points = vec![process_calibration_point("P1", 100.0, 100.05, 0.02, 0.1)];
        record.checklist.traceability_stated = Some(ChecklistAnswer::Yes);
        record.conclusion = Some(Conclusion::AcceptedWithRestrictions);
        record.evaluate();

        let yaml = serde_yml::to_string(&record).unwrap();
        assert!(yaml.contains("category: natural_gas"));
        assert!(yaml.contains("conclusion: accepted_with_restrictions"));
        let parsed: AnalysisRecord = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_conclusion_from_str() {
        assert_eq!(
            "accepted-with-restrictions".parse::<Conclusion>().unwrap(),
            Conclusion::AcceptedWithRestrictions
        );
        assert!("maybe".parse::<Conclusion>().is_err());
        assert_eq!("sim".parse::<ChecklistAnswer>().unwrap(), ChecklistAnswer::Yes);
    }
}
