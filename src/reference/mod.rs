//! Regulatory reference tables
//!
//! Four read-only tables shipped inside the binary: maximum uncertainty per
//! measurement system and per component, inspection periodicity and
//! calibration periodicity. Lookups match a free-text query against the row
//! description (case-insensitive substring) and return the first row in
//! table order.

pub mod tables;

use std::sync::OnceLock;

use clap::ValueEnum;
use miette::Diagnostic;
use rust_embed::Embed;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

pub use tables::{
    CalibrationPeriodicity, InspectionPeriodicity, MaxUncertaintyComponent, MaxUncertaintySystem,
    MeasurementApplication, PeriodUnit, Periodicity, ReferenceRow,
};

#[derive(Embed)]
#[folder = "reference/"]
struct ReferenceAssets;

/// Regulated product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Petroleum,
    #[value(name = "natural_gas", alias = "natural-gas", alias = "gas")]
    NaturalGas,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Petroleum => write!(f, "petroleum"),
            Category::NaturalGas => write!(f, "natural_gas"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "petroleum" | "petroleo" | "petróleo" | "oil" => Ok(Category::Petroleum),
            "natural_gas" | "gas" | "gas_natural" | "gás_natural" => Ok(Category::NaturalGas),
            _ => Err(format!(
                "Unknown category: {}. Use 'petroleum' or 'natural_gas'",
                s
            )),
        }
    }
}

/// Which of the four tables to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableKind {
    /// Maximum uncertainty per measurement system
    #[value(name = "system-uncertainty")]
    SystemUncertainty,
    /// Maximum uncertainty per component
    #[value(name = "component-uncertainty")]
    ComponentUncertainty,
    /// Inspection periodicity
    #[value(name = "inspection")]
    Inspection,
    /// Calibration periodicity
    #[value(name = "calibration")]
    Calibration,
}

impl TableKind {
    fn file_name(&self) -> &'static str {
        match self {
            TableKind::SystemUncertainty => "max_uncertainty_system.yaml",
            TableKind::ComponentUncertainty => "max_uncertainty_component.yaml",
            TableKind::Inspection => "inspection_periodicity.yaml",
            TableKind::Calibration => "calibration_periodicity.yaml",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TableKind::SystemUncertainty => "Incerteza máxima por sistema de medição",
            TableKind::ComponentUncertainty => "Incerteza máxima por componente",
            TableKind::Inspection => "Periodicidade de inspeção",
            TableKind::Calibration => "Periodicidade de calibração",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableKind::SystemUncertainty => write!(f, "system-uncertainty"),
            TableKind::ComponentUncertainty => write!(f, "component-uncertainty"),
            TableKind::Inspection => write!(f, "inspection"),
            TableKind::Calibration => write!(f, "calibration"),
        }
    }
}

/// A row from any of the tables
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum ReferenceEntry {
    SystemUncertainty(MaxUncertaintySystem),
    ComponentUncertainty(MaxUncertaintyComponent),
    Inspection(InspectionPeriodicity),
    Calibration(CalibrationPeriodicity),
}

impl ReferenceEntry {
    fn row(&self) -> &dyn ReferenceRow {
        match self {
            ReferenceEntry::SystemUncertainty(r) => r,
            ReferenceEntry::ComponentUncertainty(r) => r,
            ReferenceEntry::Inspection(r) => r,
            ReferenceEntry::Calibration(r) => r,
        }
    }

    pub fn kind(&self) -> TableKind {
        match self {
            ReferenceEntry::SystemUncertainty(_) => TableKind::SystemUncertainty,
            ReferenceEntry::ComponentUncertainty(_) => TableKind::ComponentUncertainty,
            ReferenceEntry::Inspection(_) => TableKind::Inspection,
            ReferenceEntry::Calibration(_) => TableKind::Calibration,
        }
    }

    pub fn id(&self) -> u32 {
        self.row().id()
    }

    pub fn category(&self) -> Category {
        self.row().category()
    }

    pub fn description(&self) -> &str {
        self.row().description()
    }

    pub fn requirement(&self) -> String {
        self.row().requirement()
    }

    pub fn source(&self) -> &str {
        match self {
            ReferenceEntry::SystemUncertainty(r) => &r.source,
            ReferenceEntry::ComponentUncertainty(r) => &r.source,
            ReferenceEntry::Inspection(r) => &r.source,
            ReferenceEntry::Calibration(r) => &r.source,
        }
    }
}

/// Errors raised while loading the embedded tables
#[derive(Debug, Error, Diagnostic)]
pub enum ReferenceError {
    #[error("reference table '{0}' is not embedded in this build")]
    #[diagnostic(code(cca::reference::missing))]
    Missing(String),

    #[error("reference tables failed to load earlier in this process: {0}")]
    #[diagnostic(code(cca::reference::unavailable))]
    Unavailable(String),

    #[error("reference table '{file}' is malformed: {source}")]
    #[diagnostic(code(cca::reference::malformed))]
    Malformed {
        file: String,
        #[source]
        source: serde_yml::Error,
    },
}

/// The four tables, parsed
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub system_uncertainty: Vec<MaxUncertaintySystem>,
    pub component_uncertainty: Vec<MaxUncertaintyComponent>,
    pub inspection: Vec<InspectionPeriodicity>,
    pub calibration: Vec<CalibrationPeriodicity>,
}

static TABLES: OnceLock<Result<ReferenceTables, String>> = OnceLock::new();

impl ReferenceTables {
    /// Parse the embedded tables
    pub fn load() -> Result<Self, ReferenceError> {
        Ok(Self {
            system_uncertainty: load_table(TableKind::SystemUncertainty)?,
            component_uncertainty: load_table(TableKind::ComponentUncertainty)?,
            inspection: load_table(TableKind::Inspection)?,
            calibration: load_table(TableKind::Calibration)?,
        })
    }

    /// Process-wide tables, parsed once on first use
    pub fn global() -> Result<&'static ReferenceTables, ReferenceError> {
        cached(TABLES.get_or_init(|| Self::load().map_err(|e| e.to_string())))
    }

    pub fn max_uncertainty_system(
        &self,
        category: Option<Category>,
        query: &str,
    ) -> Option<&MaxUncertaintySystem> {
        first_match(&self.system_uncertainty, category, query)
    }

    pub fn max_uncertainty_component(
        &self,
        category: Option<Category>,
        query: &str,
    ) -> Option<&MaxUncertaintyComponent> {
        first_match(&self.component_uncertainty, category, query)
    }

    pub fn inspection_periodicity(
        &self,
        category: Option<Category>,
        query: &str,
    ) -> Option<&InspectionPeriodicity> {
        first_match(&self.inspection, category, query)
    }

    pub fn calibration_periodicity(
        &self,
        category: Option<Category>,
        query: &str,
    ) -> Option<&CalibrationPeriodicity> {
        first_match(&self.calibration, category, query)
    }

    /// First matching row of one table
    pub fn lookup(
        &self,
        kind: TableKind,
        category: Option<Category>,
        query: &str,
    ) -> Option<ReferenceEntry> {
        match kind {
            TableKind::SystemUncertainty => self
                .max_uncertainty_system(category, query)
                .cloned()
                .map(ReferenceEntry::SystemUncertainty),
            TableKind::ComponentUncertainty => self
                .max_uncertainty_component(category, query)
                .cloned()
                .map(ReferenceEntry::ComponentUncertainty),
            TableKind::Inspection => self
                .inspection_periodicity(category, query)
                .cloned()
                .map(ReferenceEntry::Inspection),
            TableKind::Calibration => self
                .calibration_periodicity(category, query)
                .cloned()
                .map(ReferenceEntry::Calibration),
        }
    }

    /// Every row of one table, optionally filtered by category, in table order
    pub fn list(&self, kind: TableKind, category: Option<Category>) -> Vec<ReferenceEntry> {
        fn keep<R: ReferenceRow + Clone>(
            rows: &[R],
            category: Option<Category>,
            wrap: fn(R) -> ReferenceEntry,
        ) -> Vec<ReferenceEntry> {
            rows.iter()
                .filter(|r| category.is_none_or(|c| r.category() == c))
                .cloned()
                .map(wrap)
                .collect()
        }

        match kind {
            TableKind::SystemUncertainty => keep(
                &self.system_uncertainty,
                category,
                ReferenceEntry::SystemUncertainty,
            ),
            TableKind::ComponentUncertainty => keep(
                &self.component_uncertainty,
                category,
                ReferenceEntry::ComponentUncertainty,
            ),
            TableKind::Inspection => keep(&self.inspection, category, ReferenceEntry::Inspection),
            TableKind::Calibration => {
                keep(&self.calibration, category, ReferenceEntry::Calibration)
            }
        }
    }
}

/// Hand out the cached tables, or the load failure they were cached with
fn cached(entry: &Result<ReferenceTables, String>) -> Result<&ReferenceTables, ReferenceError> {
    entry
        .as_ref()
        .map_err(|message| ReferenceError::Unavailable(message.clone()))
}

fn load_table<T: DeserializeOwned>(kind: TableKind) -> Result<Vec<T>, ReferenceError> {
    let file = kind.file_name();
    let asset =
        ReferenceAssets::get(file).ok_or_else(|| ReferenceError::Missing(file.to_string()))?;
    let content = String::from_utf8_lossy(&asset.data);
    serde_yml::from_str(&content).map_err(|source| ReferenceError::Malformed {
        file: file.to_string(),
        source,
    })
}

/// First row, in table order, whose description contains `query`
/// (case-insensitive) and whose category matches when one is given
pub fn first_match<'a, R: ReferenceRow>(
    rows: &'a [R],
    category: Option<Category>,
    query: &str,
) -> Option<&'a R> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    rows.iter().find(|row| {
        category.is_none_or(|c| row.category() == c)
            && row.description().to_lowercase().contains(&needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_tables_parse() {
        let tables = ReferenceTables::load().unwrap();
        assert!(!tables.system_uncertainty.is_empty());
        assert!(!tables.component_uncertainty.is_empty());
        assert!(!tables.inspection.is_empty());
        assert!(!tables.calibration.is_empty());
    }

    #[test]
    fn test_cached_failure_keeps_its_cause() {
        let failed: Result<ReferenceTables, String> =
            Err("reference table 'calibration_periodicity.yaml' is malformed: bad row".to_string());
        let err = cached(&failed).unwrap_err();
        assert!(matches!(err, ReferenceError::Unavailable(_)));
        let message = err.to_string();
        assert!(message.contains("malformed: bad row"));
        assert!(!message.contains("not embedded"));

        let loaded = Ok(ReferenceTables::load().unwrap());
        assert!(cached(&loaded).is_ok());
    }

    #[test]
    fn test_global_is_shared() {
        let a = ReferenceTables::global().unwrap();
        let b = ReferenceTables::global().unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_lookup_case_insensitive() {
        let tables = ReferenceTables::global().unwrap();
        let row = tables
            .max_uncertainty_system(Some(Category::Petroleum), "MEDIÇÃO FISCAL")
            .unwrap();
        assert_eq!(row.application, MeasurementApplication::Fiscal);
        assert_eq!(row.category, Category::Petroleum);
    }

    #[test]
    fn test_lookup_returns_first_in_table_order() {
        let tables = ReferenceTables::global().unwrap();
        // "Transmissor de pressão" is a substring of several natural gas rows
        let row = tables
            .calibration_periodicity(Some(Category::NaturalGas), "transmissor de pressão")
            .unwrap();
        let expected = tables
            .calibration
            .iter()
            .find(|r| {
                r.category == Category::NaturalGas
                    && r.instrument.to_lowercase().contains("transmissor de pressão")
            })
            .unwrap();
        assert_eq!(row.id, expected.id);
    }

    #[test]
    fn test_lookup_category_filter() {
        let tables = ReferenceTables::global().unwrap();
        let any = tables.calibration_periodicity(None, "transmissor de pressão").unwrap();
        assert_eq!(any.category, Category::Petroleum);
        let gas = tables
            .calibration_periodicity(Some(Category::NaturalGas), "transmissor de pressão")
            .unwrap();
        assert_eq!(gas.category, Category::NaturalGas);
    }

    #[test]
    fn test_lookup_no_match() {
        let tables = ReferenceTables::global().unwrap();
        assert!(tables
            .lookup(TableKind::Inspection, None, "inexistente xyz")
            .is_none());
        assert!(tables.lookup(TableKind::Inspection, None, "   ").is_none());
    }

    #[test]
    fn test_list_filters_category() {
        let tables = ReferenceTables::global().unwrap();
        let all = tables.list(TableKind::Calibration, None);
        let gas = tables.list(TableKind::Calibration, Some(Category::NaturalGas));
        assert_eq!(all.len(), tables.calibration.len());
        assert!(gas.len() < all.len());
        assert!(gas.iter().all(|e| e.category() == Category::NaturalGas));
    }

    #[test]
    fn test_entry_accessors() {
        let tables = ReferenceTables::global().unwrap();
        let entry = tables
            .lookup(TableKind::Calibration, Some(Category::Petroleum), "turbina")
            .unwrap();
        assert_eq!(entry.kind(), TableKind::Calibration);
        assert_eq!(entry.requirement(), "60 dias");
        assert!(entry.source().contains("RTM"));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("natural-gas".parse::<Category>().unwrap(), Category::NaturalGas);
        assert_eq!("Petroleum".parse::<Category>().unwrap(), Category::Petroleum);
        assert!("water".parse::<Category>().is_err());
        assert_eq!(Category::NaturalGas.to_string(), "natural_gas");
    }
}
