//! Row types of the regulatory reference tables

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::Category;

/// Purpose of a measurement system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementApplication {
    Fiscal,
    Appropriation,
    Operational,
    #[value(name = "custody_transfer", alias = "custody-transfer")]
    CustodyTransfer,
}

impl std::fmt::Display for MeasurementApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasurementApplication::Fiscal => write!(f, "fiscal"),
            MeasurementApplication::Appropriation => write!(f, "appropriation"),
            MeasurementApplication::Operational => write!(f, "operational"),
            MeasurementApplication::CustodyTransfer => write!(f, "custody_transfer"),
        }
    }
}

impl std::str::FromStr for MeasurementApplication {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fiscal" => Ok(MeasurementApplication::Fiscal),
            "appropriation" | "apropriacao" => Ok(MeasurementApplication::Appropriation),
            "operational" | "operacional" => Ok(MeasurementApplication::Operational),
            "custody_transfer" | "custody" => Ok(MeasurementApplication::CustodyTransfer),
            _ => Err(format!("Unknown measurement application: {}", s)),
        }
    }
}

/// Unit of an inspection or calibration interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Days,
    Months,
    Years,
}

/// Interval between inspections or calibrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Periodicity {
    pub value: u32,
    pub unit: PeriodUnit,
}

impl std::fmt::Display for Periodicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = match (self.unit, self.value == 1) {
            (PeriodUnit::Days, true) => "dia",
            (PeriodUnit::Days, false) => "dias",
            (PeriodUnit::Months, true) => "mês",
            (PeriodUnit::Months, false) => "meses",
            (PeriodUnit::Years, true) => "ano",
            (PeriodUnit::Years, false) => "anos",
        };
        write!(f, "{} {}", self.value, unit)
    }
}

/// Maximum uncertainty of a complete measurement system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxUncertaintySystem {
    pub id: u32,
    pub category: Category,
    pub system: String,
    pub application: MeasurementApplication,
    pub max_uncertainty: f64,
    pub unit: String,
    pub source: String,
}

/// Maximum uncertainty of a single instrument or secondary quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxUncertaintyComponent {
    pub id: u32,
    pub category: Category,
    pub component: String,
    pub quantity: String,
    pub max_uncertainty: f64,
    pub unit: String,
    pub source: String,
}

/// How often a system element must be inspected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionPeriodicity {
    pub id: u32,
    pub category: Category,
    pub item: String,
    pub interval: Periodicity,
    pub source: String,
}

/// How often an instrument must be calibrated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPeriodicity {
    pub id: u32,
    pub category: Category,
    pub instrument: String,
    pub interval: Periodicity,
    pub source: String,
}

/// Common view of a table row used by the lookups
pub trait ReferenceRow {
    fn id(&self) -> u32;
    fn category(&self) -> Category;
    /// Text the lookup query is matched against
    fn description(&self) -> &str;
    /// The regulated value, formatted for display
    fn requirement(&self) -> String;
}

impl ReferenceRow for MaxUncertaintySystem {
    fn id(&self) -> u32 {
        self.id
    }
    fn category(&self) -> Category {
        self.category
    }
    fn description(&self) -> &str {
        &self.system
    }
    fn requirement(&self) -> String {
        format!("{} {}", self.max_uncertainty, self.unit)
    }
}

impl ReferenceRow for MaxUncertaintyComponent {
    fn id(&self) -> u32 {
        self.id
    }
    fn category(&self) -> Category {
        self.category
    }
    fn description(&self) -> &str {
        &self.component
    }
    fn requirement(&self) -> String {
        format!("{} {}", self.max_uncertainty, self.unit)
    }
}

impl ReferenceRow for InspectionPeriodicity {
    fn id(&self) -> u32 {
        self.id
    }
    fn category(&self) -> Category {
        self.category
    }
    fn description(&self) -> &str {
        &self.item
    }
    fn requirement(&self) -> String {
        self.interval.to_string()
    }
}

impl ReferenceRow for CalibrationPeriodicity {
    fn id(&self) -> u32 {
        self.id
    }
    fn category(&self) -> Category {
        self.category
    }
    fn description(&self) -> &str {
        &self.instrument
    }
    fn requirement(&self) -> String {
        self.interval.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodicity_display() {
        let p = Periodicity {
            value: 1,
            unit: PeriodUnit::Years,
        };
        assert_eq!(p.to_string(), "1 ano");
        let p = Periodicity {
            value: 90,
            unit: PeriodUnit::Days,
        };
        assert_eq!(p.to_string(), "90 dias");
    }

    #[test]
    fn test_application_parse() {
        assert_eq!(
            "custody-transfer".parse::<MeasurementApplication>().unwrap(),
            MeasurementApplication::CustodyTransfer
        );
        assert!("other".parse::<MeasurementApplication>().is_err());
    }
}
