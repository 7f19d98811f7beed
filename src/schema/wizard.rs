//! Interactive prompts for record basics and calibration points

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use miette::{IntoDiagnostic, Result};

use crate::conformity::{
    parse_measurement, process_calibration_point, round4, validate_calibration_data,
    CalibrationPoint, CalibrationRange,
};
use crate::entities::AnalysisRecord;
use crate::reference::{Category, MeasurementApplication};

/// Values reused for every point unless the user changes them
#[derive(Debug, Clone, Default)]
pub struct PointDefaults {
    pub uncertainty: Option<String>,
    pub error_limit: Option<String>,
}

/// Prompt-driven entry of record fields and calibration points
pub struct Wizard {
    theme: ColorfulTheme,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// Ask for the instrument and range of a new record
    pub fn fill_record(&self, record: &mut AnalysisRecord) -> Result<()> {
        println!();
        println!("{} New critical analysis", style("◆").cyan());
        println!("{}", style("─".repeat(50)).dim());

        record.title = self.text("Title", Some(record.title.as_str()), false)?;
        record.instrument.tag = self.optional("Instrument tag")?;
        record.instrument.instrument_type = self.optional("Instrument type")?;
        record.certificate.number = self.optional("Certificate number")?;

        let laboratory = self.text("Laboratory", record.certificate.laboratory.as_deref(), true)?;
        record.certificate.laboratory = Some(laboratory).filter(|l| !l.is_empty());

        let categories = [Category::Petroleum, Category::NaturalGas];
        let default = record
            .instrument
            .category
            .and_then(|c| categories.iter().position(|x| *x == c))
            .unwrap_or(0);
        let selected = Select::with_theme(&self.theme)
            .with_prompt("Category")
            .items(&categories)
            .default(default)
            .interact()
            .into_diagnostic()?;
        record.instrument.category = Some(categories[selected]);

        let applications = [
            MeasurementApplication::Fiscal,
            MeasurementApplication::Appropriation,
            MeasurementApplication::Operational,
            MeasurementApplication::CustodyTransfer,
        ];
        let selected = Select::with_theme(&self.theme)
            .with_prompt("Application")
            .items(&applications)
            .default(0)
            .interact()
            .into_diagnostic()?;
        record.instrument.application = Some(applications[selected]);

        let unit = self.text("Unit", None, false)?;
        let min = self.number("Calibration range min")?;
        let max = self.number("Calibration range max")?;
        record.calibration_range = Some(CalibrationRange::new(min, max, unit));

        Ok(())
    }

    /// Collect points until the user stops; each row is validated before it is accepted
    pub fn collect_points(
        &self,
        first_label: usize,
        defaults: &PointDefaults,
    ) -> Result<Vec<CalibrationPoint>> {
        let mut defaults = defaults.clone();
        let mut points = Vec::new();
        let mut index = first_label;

        loop {
            println!();
            let suggested = format!("P{}", index);
            let label = self.text("Point label", Some(suggested.as_str()), false)?;
            let reference = self.text("Reference value", None, false)?;
            let measured = self.text("Measured value", None, false)?;
            let uncertainty =
                self.text("Uncertainty (k=2)", defaults.uncertainty.as_deref(), false)?;
            let error_limit =
                self.text("Error limit (EMA)", defaults.error_limit.as_deref(), false)?;

            let validation =
                validate_calibration_data(&reference, &measured, &uncertainty, &error_limit);
            if !validation.is_valid {
                for error in &validation.errors {
                    println!("{} {}", style("✗").red(), error);
                }
                continue;
            }

            let point = process_calibration_point(
                label,
                parse_measurement(&reference),
                parse_measurement(&measured),
                parse_measurement(&uncertainty),
                parse_measurement(&error_limit),
            );
            let marker = if point.ok {
                style("✓").green()
            } else {
                style("✗").red()
            };
            println!(
                "{} {} erro {} (|erro| + U = {})",
                marker,
                style(&point.point).cyan(),
                point.error,
                round4(point.error.abs() + point.uncertainty)
            );

            defaults.uncertainty = Some(uncertainty);
            defaults.error_limit = Some(error_limit);
            points.push(point);
            index += 1;

            let more = Confirm::with_theme(&self.theme)
                .with_prompt("Add another point?")
                .default(true)
                .interact()
                .into_diagnostic()?;
            if !more {
                break;
            }
        }

        Ok(points)
    }

    fn text(&self, prompt: &str, default: Option<&str>, allow_empty: bool) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(allow_empty);
        if let Some(default) = default.filter(|d| !d.is_empty()) {
            input = input.default(default.to_string());
        }
        input.interact_text().into_diagnostic()
    }

    fn optional(&self, prompt: &str) -> Result<Option<String>> {
        let value = self.text(prompt, None, true)?;
        Ok(Some(value.trim().to_string()).filter(|v| !v.is_empty()))
    }

    fn number(&self, prompt: &str) -> Result<f64> {
        loop {
            let value = self.text(prompt, None, false)?;
            let parsed = parse_measurement(&value);
            if parsed.is_finite() {
                return Ok(parsed);
            }
            println!("{} '{}' is not a number", style("✗").red(), value);
        }
    }
}
