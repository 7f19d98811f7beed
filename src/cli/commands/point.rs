//! `cca point` command - Calibration points of a record

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::cli::helpers::{open_store, parse_id, print_serialized, resolve_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::conformity::{
    parse_measurement, process_calibration_point, round4, validate_calibration_data,
    CalibrationPoint, PointSource,
};
use crate::core::config::Config;
use crate::core::store::RecordStore;
use crate::entities::AnalysisRecord;
use crate::schema::wizard::{PointDefaults, Wizard};

#[derive(Subcommand, Debug)]
pub enum PointCommands {
    /// Add a calibration point (validated before it is stored)
    Add(AddArgs),

    /// Remove a calibration point by label
    Remove(RemoveArgs),

    /// List the calibration points of a record
    List(ListArgs),

    /// Import calibration points from a CSV file
    Import(ImportArgs),

    /// Override the verdict of a point, or restore the calculated one
    Override(OverrideArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Record id
    pub id: String,

    /// Point label (default: P<n>)
    #[arg(long, short = 'l')]
    pub label: Option<String>,

    /// Reference value (standard)
    #[arg(long, short = 'r', allow_hyphen_values = true, required_unless_present = "interactive")]
    pub reference: Option<String>,

    /// Measured value (instrument)
    #[arg(long, short = 'm', allow_hyphen_values = true, required_unless_present = "interactive")]
    pub measured: Option<String>,

    /// Expanded uncertainty (k=2)
    #[arg(long, short = 'U', allow_hyphen_values = true, required_unless_present = "interactive")]
    pub uncertainty: Option<String>,

    /// Maximum permissible error (EMA)
    #[arg(long, short = 'e', allow_hyphen_values = true, required_unless_present = "interactive")]
    pub limit: Option<String>,

    /// Prompt for points until done
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Record id
    pub id: String,

    /// Point label
    pub label: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Record id
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Record id
    pub id: String,

    /// CSV file with columns point, reference_value, measured_value, uncertainty, error_limit
    pub file: PathBuf,

    /// Field delimiter (use ';' for files with decimal commas)
    #[arg(long, short = 'd', default_value = ",")]
    pub delimiter: char,

    /// Replace existing points instead of appending
    #[arg(long)]
    pub replace: bool,
}

/// Verdict to force on a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Verdict {
    /// Accept the point
    Ok,
    /// Reject the point
    Fail,
    /// Restore the calculated verdict
    Auto,
}

#[derive(clap::Args, Debug)]
pub struct OverrideArgs {
    /// Record id
    pub id: String,

    /// Point label
    pub label: String,

    /// New verdict
    #[arg(value_enum)]
    pub verdict: Verdict,

    /// Justification (required for ok/fail)
    #[arg(long, short = 'm')]
    pub reason: Option<String>,
}

/// Run a point subcommand
pub fn run(cmd: PointCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PointCommands::Add(args) => run_add(args, global),
        PointCommands::Remove(args) => run_remove(args, global),
        PointCommands::List(args) => run_list(args, global),
        PointCommands::Import(args) => run_import(args, global),
        PointCommands::Override(args) => run_override(args, global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let id = parse_id(&args.id)?;
    let mut record = store.require(id)?;

    let new_points = if args.interactive {
        let defaults = record
            .calibration_points
            .last()
            .map(|p| PointDefaults {
                uncertainty: Some(p.uncertainty.to_string()),
                error_limit: Some(p.error_limit.to_string()),
            })
            .unwrap_or_default();
        Wizard::new().collect_points(record.calibration_points.len() + 1, &defaults)?
    } else {
        let reference = args.reference.unwrap_or_default();
        let measured = args.measured.unwrap_or_default();
        let uncertainty = args.uncertainty.unwrap_or_default();
        let limit = args.limit.unwrap_or_default();

        let validation = validate_calibration_data(&reference, &measured, &uncertainty, &limit);
        if !validation.is_valid {
            for error in &validation.errors {
                eprintln!("{} {}", style("✗").red(), error);
            }
            return Err(miette::miette!(
                "Calibration point rejected ({} error(s))",
                validation.errors.len()
            ));
        }

        let label = args
            .label
            .unwrap_or_else(|| format!("P{}", record.calibration_points.len() + 1));
        vec![process_calibration_point(
            label,
            parse_measurement(&reference),
            parse_measurement(&measured),
            parse_measurement(&uncertainty),
            parse_measurement(&limit),
        )]
    };

    let duplicates = duplicate_labels(&record.calibration_points, &new_points);
    if !duplicates.is_empty() {
        return Err(miette::miette!(
            "Record {} already has a point labelled {}",
            id,
            quoted(&duplicates)
        ));
    }

    let added = new_points.len();
    record.calibration_points.extend(new_points);
    record.evaluate();
    let record = store.save(&record)?;

    if !global.quiet {
        for point in &record.calibration_points[record.calibration_points.len() - added..] {
            print_point_line(point);
        }
        super::record::print_conformity_line(&record);
    }
    Ok(())
}

fn run_remove(args: RemoveArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let id = parse_id(&args.id)?;
    let mut record = store.require(id)?;

    let index = record
        .point_index(&args.label)
        .ok_or_else(|| miette::miette!("Record {} has no point '{}'", id, args.label))?;
    record.calibration_points.remove(index);
    record.evaluate();
    let record = store.save(&record)?;

    if !global.quiet {
        println!(
            "{} Removed point {} from record {}",
            style("✓").green(),
            style(&args.label).cyan(),
            style(id).cyan()
        );
        super::record::print_conformity_line(&record);
    }
    Ok(())
}

const POINT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("point", "POINT", 10),
    ColumnDef::new("reference", "REFERENCE", 12),
    ColumnDef::new("measured", "MEASURED", 12),
    ColumnDef::new("error", "ERROR", 10),
    ColumnDef::new("uncertainty", "U", 10),
    ColumnDef::new("budget", "|E|+U", 10),
    ColumnDef::new("limit", "EMA", 10),
    ColumnDef::new("ok", "OK", 2),
    ColumnDef::new("source", "SOURCE", 6),
];

/// Table rows for a record's points
pub(crate) fn point_rows(record: &AnalysisRecord) -> Vec<TableRow> {
    record
        .calibration_points
        .iter()
        .map(|p| {
            TableRow::new(&p.point)
                .cell("point", CellValue::Id(p.point.clone()))
                .cell("reference", CellValue::Text(p.reference_value.to_string()))
                .cell("measured", CellValue::Text(p.measured_value.to_string()))
                .cell("error", CellValue::Text(p.error.to_string()))
                .cell("uncertainty", CellValue::Text(p.uncertainty.to_string()))
                .cell(
                    "budget",
                    CellValue::Text(round4(p.error.abs() + p.uncertainty).to_string()),
                )
                .cell("limit", CellValue::Text(p.error_limit.to_string()))
                .cell("ok", CellValue::Verdict(p.ok))
                .cell("source", CellValue::Text(p.source.to_string()))
        })
        .collect()
}

/// Point table formatter shared with `cca analysis show`
pub(crate) fn point_table() -> TableFormatter<'static> {
    TableFormatter::new(POINT_COLUMNS, "point")
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store) = open_store(global)?;
    let config = Config::load_for(Some(&project));
    let id = parse_id(&args.id)?;
    let record = store.require(id)?;

    let format = resolve_format(global, &config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_serialized(&record.calibration_points, format);
    }
    if record.calibration_points.is_empty() {
        if !global.quiet {
            println!("Record {} has no calibration points.", id);
        }
        return Ok(());
    }

    let mut formatter = point_table();
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(point_rows(&record), format);
    Ok(())
}

/// Columns accepted in a points CSV, with Portuguese aliases
const CSV_COLUMNS: [(&str, &[&str]); 5] = [
    ("point", &["point", "ponto", "label"]),
    ("reference_value", &["reference_value", "reference", "referencia", "valor_referencia"]),
    ("measured_value", &["measured_value", "measured", "medido", "valor_medido"]),
    ("uncertainty", &["uncertainty", "incerteza", "u"]),
    ("error_limit", &["error_limit", "limit", "ema"]),
];

/// Parse a points CSV; every invalid row is reported, not just the first
fn read_points_csv(
    content: &str,
    delimiter: char,
    first_label: usize,
) -> Result<Vec<CalibrationPoint>> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| miette::miette!("Delimiter must be a single ASCII character"))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .into_diagnostic()?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();
    let column = |name: &str| -> Option<usize> {
        let (_, aliases) = CSV_COLUMNS.iter().find(|(key, _)| *key == name)?;
        headers.iter().position(|h| aliases.contains(&h.as_str()))
    };

    let missing: Vec<&str> = CSV_COLUMNS
        .iter()
        .skip(1)
        .map(|(key, _)| *key)
        .filter(|key| column(key).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(miette::miette!(
            "CSV is missing column(s): {}",
            missing.join(", ")
        ));
    }

    let label_col = column("point");
    let reference_col = column("reference_value");
    let measured_col = column("measured_value");
    let uncertainty_col = column("uncertainty");
    let limit_col = column("error_limit");

    let mut points = Vec::new();
    let mut problems = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let line = row + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                problems.push(format!("line {}: {}", line, e));
                continue;
            }
        };
        let field = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or_default();

        let reference = field(reference_col);
        let measured = field(measured_col);
        let uncertainty = field(uncertainty_col);
        let limit = field(limit_col);
        let validation = validate_calibration_data(reference, measured, uncertainty, limit);
        if !validation.is_valid {
            for error in validation.errors {
                problems.push(format!("line {}: {}", line, error));
            }
            continue;
        }

        let label = Some(field(label_col))
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("P{}", first_label + points.len()));
        points.push(process_calibration_point(
            label,
            parse_measurement(reference),
            parse_measurement(measured),
            parse_measurement(uncertainty),
            parse_measurement(limit),
        ));
    }

    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("{} {}", style("✗").red(), problem);
        }
        return Err(miette::miette!(
            "CSV rejected ({} error(s)); no points were imported",
            problems.len()
        ));
    }
    Ok(points)
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let id = parse_id(&args.id)?;
    let mut record = store.require(id)?;

    let content = std::fs::read_to_string(&args.file)
        .map_err(|e| miette::miette!("cannot read {}: {}", args.file.display(), e))?;
    if args.replace {
        record.calibration_points.clear();
    }
    let points = read_points_csv(
        &content,
        args.delimiter,
        record.calibration_points.len() + 1,
    )?;

    let duplicates = duplicate_labels(&record.calibration_points, &points);
    if !duplicates.is_empty() {
        return Err(miette::miette!(
            help = "Point labels must be unique within a record; use --replace to drop the current points",
            "Record {} already has a point labelled {}; no points were imported",
            id,
            quoted(&duplicates)
        ));
    }

    let imported = points.len();
    record.calibration_points.extend(points);
    record.evaluate();
    let record = store.save(&record)?;

    if !global.quiet {
        println!(
            "{} Imported {} point(s) into record {}",
            style("✓").green(),
            imported,
            style(id).cyan()
        );
        super::record::print_conformity_line(&record);
    }
    Ok(())
}

fn run_override(args: OverrideArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let id = parse_id(&args.id)?;
    let mut record = store.require(id)?;

    let index = record
        .point_index(&args.label)
        .ok_or_else(|| miette::miette!("Record {} has no point '{}'", id, args.label))?;
    let point = &mut record.calibration_points[index];

    match args.verdict {
        Verdict::Auto => point.recalculate(),
        verdict => {
            let reason = args
                .reason
                .filter(|r| !r.trim().is_empty())
                .ok_or_else(|| miette::miette!("A justification is required (use --reason)"))?;
            point.override_status(verdict == Verdict::Ok, reason);
        }
    }

    record.evaluate();
    let record = store.save(&record)?;

    if !global.quiet {
        print_point_line(&record.calibration_points[index]);
        super::record::print_conformity_line(&record);
    }
    Ok(())
}

/// Labels of `incoming` that clash with `existing` or repeat within `incoming`
fn duplicate_labels(existing: &[CalibrationPoint], incoming: &[CalibrationPoint]) -> Vec<String> {
    let mut seen: HashSet<&str> = existing.iter().map(|p| p.point.as_str()).collect();
    let mut duplicates: Vec<String> = Vec::new();
    for point in incoming {
        if !seen.insert(point.point.as_str()) && !duplicates.contains(&point.point) {
            duplicates.push(point.point.clone());
        }
    }
    duplicates
}

fn quoted(labels: &[String]) -> String {
    labels
        .iter()
        .map(|l| format!("'{}'", l))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_point_line(point: &CalibrationPoint) {
    let marker = if point.ok {
        style("✓").green()
    } else {
        style("✗").red()
    };
    let source = match point.source {
        PointSource::Auto => String::new(),
        PointSource::Manual => format!(" {}", style("(manual)").yellow()),
    };
    println!(
        "{} {} erro {} (|erro| + U = {}, EMA {}){}",
        marker,
        style(&point.point).cyan(),
        point.error,
        round4(point.error.abs() + point.uncertainty),
        point.error_limit,
        source
    );
}
