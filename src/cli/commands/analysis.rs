//! `cca analysis` command - Conformity analysis of a record

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{open_store, parse_id, print_serialized, resolve_format};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::conformity::{export_calibration_analysis_to_json, CalibrationAnalysis, ConformityStatus};
use crate::core::config::Config;
use crate::core::store::RecordStore;
use crate::entities::AnalysisRecord;

use super::point::{point_rows, point_table};

#[derive(Subcommand, Debug)]
pub enum AnalysisCommands {
    /// Show the conformity analysis of a record
    Show(ShowArgs),

    /// Export the analysis as JSON
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Record id
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Record id
    pub id: String,

    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Run an analysis subcommand
pub fn run(cmd: AnalysisCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        AnalysisCommands::Show(args) => run_show(args, global),
        AnalysisCommands::Export(args) => run_export(args, global),
    }
}

fn load_analysis(id: &str, global: &GlobalOpts) -> Result<(AnalysisRecord, CalibrationAnalysis)> {
    let (_project, store) = open_store(global)?;
    let id = parse_id(id)?;
    let record = store.require(id)?;
    let analysis = record.analysis().ok_or_else(|| {
        miette::miette!(
            help = format!(
                "cca record set {} 'calibration_range={{\"min\":0,\"max\":100,\"unit\":\"kPa\"}}'",
                id
            ),
            "Record {} has no calibration range",
            id
        )
    })?;
    Ok((record, analysis))
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (record, analysis) = load_analysis(&args.id, global)?;
    let config = Config::load_for(crate::cli::helpers::project(global).ok().as_ref());

    let format = resolve_format(global, &config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_serialized(&analysis, format);
    }

    println!(
        "{} {}",
        style(format!("#{}", record.id)).cyan(),
        style(&record.title).bold()
    );
    println!("{}", style("─".repeat(60)).dim());
    if let Some(ref tag) = record.instrument.tag {
        println!("Instrumento:        {}", tag);
    }
    if let Some(ref number) = record.certificate.number {
        println!("Certificado:        {}", number);
    }
    if let Some(ref laboratory) = record.certificate.laboratory {
        println!("Laboratório:        {}", laboratory);
    }
    println!("Faixa calibrada:    {}", analysis.calibration_range);
    println!("Faixa operacional:  {}", analysis.operational_range);
    if !analysis.operational_within_calibration {
        println!(
            "{} Faixa operacional excede a faixa calibrada",
            style("!").yellow()
        );
    }
    if let Some(ref max_uncertainty) = record.requirements.max_uncertainty {
        println!("Incerteza máxima:   {}", max_uncertainty);
    }
    if let Some(ref interval) = record.requirements.calibration_interval {
        println!("Periodicidade:      {}", interval);
    }
    println!();

    if !analysis.points.is_empty() {
        point_table().without_summary().output(point_rows(&record), format);
        println!();
    }

    let assessment = &analysis.assessment;
    let marker = match assessment.status {
        ConformityStatus::Conforming => style("✓").green(),
        ConformityStatus::NonConforming => style("✗").red(),
        ConformityStatus::NoData => style("-").dim(),
    };
    println!("{} {}", marker, assessment.summary);
    println!(
        "   {} ({})",
        style(&assessment.decision_rule).bold(),
        style(&assessment.confidence_level).dim()
    );
    println!();
    println!("{} {}", style("Recomendação:").bold(), analysis.recommendation);

    let stale = record.stale_points();
    if !stale.is_empty() {
        println!();
        println!(
            "{} Stored values out of date for point(s): {} (run `cca validate --fix`)",
            style("!").yellow(),
            stale.iter().map(|p| p.point.as_str()).collect::<Vec<_>>().join(", ")
        );
    }

    let expired = record.expired_standards();
    if !expired.is_empty() {
        println!(
            "{} Padrão(ões) vencido(s) na data da calibração: {}",
            style("!").yellow(),
            expired
                .iter()
                .map(|s| s.description.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let failed = record.checklist.failed();
    if !failed.is_empty() {
        println!("{} Checklist: {}", style("✗").red(), failed.join(", "));
    }
    let pending = record.checklist.pending();
    if !pending.is_empty() && !global.quiet {
        println!(
            "{} {} checklist item(s) unanswered (see `cca record check {}`)",
            style("!").yellow(),
            pending.len(),
            record.id
        );
    }
    if let Some(conclusion) = record.conclusion {
        println!("{} {}", style("Conclusão:").bold(), conclusion);
    }

    Ok(())
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let (record, analysis) = load_analysis(&args.id, global)?;
    let json = export_calibration_analysis_to_json(&analysis).into_diagnostic()?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", json)).into_diagnostic()?;
            if !global.quiet {
                println!(
                    "{} Exported analysis of record {} to {}",
                    style("✓").green(),
                    style(record.id).cyan(),
                    style(path.display()).cyan()
                );
            }
        }
        None => println!("{}", json),
    }
    Ok(())
}
