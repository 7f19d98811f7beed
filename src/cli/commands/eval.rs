//! `cca eval` command - Evaluate calibration data without a project

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::print_serialized;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::conformity::{
    parse_measurement, process_calibration_point, round4, validate_calibration_data,
};

#[derive(Subcommand, Debug)]
pub enum EvalCommands {
    /// Apply the decision rule |Erro| + U <= EMA to one point
    Point(PointArgs),

    /// Check text inputs before evaluation (all violations reported)
    Validate(ValidateArgs),
}

#[derive(clap::Args, Debug)]
pub struct PointArgs {
    /// Reference value (standard)
    #[arg(long, short = 'r', allow_hyphen_values = true)]
    pub reference: String,

    /// Measured value (instrument)
    #[arg(long, short = 'm', allow_hyphen_values = true)]
    pub measured: String,

    /// Expanded uncertainty (k=2)
    #[arg(long, short = 'U', allow_hyphen_values = true)]
    pub uncertainty: String,

    /// Maximum permissible error (EMA)
    #[arg(long, short = 'e', allow_hyphen_values = true)]
    pub limit: String,

    /// Point label
    #[arg(long, short = 'l', default_value = "P1")]
    pub label: String,
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Reference value
    #[arg(allow_hyphen_values = true)]
    pub reference: String,

    /// Measured value
    #[arg(allow_hyphen_values = true)]
    pub measured: String,

    /// Expanded uncertainty
    #[arg(allow_hyphen_values = true)]
    pub uncertainty: String,

    /// Maximum permissible error (EMA)
    #[arg(allow_hyphen_values = true)]
    pub limit: String,
}

/// Run an eval subcommand
pub fn run(cmd: EvalCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EvalCommands::Point(args) => run_point(args, global),
        EvalCommands::Validate(args) => run_validate(args, global),
    }
}

fn run_point(args: PointArgs, global: &GlobalOpts) -> Result<()> {
    let validation =
        validate_calibration_data(&args.reference, &args.measured, &args.uncertainty, &args.limit);
    if !validation.is_valid {
        for error in &validation.errors {
            eprintln!("{} {}", style("✗").red(), error);
        }
        return Err(miette::miette!(
            "Invalid calibration data ({} error(s))",
            validation.errors.len()
        ));
    }

    let point = process_calibration_point(
        args.label,
        parse_measurement(&args.reference),
        parse_measurement(&args.measured),
        parse_measurement(&args.uncertainty),
        parse_measurement(&args.limit),
    );

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(&point, global.format),
        _ => {
            let budget = round4(point.error.abs() + point.uncertainty);
            let (marker, verdict, relation) = if point.ok {
                (style("✓").green(), style("conforme").green(), "<=")
            } else {
                (style("✗").red(), style("não conforme").red().bold(), ">")
            };
            println!("{} {}: {}", marker, style(&point.point).cyan(), verdict);
            if !global.quiet {
                println!("   erro = {} - {} = {}", point.measured_value, point.reference_value, point.error);
                println!(
                    "   |erro| + U = {} + {} = {} {} EMA {}",
                    point.error.abs(),
                    point.uncertainty,
                    budget,
                    relation,
                    point.error_limit
                );
                println!("   margem = {}", point.margin());
            }
            Ok(())
        }
    }
}

fn run_validate(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let validation =
        validate_calibration_data(&args.reference, &args.measured, &args.uncertainty, &args.limit);

    if matches!(global.format, OutputFormat::Json | OutputFormat::Yaml) {
        print_serialized(&validation, global.format)?;
    } else if validation.is_valid {
        println!("{} Calibration data is valid", style("✓").green());
    } else {
        for error in &validation.errors {
            println!("{} {}", style("✗").red(), error);
        }
    }

    if validation.is_valid {
        Ok(())
    } else {
        Err(miette::miette!(
            "{} validation error(s)",
            validation.errors.len()
        ))
    }
}
