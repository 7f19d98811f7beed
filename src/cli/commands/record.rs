//! `cca record` command - Critical analysis record management

use clap::{Subcommand, ValueEnum};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::helpers::{
    is_interactive, open_store, parse_assignment, parse_id, print_serialized, resolve_format,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::conformity::{CalibrationRange, ConformityStatus};
use crate::core::config::Config;
use crate::core::entity::ReviewStatus;
use crate::core::identity::RecordId;
use crate::core::store::{FileStore, RecordStore};
use crate::entities::{AnalysisRecord, ChecklistAnswer, RegulatoryRequirements};
use crate::reference::{Category, MeasurementApplication, ReferenceTables};
use crate::schema::template::{TemplateContext, TemplateGenerator};
use crate::schema::validator::{yaml_to_json, Validator};
use crate::schema::wizard::Wizard;
use crate::yaml::parse_yaml_file;

#[derive(Subcommand, Debug)]
pub enum RecordCommands {
    /// Create a new critical analysis record
    New(NewArgs),

    /// List records with filtering
    List(ListArgs),

    /// Show a record
    Show(ShowArgs),

    /// Edit a record in your editor, then re-evaluate it
    Edit(EditArgs),

    /// Set top-level fields (key=value, value parsed as JSON when possible)
    Set(SetArgs),

    /// Answer a checklist question
    Check(CheckArgs),

    /// Delete a record
    Delete(DeleteArgs),

    /// Print a blank record form
    Template(TemplateArgs),

    /// Create a record from a YAML file (schema-validated)
    Import(ImportArgs),
}

/// Review status filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilter {
    Draft,
    InReview,
    Approved,
    Rejected,
    All,
}

/// Conformity filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConformityFilter {
    Conforming,
    NonConforming,
    NoData,
    /// Records never evaluated
    Unevaluated,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Id,
    Title,
    Tag,
    Status,
    Created,
    Updated,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Record title (prompted for when omitted in a terminal)
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Instrument tag (e.g. FT-101)
    #[arg(long)]
    pub tag: Option<String>,

    /// Instrument type (e.g. "transmissor de pressão")
    #[arg(long = "type", short = 'T')]
    pub instrument_type: Option<String>,

    /// Instrument category (default: config `default_category`)
    #[arg(long, short = 'c')]
    pub category: Option<Category>,

    /// Measurement application
    #[arg(long, short = 'a')]
    pub application: Option<MeasurementApplication>,

    /// Calibration laboratory (default: config `laboratory`)
    #[arg(long)]
    pub lab: Option<String>,

    /// Certificate number
    #[arg(long)]
    pub cert: Option<String>,

    /// Calibration range minimum
    #[arg(long, requires = "max", allow_negative_numbers = true)]
    pub min: Option<f64>,

    /// Calibration range maximum
    #[arg(long, requires = "min", allow_negative_numbers = true)]
    pub max: Option<f64>,

    /// Unit of the calibration range
    #[arg(long, short = 'u', default_value = "")]
    pub unit: String,

    /// Copy the first matching regulatory requirements into the record
    #[arg(long)]
    pub prefill: bool,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,

    /// Skip opening in editor
    #[arg(long)]
    pub no_edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by review status
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,

    /// Filter by instrument category
    #[arg(long, short = 'c')]
    pub category: Option<Category>,

    /// Filter by conformity outcome
    #[arg(long, default_value = "all")]
    pub conformity: ConformityFilter,

    /// Search in title, tag, certificate number and laboratory
    #[arg(long)]
    pub search: Option<String>,

    /// Sort by field
    #[arg(long, default_value = "id")]
    pub sort: SortField,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Record id (7, #7 or CCA-7)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Record id
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Record id
    pub id: String,

    /// Assignments such as `status=in_review` or `operational_range={"min":10,"max":90,"unit":"kPa"}`
    #[arg(required = true)]
    pub assignments: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Record id
    pub id: String,

    /// Checklist item (e.g. accredited_laboratory); omit to list the checklist
    pub item: Option<String>,

    /// Answer: yes/sim, no/nao, na
    #[arg(requires = "item")]
    pub answer: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Record id
    pub id: String,

    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Title to pre-fill
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Instrument tag to pre-fill
    #[arg(long)]
    pub tag: Option<String>,

    /// Instrument type to pre-fill
    #[arg(long = "type", short = 'T')]
    pub instrument_type: Option<String>,

    /// Instrument category
    #[arg(long, short = 'c')]
    pub category: Option<Category>,

    /// Measurement application
    #[arg(long, short = 'a')]
    pub application: Option<MeasurementApplication>,

    /// Unit of the calibration range
    #[arg(long, short = 'u')]
    pub unit: Option<String>,

    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// YAML files to import
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Run a record subcommand
pub fn run(cmd: RecordCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RecordCommands::New(args) => run_new(args, global),
        RecordCommands::List(args) => run_list(args, global),
        RecordCommands::Show(args) => run_show(args, global),
        RecordCommands::Edit(args) => run_edit(args, global),
        RecordCommands::Set(args) => run_set(args, global),
        RecordCommands::Check(args) => run_check(args, global),
        RecordCommands::Delete(args) => run_delete(args, global),
        RecordCommands::Template(args) => run_template(args, global),
        RecordCommands::Import(args) => run_import(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let (project, mut store) = open_store(global)?;
    let config = Config::load_for(Some(&project));

    let interactive = args.interactive || (args.title.is_none() && is_interactive());
    let title = match args.title {
        Some(title) => title,
        None if interactive => String::new(),
        None => return Err(miette::miette!("Title is required (use --title or -t)")),
    };

    let mut record = AnalysisRecord::new(title, config.author());
    record.instrument.tag = args.tag;
    record.instrument.instrument_type = args.instrument_type;
    record.instrument.category = args.category.or(config.default_category);
    record.instrument.application = args.application;
    record.certificate.laboratory = args.lab.or_else(|| config.laboratory.clone());
    record.certificate.number = args.cert;
    if let (Some(min), Some(max)) = (args.min, args.max) {
        record.calibration_range = Some(CalibrationRange::new(min, max, args.unit));
    }

    if interactive {
        Wizard::new().fill_record(&mut record)?;
    }

    if args.prefill {
        let tables = ReferenceTables::global()?;
        record.requirements = RegulatoryRequirements::prefill(tables, &record.instrument);
        if record.requirements.is_empty() && !global.quiet {
            println!(
                "{} No regulatory requirement matched this instrument",
                style("!").yellow()
            );
        }
    }

    record.evaluate();
    let record = store.create(record)?;
    let path = store.path_for(record.id);

    if global.quiet || global.format == OutputFormat::Id {
        println!("{}", record.id);
    } else {
        println!(
            "{} Created analysis record {}",
            style("✓").green(),
            style(record.id).cyan()
        );
        println!("   {}", style(path.display()).dim());
        println!(
            "   {} | {}",
            style(record.instrument.tag.as_deref().unwrap_or("-")).yellow(),
            style(&record.title).white()
        );
        if let Some(ref max_uncertainty) = record.requirements.max_uncertainty {
            println!("   max. uncertainty: {}", max_uncertainty);
        }
        if let Some(ref interval) = record.requirements.calibration_interval {
            println!("   calibration interval: {}", interval);
        }
    }

    if args.edit || (!args.no_edit && !interactive && is_interactive()) {
        edit_and_refresh(&mut store, &config, record.id, global)?;
    }

    Ok(())
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("title", "TITLE", 32),
    ColumnDef::new("tag", "TAG", 12),
    ColumnDef::new("category", "CATEGORY", 11),
    ColumnDef::new("status", "STATUS", 10),
    ColumnDef::new("conformity", "CONFORMITY", 14),
    ColumnDef::new("points", "POINTS", 6),
    ColumnDef::new("updated", "UPDATED", 10),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store) = open_store(global)?;
    let config = Config::load_for(Some(&project));

    let search = args.search.as_ref().map(|s| s.to_lowercase());
    let mut records: Vec<AnalysisRecord> = store
        .list()?
        .into_iter()
        .filter(|r| match args.status {
            StatusFilter::Draft => r.status == ReviewStatus::Draft,
            StatusFilter::InReview => r.status == ReviewStatus::InReview,
            StatusFilter::Approved => r.status == ReviewStatus::Approved,
            StatusFilter::Rejected => r.status == ReviewStatus::Rejected,
            StatusFilter::All => true,
        })
        .filter(|r| args.category.is_none_or(|c| r.instrument.category == Some(c)))
        .filter(|r| {
            let status = r.conformity.as_ref().map(|c| c.status);
            match args.conformity {
                ConformityFilter::Conforming => status == Some(ConformityStatus::Conforming),
                ConformityFilter::NonConforming => {
                    status == Some(ConformityStatus::NonConforming)
                }
                ConformityFilter::NoData => status == Some(ConformityStatus::NoData),
                ConformityFilter::Unevaluated => status.is_none(),
                ConformityFilter::All => true,
            }
        })
        .filter(|r| match search {
            Some(ref needle) => [
                Some(r.title.as_str()),
                r.instrument.tag.as_deref(),
                r.certificate.number.as_deref(),
                r.certificate.laboratory.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle)),
            None => true,
        })
        .collect();

    match args.sort {
        SortField::Id => records.sort_by_key(|r| r.id),
        SortField::Title => records.sort_by(|a, b| a.title.cmp(&b.title)),
        SortField::Tag => records.sort_by(|a, b| a.instrument.tag.cmp(&b.instrument.tag)),
        SortField::Status => records.sort_by_key(|r| r.status),
        SortField::Created => records.sort_by_key(|r| r.created),
        SortField::Updated => records.sort_by_key(|r| r.updated),
    }

    if args.reverse {
        records.reverse();
    }

    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    if args.count {
        println!("{}", records.len());
        return Ok(());
    }

    let format = resolve_format(global, &config, OutputFormat::Tsv);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => return print_serialized(&records, format),
        _ => {}
    }

    if records.is_empty() {
        if format != OutputFormat::Id && !global.quiet {
            println!("No records found.");
        }
        return Ok(());
    }

    let rows: Vec<TableRow> = records
        .iter()
        .map(|r| {
            TableRow::new(r.id)
                .cell("id", CellValue::Id(r.id.to_string()))
                .cell("title", CellValue::Text(r.title.clone()))
                .cell("tag", CellValue::text(r.instrument.tag.as_ref()))
                .cell("category", CellValue::text(r.instrument.category))
                .cell("status", CellValue::Status(r.status))
                .cell(
                    "conformity",
                    CellValue::Conformity(r.conformity.as_ref().map(|c| c.status)),
                )
                .cell("points", CellValue::Number(r.calibration_points.len() as u64))
                .cell("updated", CellValue::Timestamp(r.updated))
        })
        .collect();

    let mut formatter = TableFormatter::new(LIST_COLUMNS, "record");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(rows, format);
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store) = open_store(global)?;
    let config = Config::load_for(Some(&project));
    let id = parse_id(&args.id)?;
    let record = store.require(id)?;

    match resolve_format(global, &config, OutputFormat::Yaml) {
        OutputFormat::Json => print_serialized(&record, OutputFormat::Json),
        OutputFormat::Id => {
            println!("{}", record.id);
            Ok(())
        }
        _ => {
            let content = fs::read_to_string(store.path_for(id)).into_diagnostic()?;
            print!("{}", content);
            Ok(())
        }
    }
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let (project, mut store) = open_store(global)?;
    let config = Config::load_for(Some(&project));
    let id = parse_id(&args.id)?;
    store.require(id)?;
    edit_and_refresh(&mut store, &config, id, global)
}

/// Open the record file in the editor, then validate, re-evaluate and save it
fn edit_and_refresh(
    store: &mut FileStore<AnalysisRecord>,
    config: &Config,
    id: RecordId,
    global: &GlobalOpts,
) -> Result<()> {
    let path = store.path_for(id);
    if !global.quiet {
        println!(
            "Opening {} in {}...",
            style(path.display()).cyan(),
            style(config.editor()).yellow()
        );
    }
    config.run_editor(&path).into_diagnostic()?;

    let content = fs::read_to_string(&path).into_diagnostic()?;
    let filename = path.display().to_string();
    Validator::default().validate(&content, &filename, "analysis")?;

    let mut record: AnalysisRecord = parse_yaml_file(&path)?;
    if record.id != id {
        return Err(miette::miette!(
            "{} changed the record id from {} to {}; ids are assigned by the store",
            filename,
            id,
            record.id
        ));
    }
    record.revision += 1;
    record.evaluate();
    let record = store.save(&record)?;
    debug!(id = %id, revision = record.revision, "re-evaluated edited record");

    if !global.quiet {
        print_conformity_line(&record);
    }
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let id = parse_id(&args.id)?;

    let mut patch = Map::new();
    for assignment in &args.assignments {
        let (key, value) = parse_assignment(assignment)?;
        patch.insert(key, value);
    }

    let mut record = store.update(id, &Value::Object(patch))?;
    record.evaluate();
    let record = store.save(&record)?;

    if !global.quiet {
        println!(
            "{} Updated record {} ({})",
            style("✓").green(),
            style(record.id).cyan(),
            args.assignments
                .iter()
                .filter_map(|a| a.split_once('=').map(|(k, _)| k.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}

fn run_check(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let id = parse_id(&args.id)?;
    let mut record = store.require(id)?;

    let (Some(item), Some(answer)) = (args.item.as_deref(), args.answer.as_deref()) else {
        for (key, label, answer) in record.checklist.items() {
            let answer = match answer {
                Some(ChecklistAnswer::Yes) => style("sim".to_string()).green(),
                Some(ChecklistAnswer::No) => style("não".to_string()).red().bold(),
                Some(ChecklistAnswer::NotApplicable) => style("n/a".to_string()).dim(),
                None => style("?".to_string()).yellow(),
            };
            println!("{:<4} {:<32} {}", answer, style(key).cyan(), label);
        }
        return Ok(());
    };

    let answer: ChecklistAnswer = answer.parse().map_err(|e| miette::miette!("{}", e))?;
    record
        .checklist
        .set(item, answer)
        .map_err(|e| miette::miette!("{}", e))?;
    let record = store.save(&record)?;

    if !global.quiet {
        let pending = record.checklist.pending().len();
        println!(
            "{} {} = {} ({} pending)",
            style("✓").green(),
            style(item).cyan(),
            answer,
            pending
        );
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let id = parse_id(&args.id)?;
    let record = store.require(id)?;

    if !args.yes {
        if !is_interactive() {
            return Err(miette::miette!(
                "Refusing to delete record {} without confirmation (use --yes)",
                id
            ));
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete record {} \"{}\"?", id, record.title))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete(id)?;
    if !global.quiet {
        println!(
            "{} Deleted record {} ({})",
            style("✓").green(),
            style(id).cyan(),
            record.title
        );
    }
    Ok(())
}

fn run_template(args: TemplateArgs, global: &GlobalOpts) -> Result<()> {
    let project = crate::cli::helpers::project(global).ok();
    let config = Config::load_for(project.as_ref());

    let mut ctx = TemplateContext::new(config.author())
        .with_laboratory(config.laboratory.clone())
        .with_category(args.category.or(config.default_category))
        .with_application(args.application);
    if let Some(title) = args.title {
        ctx = ctx.with_title(title);
    }
    if let Some(tag) = args.tag {
        ctx = ctx.with_tag(tag);
    }
    if let Some(instrument_type) = args.instrument_type {
        ctx = ctx.with_instrument_type(instrument_type);
    }
    if let Some(unit) = args.unit {
        ctx = ctx.with_unit(unit);
    }

    let generator = TemplateGenerator::new().map_err(|e| miette::miette!("{}", e))?;
    let yaml = generator
        .generate_analysis(&ctx)
        .map_err(|e| miette::miette!("{}", e))?;

    match args.output {
        Some(path) => {
            fs::write(&path, yaml).into_diagnostic()?;
            if !global.quiet {
                println!(
                    "{} Wrote blank form to {}",
                    style("✓").green(),
                    style(path.display()).cyan()
                );
                println!("   Fill it in, then run {}", style("cca record import").yellow());
            }
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let (project, mut store) = open_store(global)?;
    let config = Config::load_for(Some(&project));
    let validator = Validator::default();

    for file in &args.files {
        let content = fs::read_to_string(file)
            .map_err(|e| miette::miette!("cannot read {}: {}", file.display(), e))?;
        let filename = file.display().to_string();

        let mut value = yaml_to_json(&content, &filename)?;
        let Value::Object(ref mut fields) = value else {
            return Err(miette::miette!("{} does not contain a YAML mapping", filename));
        };
        let now = Value::String(chrono::Utc::now().to_rfc3339());
        fields.entry("id").or_insert(Value::from(1));
        fields.entry("created").or_insert_with(|| now.clone());
        fields.entry("updated").or_insert(now);
        fields
            .entry("author")
            .or_insert_with(|| Value::String(config.author()));

        validator.validate_value(&value, &content, &filename, "analysis")?;
        let mut record: AnalysisRecord = serde_json::from_value(value)
            .map_err(|e| miette::miette!("{}: {}", filename, e))?;
        record.evaluate();
        let record = store.create(record)?;

        if global.quiet {
            println!("{}", record.id);
        } else {
            println!(
                "{} Imported {} as record {}",
                style("✓").green(),
                style(&filename).dim(),
                style(record.id).cyan()
            );
            print_conformity_line(&record);
        }
    }
    Ok(())
}

/// One-line conformity summary after a record changed
pub(crate) fn print_conformity_line(record: &AnalysisRecord) {
    let Some(ref conformity) = record.conformity else {
        return;
    };
    let marker = match conformity.status {
        ConformityStatus::Conforming => style("✓").green(),
        ConformityStatus::NonConforming => style("✗").red(),
        ConformityStatus::NoData => style("-").dim(),
    };
    println!("   {} {}", marker, conformity.summary);
}
