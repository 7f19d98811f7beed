//! `cca ref` command - Regulatory reference tables

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{print_serialized, resolve_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::reference::{Category, ReferenceEntry, ReferenceTables, TableKind};

#[derive(Subcommand, Debug)]
pub enum RefCommands {
    /// List the rows of a table
    List(ListArgs),

    /// First row whose description contains the query (case-insensitive)
    Lookup(LookupArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Table to list
    #[arg(value_enum)]
    pub table: TableKind,

    /// Only rows of this category
    #[arg(long, short = 'c')]
    pub category: Option<Category>,
}

#[derive(clap::Args, Debug)]
pub struct LookupArgs {
    /// Table to search
    #[arg(value_enum)]
    pub table: TableKind,

    /// Text to look for (e.g. "turbina")
    pub query: String,

    /// Only rows of this category
    #[arg(long, short = 'c')]
    pub category: Option<Category>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 4),
    ColumnDef::new("category", "CATEGORY", 11),
    ColumnDef::new("description", "DESCRIPTION", 48),
    ColumnDef::new("requirement", "REQUIREMENT", 14),
    ColumnDef::new("source", "SOURCE", 28),
];

/// Run a ref subcommand
pub fn run(cmd: RefCommands, global: &GlobalOpts) -> Result<()> {
    let tables = ReferenceTables::global()?;
    let config = Config::load_for(crate::cli::helpers::project(global).ok().as_ref());

    match cmd {
        RefCommands::List(args) => {
            let entries = tables.list(args.table, args.category);
            let format = resolve_format(global, &config, OutputFormat::Tsv);
            if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
                return print_serialized(&entries, format);
            }
            if !global.quiet && format == OutputFormat::Tsv {
                println!("{}", style(args.table.title()).bold());
                println!();
            }
            let mut formatter = TableFormatter::new(COLUMNS, "row");
            if global.quiet {
                formatter = formatter.without_summary();
            }
            formatter.output(entries.iter().map(row).collect(), format);
            Ok(())
        }
        RefCommands::Lookup(args) => {
            let entry = tables
                .lookup(args.table, args.category, &args.query)
                .ok_or_else(|| {
                    miette::miette!(
                        "No row of '{}' matches \"{}\"",
                        args.table,
                        args.query
                    )
                })?;

            match resolve_format(global, &config, OutputFormat::Tsv) {
                format @ (OutputFormat::Json | OutputFormat::Yaml) => {
                    print_serialized(&entry, format)
                }
                OutputFormat::Id => {
                    println!("{}", entry.id());
                    Ok(())
                }
                _ => {
                    println!(
                        "{} {} {}",
                        style(format!("#{}", entry.id())).cyan(),
                        entry.description(),
                        style(format!("({})", entry.category())).dim()
                    );
                    println!("   {}", style(entry.requirement()).green().bold());
                    println!("   {}", style(entry.source()).dim());
                    Ok(())
                }
            }
        }
    }
}

fn row(entry: &ReferenceEntry) -> TableRow {
    TableRow::new(entry.id())
        .cell("id", CellValue::Id(entry.id().to_string()))
        .cell("category", CellValue::Text(entry.category().to_string()))
        .cell("description", CellValue::Text(entry.description().to_string()))
        .cell("requirement", CellValue::Text(entry.requirement()))
        .cell("source", CellValue::Text(entry.source().to_string()))
}
