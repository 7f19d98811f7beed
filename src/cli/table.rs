//! Table output shared by the list commands
//!
//! Rows are built from typed cells so each output format can render them
//! its own way: padded and coloured for the terminal, RFC 4180 for CSV and
//! a `tabled` markdown table for Md.

use chrono::{DateTime, Local, NaiveDate, Utc};
use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::conformity::ConformityStatus;
use crate::core::entity::ReviewStatus;

/// A typed cell value
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Record id or other key, cyan
    Id(String),
    /// Plain text, truncated to the column
    Text(String),
    /// Review status with colour coding
    Status(ReviewStatus),
    /// Conformity outcome with colour coding ("-" when not evaluated)
    Conformity(Option<ConformityStatus>),
    /// Point verdict (✓ / ✗)
    Verdict(bool),
    /// Float value with precision
    Float(f64, usize),
    /// Integer value
    Number(u64),
    /// Calendar date
    Date(NaiveDate),
    /// Timestamp shown as a local date
    Timestamp(DateTime<Utc>),
    Empty,
}

impl CellValue {
    /// Optional text, `-` when absent
    pub fn text(value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => CellValue::Text(v.to_string()),
            None => CellValue::Empty,
        }
    }

    /// Unstyled text, used by CSV, Md and ID output
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => s.clone(),
            CellValue::Status(status) => status.to_string(),
            CellValue::Conformity(Some(status)) => status.to_string(),
            CellValue::Conformity(None) => "-".to_string(),
            CellValue::Verdict(ok) => String::from(if *ok { "ok" } else { "fail" }),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::Number(n) => n.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Timestamp(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d").to_string()
            }
            CellValue::Empty => "-".to_string(),
        }
    }

    fn width(&self) -> usize {
        match self {
            CellValue::Verdict(_) => 1,
            other => other.raw().chars().count(),
        }
    }

    /// Padded, coloured terminal rendering
    fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(id).cyan(), width = width),
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width), width = width)
            }
            CellValue::Status(status) => {
                let s = status.to_string();
                let styled = match status {
                    ReviewStatus::Draft => style(s).dim(),
                    ReviewStatus::InReview => style(s).yellow(),
                    ReviewStatus::Approved => style(s).green(),
                    ReviewStatus::Rejected => style(s).red(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Conformity(status) => {
                let s = self.raw();
                let styled = match status {
                    Some(ConformityStatus::Conforming) => style(s).green(),
                    Some(ConformityStatus::NonConforming) => style(s).red().bold(),
                    Some(ConformityStatus::NoData) | None => style(s).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Verdict(ok) => {
                let styled = if *ok {
                    style("✓").green()
                } else {
                    style("✗").red().bold()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Float(_, _) | CellValue::Number(_) => {
                format!("{:>width$}", self.raw(), width = width)
            }
            CellValue::Date(_) | CellValue::Timestamp(_) => {
                format!("{:<width$}", self.raw(), width = width)
            }
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
        }
    }
}

/// Column definition: key, header and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// One output row
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Prints rows in the requested format
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    noun: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], noun: &'static str) -> Self {
        Self {
            columns,
            noun,
            show_summary: true,
        }
    }

    /// Drop the trailing "N found" line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    pub fn output(&self, rows: Vec<TableRow>, format: OutputFormat) {
        match format {
            OutputFormat::Csv => self.output_csv(&rows),
            OutputFormat::Md => print!("{}", self.render_md(&rows)),
            OutputFormat::Id => {
                for row in &rows {
                    println!("{}", row.id);
                }
            }
            _ => self.output_tsv(&rows),
        }
    }

    fn widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(CellValue::width)
                    .max()
                    .unwrap_or(0);
                content.max(col.header.len()).min(col.width)
            })
            .collect()
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.widths(rows);

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        println!("{}", header.join("  "));
        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        println!("{}", style("─".repeat(total)).dim());

        for row in rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| match row.get(col.key) {
                    Some(value) => value.format_tsv(*w),
                    None => CellValue::Empty.format_tsv(*w),
                })
                .collect();
            println!("{}", cells.join("  ").trim_end());
        }

        if self.show_summary {
            println!();
            println!("{} {}(s) found.", style(rows.len()).cyan(), self.noun);
        }
    }

    fn output_csv(&self, rows: &[TableRow]) {
        let header: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        println!("{}", header.join(","));
        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| match row.get(col.key) {
                    Some(CellValue::Empty) | None => String::new(),
                    Some(value) => escape_csv(&value.raw()),
                })
                .collect();
            println!("{}", values.join(","));
        }
    }

    /// Markdown table (pipes in cells are escaped)
    pub fn render_md(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.to_string()));
        for row in rows {
            builder.push_record(self.columns.iter().map(|col| {
                row.get(col.key)
                    .map(CellValue::raw)
                    .unwrap_or_else(|| "-".to_string())
                    .replace('|', "\\|")
            }));
        }
        format!("{}\n", builder.build().with(Style::markdown()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("id", "ID", 6),
        ColumnDef::new("title", "TITLE", 20),
        ColumnDef::new("ok", "OK", 4),
    ];

    fn rows() -> Vec<TableRow> {
        vec![
            TableRow::new(1)
                .cell("id", CellValue::Id("1".to_string()))
                .cell("title", CellValue::Text("FT-101 | gás".to_string()))
                .cell("ok", CellValue::Verdict(true)),
            TableRow::new(2)
                .cell("id", CellValue::Id("2".to_string()))
                .cell("ok", CellValue::Verdict(false)),
        ]
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let md = TableFormatter::new(COLUMNS, "record").render_md(&rows());
        assert!(md.contains("| ID"));
        assert!(md.contains("FT-101 \\| gás"));
        assert!(md.contains("fail"));
    }

    #[test]
    fn test_widths_capped() {
        let formatter = TableFormatter::new(COLUMNS, "record");
        let widths = formatter.widths(&rows());
        assert_eq!(widths, vec![2, 12, 2]);
    }

    #[test]
    fn test_cell_raw() {
        assert_eq!(CellValue::Float(0.05, 4).raw(), "0.0500");
        assert_eq!(CellValue::text(None::<String>).raw(), "-");
        assert_eq!(
            CellValue::Conformity(Some(ConformityStatus::NonConforming)).raw(),
            "non_conforming"
        );
    }
}
