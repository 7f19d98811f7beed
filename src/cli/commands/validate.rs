//! `cca validate` command - Validate record files against the schema and the decision rule

use chrono::Utc;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cli::helpers::project;
use crate::cli::GlobalOpts;
use crate::conformity::generate_conformity_assessment;
use crate::core::store::RECORD_SUFFIX;
use crate::entities::AnalysisRecord;
use crate::schema::registry::SchemaRegistry;
use crate::schema::validator::Validator;
use crate::yaml::parse_yaml_str;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Paths to validate (default: every record of the project)
    #[arg()]
    pub paths: Vec<PathBuf>,

    /// Strict mode - calculation warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Continue validation after first error
    #[arg(long)]
    pub keep_going: bool,

    /// Show summary only, don't show individual errors
    #[arg(long)]
    pub summary: bool,

    /// Rewrite stale point errors, verdicts and the embedded assessment
    #[arg(long)]
    pub fix: bool,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    total_errors: usize,
    total_warnings: usize,
    files_fixed: usize,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let registry = SchemaRegistry::default();
    let validator = Validator::new(&registry);

    let files = if args.paths.is_empty() {
        let project = project(global)?;
        record_files_under(&project.records_dir())
    } else {
        expand_paths(&args.paths)
    };

    let mut stats = ValidationStats::default();
    let mut had_error = false;

    if !args.summary && !global.quiet {
        println!(
            "{} Validating {} file(s)...\n",
            style("→").blue(),
            files.len()
        );
    }

    for path in &files {
        stats.files_checked += 1;

        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if !args.summary {
                    println!("{} {} - {}", style("✗").red(), path.display(), e);
                }
                stats.files_failed += 1;
                stats.total_errors += 1;
                had_error = true;
                if !args.keep_going {
                    break;
                }
                continue;
            }
        };

        let filename = path.display().to_string();
        if let Err(e) = validator.validate(&content, &filename, "analysis") {
            stats.files_failed += 1;
            stats.total_errors += e.violation_count();
            had_error = true;

            if !args.summary {
                println!(
                    "{} {} - {} error(s)",
                    style("✗").red(),
                    path.display(),
                    e.violation_count()
                );
                println!("{:?}", miette::Report::new(e));
            }

            if !args.keep_going {
                break;
            }
            continue;
        }

        let record: AnalysisRecord = match parse_yaml_str(&content, &filename) {
            Ok(record) => record,
            Err(e) => {
                stats.files_failed += 1;
                stats.total_errors += 1;
                had_error = true;
                if !args.summary {
                    println!(
                        "{} {} - does not load as an analysis record",
                        style("✗").red(),
                        path.display()
                    );
                    println!("{:?}", miette::Report::new(e));
                }
                if !args.keep_going {
                    break;
                }
                continue;
            }
        };

        let issues = check_calculations(&record, path, args.fix)?;
        if issues.is_empty() {
            stats.files_passed += 1;
            if !args.summary && !global.quiet {
                println!("{} {}", style("✓").green(), path.display());
            }
        } else if args.fix {
            stats.files_passed += 1;
            stats.files_fixed += 1;
            if !args.summary && !global.quiet {
                println!("{} {} (fixed)", style("✓").green(), path.display());
            }
        } else {
            stats.total_warnings += issues.len();
            if !args.summary {
                println!(
                    "{} {} - {} calculation warning(s)",
                    style("!").yellow(),
                    path.display(),
                    issues.len()
                );
                for issue in &issues {
                    println!("    {}", style(issue).yellow());
                }
            }
            if args.strict {
                stats.files_failed += 1;
                had_error = true;
            } else {
                stats.files_passed += 1;
            }
        }
    }

    if !global.quiet {
        print_summary(&stats);
    }

    if had_error {
        if stats.files_failed == 1 {
            Err(miette::miette!("Validation failed: 1 file has errors"))
        } else {
            Err(miette::miette!(
                "Validation failed: {} files have errors",
                stats.files_failed
            ))
        }
    } else {
        if !global.quiet {
            println!("{} All files passed validation!", style("✓").green().bold());
        }
        Ok(())
    }
}

fn print_summary(stats: &ValidationStats) {
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Files checked:  {}", style(stats.files_checked).cyan());
    println!("  Files passed:   {}", style(stats.files_passed).green());
    println!("  Files failed:   {}", style(stats.files_failed).red());
    println!("  Total errors:   {}", style(stats.total_errors).red());
    if stats.total_warnings > 0 {
        println!("  Total warnings: {}", style(stats.total_warnings).yellow());
    }
    if stats.files_fixed > 0 {
        println!("  Files fixed:    {}", style(stats.files_fixed).cyan());
    }
    println!();
}

/// Record files directly under `dir`, sorted
fn record_files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.to_string_lossy().ends_with(RECORD_SUFFIX))
        .collect();
    files.sort();
    files
}

/// Expand paths - directories contribute their record files, files are taken as given
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(record_files_under(path));
        } else {
            files.push(path.clone());
        }
    }
    files
}

/// Compare stored errors, verdicts and assessment with a fresh evaluation
///
/// With `fix`, the file is rewritten with the recomputed values and a new
/// `updated` timestamp.
fn check_calculations(record: &AnalysisRecord, path: &Path, fix: bool) -> Result<Vec<String>> {
    let mut issues: Vec<String> = record
        .stale_points()
        .iter()
        .map(|p| {
            let mut fresh = (*p).clone();
            fresh.refresh();
            format!(
                "point {}: stored error {} / ok {}, calculated {} / {}",
                p.point, p.error, p.ok, fresh.error, fresh.ok
            )
        })
        .collect();

    let mut evaluated = record.clone();
    evaluated.evaluate();

    if let Some(ref stored) = record.conformity {
        let fresh = generate_conformity_assessment(&evaluated.calibration_points);
        if stored.status != fresh.status || stored.non_conforming_labels != fresh.non_conforming_labels
        {
            issues.push(format!(
                "conformity: stored {} ({}), calculated {} ({})",
                stored.status,
                stored.non_conforming_labels.join(", "),
                fresh.status,
                fresh.non_conforming_labels.join(", ")
            ));
        }
    }
    if record.recommendation != evaluated.recommendation {
        issues.push(match record.recommendation {
            Some(_) => "recommendation does not match the current points".to_string(),
            None => "recommendation missing for the current points".to_string(),
        });
    }

    if fix && !issues.is_empty() {
        evaluated.updated = Utc::now();
        let yaml = serde_yml::to_string(&evaluated).into_diagnostic()?;
        fs::write(path, yaml).into_diagnostic()?;
    }

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformity::{process_calibration_point, CalibrationRange};
    use chrono::TimeZone;

    fn sample_record(edit: impl FnOnce(&mut AnalysisRecord)) -> AnalysisRecord {
        let mut record = AnalysisRecord::new("PT-01".to_string(), "tester".to_string());
        record.calibration_range = Some(CalibrationRange::new(0.0, 10.0, "bar"));
        record.calibration_points = vec![
            process_calibration_point("P1", 0.0, 0.01, 0.01, 0.05),
            process_calibration_point("P2", 5.0, 5.02, 0.01, 0.05),
        ];
        record.evaluate();
        edit(&mut record);
        record
    }

    fn reload(path: &Path) -> AnalysisRecord {
        serde_yml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_consistent_record_has_no_issues() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("analysis-00001.cca.yaml");
        let record = sample_record(|_| {});
        assert!(check_calculations(&record, &path, false).unwrap().is_empty());
    }

    #[test]
    fn test_tampered_measurement_is_reported_and_fixed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("analysis-00001.cca.yaml");
        let record = sample_record(|r| {
            r.calibration_points[1].measured_value = 5.09;
            r.updated = Utc.timestamp_opt(0, 0).unwrap();
        });
        fs::write(&path, serde_yml::to_string(&record).unwrap()).unwrap();

        let issues = check_calculations(&record, &path, false).unwrap();
        assert!(issues.iter().any(|i| i.starts_with("point P2")));
        assert!(issues.iter().any(|i| i.starts_with("conformity")));

        check_calculations(&record, &path, true).unwrap();
        let fixed = reload(&path);
        assert!(fixed.updated > record.updated);
        assert!(check_calculations(&fixed, &path, false).unwrap().is_empty());
    }

    #[test]
    fn test_missing_recommendation_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("analysis-00001.cca.yaml");
        let record = sample_record(|r| r.recommendation = None);

        let issues = check_calculations(&record, &path, false).unwrap();
        assert_eq!(issues, vec!["recommendation missing for the current points"]);

        check_calculations(&record, &path, true).unwrap();
        assert!(reload(&path).recommendation.is_some());
    }
}
