//! CLI output formatting for build, check, and validate.
//!
//! Output is information-centric: each entity leads with its positional
//! index and identifier, with derived numbers (chapter counts, item
//! totals) as trailing detail and findings as indented context lines.
//!
//! Each surface has a `format_*` function returning lines (pure, no
//! I/O — that is what the tests exercise) and a `print_*` wrapper that
//! writes them to stdout.

use crate::generate::BuildReport;
use crate::scan::Manifest;
use crate::validate::ValidationReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{pos:0>3}")
}

fn push_findings(lines: &mut Vec<String>, label: &str, findings: &[String]) {
    if findings.is_empty() {
        return;
    }
    lines.push(format!("{label}:"));
    for finding in findings {
        lines.push(format!("    - {finding}"));
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format the outcome of a full build.
///
/// ```text
/// Books
/// 001 three-body (2 chapters, 2 rendered)
///
/// Feed: 3 items (1 book, 1 pagebook, 1 article)
/// ```
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.books.is_empty() {
        lines.push("Books".to_string());
        for (i, book) in report.books.iter().enumerate() {
            lines.push(format!(
                "{} {} ({} chapters, {} rendered)",
                format_index(i + 1),
                book.id,
                book.chapters,
                book.rendered
            ));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "Feed: {} items ({} {}, {} {}, {} {})",
        report.items,
        report.books.len(),
        plural(report.books.len(), "book"),
        report.pagebooks,
        plural(report.pagebooks, "pagebook"),
        report.articles,
        plural(report.articles, "article"),
    ));

    push_findings(&mut lines, "Warnings", &report.warnings);
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{line}");
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the outcome of a scan-only check (nothing written).
pub fn format_check_output(manifest: &Manifest) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Books".to_string());
    for (i, book) in manifest.books.iter().enumerate() {
        lines.push(format!(
            "{} {} ({} chapters)",
            format_index(i + 1),
            book.meta.id,
            book.chapters.len()
        ));
    }

    if !manifest.pagebooks.is_empty() {
        lines.push("Pagebooks".to_string());
        for (i, pagebook) in manifest.pagebooks.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), pagebook.id));
        }
    }

    if !manifest.articles.is_empty() {
        lines.push("Articles".to_string());
        for (i, article) in manifest.articles.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), article.meta.id));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Config: {} categories, {} featured",
        manifest.config.categories.len(),
        manifest.config.featured.len()
    ));

    push_findings(&mut lines, "Warnings", &manifest.warnings);
    lines
}

pub fn print_check_output(manifest: &Manifest) {
    for line in format_check_output(manifest) {
        println!("{line}");
    }
}

// ============================================================================
// Validate
// ============================================================================

/// Format a validation report. The final line states the verdict.
pub fn format_validation_output(report: &ValidationReport) -> Vec<String> {
    let mut lines = Vec::new();

    push_findings(&mut lines, "Warnings", &report.warnings);
    push_findings(&mut lines, "Errors", &report.errors);

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(if report.valid() {
        "Validation passed".to_string()
    } else {
        format!("Validation FAILED ({} errors)", report.errors.len())
    });
    lines
}

pub fn print_validation_output(report: &ValidationReport) {
    for line in format_validation_output(report) {
        println!("{line}");
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}
