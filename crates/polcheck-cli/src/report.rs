//! Markdown compliance report for a checked document.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use polcheck_ai::DocumentCheck;
use polcheck_core::{Citation, PolicyCheckerError, Result};
use tracing::info;

/// Longest document stem kept in a report file name.
const MAX_STEM_CHARS: usize = 50;

/// `compliance_report_<stem>_<YYYY-MM-DD_HH-MM-SS>.md`, with the stem
/// reduced to file-name-safe characters.
pub fn report_file_name(document_name: &str, at: DateTime<Local>) -> String {
    let stem = Path::new(document_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let safe: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_CHARS)
        .collect();
    let safe = if safe.is_empty() { "document".to_string() } else { safe };
    format!(
        "compliance_report_{safe}_{}.md",
        at.format("%Y-%m-%d_%H-%M-%S")
    )
}

pub fn render_report(document_name: &str, check: &DocumentCheck, at: DateTime<Local>) -> String {
    let analysis = &check.analysis;
    let mut out = String::new();

    let _ = writeln!(out, "# Document Compliance Analysis Report\n");
    let _ = writeln!(out, "**Date:** {}  ", at.format("%d %B %Y, %H:%M"));
    let _ = writeln!(out, "**Document Analyzed:** {document_name}\n");

    let _ = writeln!(out, "## Summary\n\n{}\n", analysis.summary);

    if let Some(score) = analysis.compliance_score {
        let _ = writeln!(out, "## Compliance Score\n\n{score:.1}/100\n");
    }

    let _ = writeln!(out, "## Identified Discrepancies\n");
    if analysis.has_discrepancies() {
        for (i, d) in analysis.discrepancies.iter().enumerate() {
            let _ = writeln!(out, "### Discrepancy {}: {}\n", i + 1, d.title);
            let _ = writeln!(out, "- **Issue:** {}", d.issue);
            let _ = writeln!(out, "- **Location in Document:** {}", d.location_in_document);
            let _ = writeln!(out, "- **Regulatory Violation:** {}", d.regulatory_violation);
            let _ = writeln!(out, "- **Citation:** {}", citation_line(&d.citation));
            if let Some(severity) = &d.severity {
                let _ = writeln!(out, "- **Severity:** {severity}");
            }
            let _ = writeln!(out, "- **Required Action:** {}\n", d.required_action);
        }
    } else {
        let _ = writeln!(
            out,
            "No discrepancies found. The document appears compliant with the analyzed regulations.\n"
        );
    }

    if !analysis.recommendations.is_empty() {
        let _ = writeln!(out, "## Recommendations\n");
        for rec in &analysis.recommendations {
            let _ = writeln!(out, "- {rec}");
        }
        let _ = writeln!(out);
    }

    let stats = &check.stats;
    let _ = writeln!(out, "## Citation Validation\n");
    let _ = writeln!(
        out,
        "{} of {} citations validated against retrieved regulation text ({:.0}%).\n",
        stats.validated,
        stats.total_citations,
        stats.validation_rate * 100.0
    );

    let _ = writeln!(out, "_Generated automatically by polcheck._");
    out
}

fn citation_line(citation: &Citation) -> String {
    match (citation.source_document(), citation.source_article()) {
        (Some(source), Some(article)) if citation.is_validated() => {
            format!("{citation} (validated: {source}, Article {article})")
        }
        _ => format!("{citation} (not validated)"),
    }
}

/// Write the report into `dir`, creating it if needed.
pub fn write_report(dir: &Path, document_name: &str, check: &DocumentCheck) -> Result<PathBuf> {
    let now = Local::now();
    let path = dir.join(report_file_name(document_name, now));
    std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&path, render_report(document_name, check, now)))
        .map_err(|e| {
            PolicyCheckerError::ReportGeneration(format!("writing {}: {e}", path.display()))
        })?;
    info!(path = %path.display(), "compliance report saved");
    Ok(path)
}
