//! Terminal rendering of analyses, citations, and answers.

use polcheck_ai::Answer;
use polcheck_cite::CitationStats;
use polcheck_core::{Citation, ComplianceAnalysis};

// ── Public API ──

/// Print a compliance analysis as a sectioned card.
pub fn print_analysis(analysis: &ComplianceAnalysis, stats: &CitationStats, overview: Option<&str>) {
    let document = analysis.analyzed_document.as_deref().unwrap_or("(document)");
    println!("=== {document} ===");
    println!("{}", analysis.analysis_date.format("%Y-%m-%d %H:%M UTC"));
    println!();

    if let Some(overview) = overview.filter(|o| !o.trim().is_empty()) {
        println!("Overview");
        print_block(overview);
        println!();
    }

    println!("Summary");
    print_block(&analysis.summary);
    println!();

    println!("Score");
    match analysis.compliance_score {
        Some(score) => println!("  {:<26} {score:.1}/100", "compliance_score"),
        None => println!("  {:<26} n/a", "compliance_score"),
    }
    println!();

    println!("Discrepancies ({})", analysis.discrepancy_count());
    for (i, d) in analysis.discrepancies.iter().enumerate() {
        println!("  {}. {}", i + 1, d.title);
        print_field("issue", &d.issue);
        print_field("location", &d.location_in_document);
        print_field("violation", &d.regulatory_violation);
        print_field("citation", &citation_label(&d.citation));
        if let Some(severity) = &d.severity {
            print_field("severity", severity);
        }
        print_field("required_action", &d.required_action);
    }
    println!();

    if !analysis.recommendations.is_empty() {
        println!("Recommendations");
        for rec in &analysis.recommendations {
            println!("  - {rec}");
        }
        println!();
    }

    print_stats(stats);
}

pub fn print_stats(stats: &CitationStats) {
    println!("Citation statistics");
    println!("  {:<26} {}", "total_citations", stats.total_citations);
    println!("  {:<26} {}", "validated", stats.validated);
    println!("  {:<26} {}", "unvalidated", stats.unvalidated);
    println!(
        "  {:<26} {:.1}%",
        "validation_rate",
        stats.validation_rate * 100.0
    );
}

/// One line per extracted citation.
pub fn print_citations(citations: &[Citation]) {
    if citations.is_empty() {
        println!("No citations found.");
        return;
    }
    println!("{:<10} {:<16} {}", "regulation", "article", "citation");
    for c in citations {
        println!("{:<10} {:<16} {}", c.regulation, c.article, c.full_citation);
    }
}

pub fn print_answer(answer: &Answer) {
    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &answer.sources {
            println!("- {source}");
        }
    }
}

// ── Helpers ──

fn print_field(label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    println!("     {:<23} {}", label, value);
}

fn print_block(text: &str) {
    for line in text.lines() {
        println!("  {line}");
    }
}

/// `✓` with provenance for validated citations, `?` otherwise.
fn citation_label(citation: &Citation) -> String {
    match (citation.is_validated(), citation.source_document()) {
        (true, Some(source)) => format!(
            "✓ {citation} [{source}, art. {}]",
            citation.source_article().unwrap_or("?")
        ),
        _ => format!("? {citation} [not validated]"),
    }
}
