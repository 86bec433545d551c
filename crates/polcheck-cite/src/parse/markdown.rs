//! Markdown path: section-by-section extraction, always succeeds.
//!
//! Recognised layout:
//!
//! ```text
//! ### Summary
//! ### Identified Discrepancies
//! #### Discrepancy 1: <title>
//! **Issue:** ... **Location in Document:** ... **Regulatory Violation:** ...
//! **Citation:** ... **Required Action:** ... **Severity:** ...
//! ### Compliance Score
//! 75/100
//! ### Recommendations
//! - ...
//! ```

use std::sync::LazyLock;

use polcheck_core::{ComplianceAnalysis, Discrepancy};
use regex::Regex;

use super::{UNTITLED_DISCREPANCY, citation_from_text, clamp_score};

/// Summary used when the response has no summary section.
pub const DEFAULT_SUMMARY: &str = "Compliance analysis completed.";

static SUMMARY_HEADING: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)###\s*Summary\s*\n"));

static DISCREPANCIES_HEADING: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)###\s*Identified\s+Discrepancies\s*\n"));

static DISCREPANCIES_END: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)###\s*(?:Compliance\s+Score|Recommendations)"));

static DISCREPANCY_HEADER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)####\s*Discrepancy\s+\d+:\s*"));

static SCORE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)###\s*Compliance\s+Score\s*\n[^\n]*?(\d+(?:\.\d+)?)\s*/?\s*100")
});

static RECOMMENDATIONS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)###\s*Recommendations\s*\n"));

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| compile(r"^(?:[-*•]+|\d+[.)])\s*"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("markdown section patterns are valid regexes")
}

/// Bold field labels inside a discrepancy block. The colon may sit inside
/// or outside the bold markers.
fn label(name: &str) -> Regex {
    compile(&format!(r"(?i)\*\*\s*{name}\s*:?\s*\*\*\s*:?"))
}

static ISSUE: LazyLock<Regex> = LazyLock::new(|| label("Issue"));
static LOCATION: LazyLock<Regex> = LazyLock::new(|| label(r"Location\s+in\s+Document"));
static VIOLATION: LazyLock<Regex> = LazyLock::new(|| label(r"Regulatory\s+Violation"));
static CITATION: LazyLock<Regex> = LazyLock::new(|| label("Citation"));
static ACTION: LazyLock<Regex> = LazyLock::new(|| label(r"Required\s+Action"));
static SEVERITY: LazyLock<Regex> = LazyLock::new(|| label("Severity"));

/// Parse a markdown-formatted analysis. Missing sections become defaults.
pub fn parse_markdown_analysis(text: &str, analyzed_document: Option<&str>) -> ComplianceAnalysis {
    let summary = summary(text).unwrap_or_default();
    let mut analysis = ComplianceAnalysis::new(if summary.is_empty() {
        DEFAULT_SUMMARY.to_string()
    } else {
        summary
    });
    analysis.discrepancies = discrepancies(text);
    analysis.compliance_score = score(text);
    analysis.recommendations = recommendations(text);
    analysis.analyzed_document = analyzed_document.map(str::to_string);
    analysis
}

/// Text after `### Summary`, up to the next `###` or `\n##`.
fn summary(text: &str) -> Option<String> {
    let heading = SUMMARY_HEADING.find(text)?;
    let rest = &text[heading.end()..];
    let end = [rest.find("###"), rest.find("\n##")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

fn discrepancies(text: &str) -> Vec<Discrepancy> {
    let Some(heading) = DISCREPANCIES_HEADING.find(text) else {
        return Vec::new();
    };
    let rest = &text[heading.end()..];
    let section = match DISCREPANCIES_END.find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    };

    let headers: Vec<_> = DISCREPANCY_HEADER.find_iter(section).collect();
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let end = headers
                .get(i + 1)
                .map(|next| next.start())
                .unwrap_or(section.len());
            discrepancy(&section[header.end()..end])
        })
        .collect()
}

fn discrepancy(block: &str) -> Discrepancy {
    let title = block.lines().next().map(str::trim).unwrap_or_default();
    let citation_text = field(block, &CITATION).unwrap_or_default();
    Discrepancy {
        title: if title.is_empty() {
            UNTITLED_DISCREPANCY.to_string()
        } else {
            title.to_string()
        },
        issue: field(block, &ISSUE).unwrap_or_default(),
        location_in_document: field(block, &LOCATION).unwrap_or_default(),
        regulatory_violation: field(block, &VIOLATION).unwrap_or_default(),
        citation: citation_from_text(&citation_text),
        required_action: field(block, &ACTION).unwrap_or_default(),
        severity: field(block, &SEVERITY).filter(|s| !s.is_empty()),
    }
}

/// Value following a bold label, up to the next `**` or the end of the block.
fn field(block: &str, label: &Regex) -> Option<String> {
    let m = label.find(block)?;
    let rest = &block[m.end()..];
    let end = rest.find("**").unwrap_or(rest.len());
    let value = rest[..end]
        .trim()
        .trim_end_matches(['-', '*', '•'])
        .trim_end();
    Some(value.to_string())
}

fn score(text: &str) -> Option<f64> {
    let caps = SCORE.captures(text)?;
    caps.get(1)?.as_str().parse().ok().and_then(clamp_score)
}

/// Bullet lines after `### Recommendations`, markers stripped.
fn recommendations(text: &str) -> Vec<String> {
    let Some(heading) = RECOMMENDATIONS_HEADING.find(text) else {
        return Vec::new();
    };
    text[heading.end()..]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            LIST_MARKER
                .replace(line, "")
                .trim_end_matches(['-', '•', ' '])
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}
