//! Compliance analysis parsing from raw model responses.
//!
//! Models are asked for a JSON object but do not always comply: they wrap
//! it in prose or code fences, or answer in markdown instead. The JSON path
//! tolerates surrounding text; the markdown path accepts anything and
//! extracts whatever sections it can find.

mod json;
mod markdown;

pub use json::parse_json_analysis;
pub use markdown::parse_markdown_analysis;

use polcheck_core::{Citation, ComplianceAnalysis};
use tracing::{debug, warn};

use crate::extract::extract_citations;

/// Title used when a discrepancy arrives without one.
pub const UNTITLED_DISCREPANCY: &str = "Untitled Discrepancy";

/// Parse a model response into a [`ComplianceAnalysis`].
///
/// With `prefer_json`, the JSON path is tried first and any failure falls
/// back to markdown parsing. This never fails.
pub fn parse_compliance_analysis(
    response: &str,
    analyzed_document: Option<&str>,
    prefer_json: bool,
) -> ComplianceAnalysis {
    if prefer_json {
        match parse_json_analysis(response, analyzed_document) {
            Ok(analysis) => {
                debug!(
                    discrepancies = analysis.discrepancy_count(),
                    "parsed JSON compliance analysis"
                );
                return analysis;
            }
            Err(e) => warn!(error = %e, "JSON analysis unreadable, falling back to markdown"),
        }
    }
    parse_markdown_analysis(response, analyzed_document)
}

/// First citation found in a claimed citation string, or an
/// "Unknown"/"Unknown" placeholder carrying the raw text.
fn citation_from_text(raw: &str) -> Citation {
    extract_citations(raw)
        .into_iter()
        .next()
        .unwrap_or_else(|| Citation::placeholder(raw.trim()))
}

/// Bound a score to 0–100; non-finite values are dropped.
fn clamp_score(score: f64) -> Option<f64> {
    score.is_finite().then(|| score.clamp(0.0, 100.0))
}
