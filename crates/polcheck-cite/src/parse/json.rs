//! JSON path: the object the comparison prompt asks the model to return.

use std::sync::LazyLock;

use polcheck_core::{ComplianceAnalysis, Discrepancy, PolicyCheckerError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{UNTITLED_DISCREPANCY, citation_from_text, clamp_score};

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number pattern is a valid regex"));

/// Wire shape (v1) of a JSON compliance analysis.
///
/// Every field is optional and lenient: a missing or wrongly typed field
/// degrades to its default instead of rejecting the whole response.
#[derive(Debug, Default, Deserialize)]
struct ResponseV1 {
    #[serde(default, deserialize_with = "lenient_string")]
    summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_discrepancies")]
    discrepancies: Vec<DiscrepancyV1>,
    #[serde(default, deserialize_with = "lenient_score")]
    compliance_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_lines")]
    recommendations: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscrepancyV1 {
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    issue: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    location_in_document: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    regulatory_violation: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    citation: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    required_action: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    severity: Option<String>,
}

impl From<DiscrepancyV1> for Discrepancy {
    fn from(d: DiscrepancyV1) -> Self {
        Discrepancy {
            title: d.title.unwrap_or_else(|| UNTITLED_DISCREPANCY.to_string()),
            issue: d.issue.unwrap_or_default(),
            location_in_document: d.location_in_document.unwrap_or_default(),
            regulatory_violation: d.regulatory_violation.unwrap_or_default(),
            citation: citation_from_text(d.citation.as_deref().unwrap_or_default()),
            required_action: d.required_action.unwrap_or_default(),
            severity: d.severity.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Parse the first JSON object embedded in `text`.
///
/// Fails with [`PolicyCheckerError::CitationValidation`] when the text holds
/// no decodable object.
pub fn parse_json_analysis(
    text: &str,
    analyzed_document: Option<&str>,
) -> Result<ComplianceAnalysis> {
    let raw = first_object(text)?;

    let mut analysis = ComplianceAnalysis::new(raw.summary.unwrap_or_default());
    analysis.discrepancies = raw.discrepancies.into_iter().map(Discrepancy::from).collect();
    analysis.compliance_score = raw.compliance_score;
    analysis.recommendations = raw.recommendations;
    analysis.analyzed_document = analyzed_document.map(str::to_string);
    Ok(analysis)
}

/// Decode the first balanced `{...}` span that is a valid [`ResponseV1`].
fn first_object(text: &str) -> Result<ResponseV1> {
    let mut offset = 0;
    let mut last_error = None;

    while let Some(rel) = text[offset..].find('{') {
        let start = offset + rel;
        let Some(end) = balanced_end(&text[start..]) else {
            break;
        };
        match serde_json::from_str::<ResponseV1>(&text[start..start + end]) {
            Ok(raw) => return Ok(raw),
            Err(e) => last_error = Some(e),
        }
        offset = start + end;
    }

    Err(PolicyCheckerError::CitationValidation(match last_error {
        Some(e) => format!("failed to parse JSON compliance analysis: {e}"),
        None => "no complete JSON object in response".to_string(),
    }))
}

/// Byte length of the brace-balanced object at the start of `s`, honouring
/// JSON string literals. `None` if the braces never balance.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

// ── Lenient field decoders ──

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(scalar_string(&Value::deserialize(d)?))
}

fn lenient_discrepancies<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<DiscrepancyV1>, D::Error> {
    let Value::Array(items) = Value::deserialize(d)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| DiscrepancyV1::deserialize(item).ok())
        .collect())
}

/// A number, or the first number in a string such as `"75/100"`.
fn lenient_score<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    let score = match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => NUMBER.find(&s).and_then(|m| m.as_str().parse().ok()),
        _ => None,
    };
    Ok(score.and_then(clamp_score))
}

/// A list of strings, or one string split on line breaks.
fn lenient_lines<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    let lines: Vec<String> = match Value::deserialize(d)? {
        Value::Array(items) => items.iter().filter_map(scalar_string).collect(),
        Value::String(s) => s.lines().map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_prose_and_code_fences() {
        let text = "Here is the analysis:\n```json\n{\"summary\": \"fine\", \"compliance_score\": 90}\n```\nLet me know!";
        let analysis = parse_json_analysis(text, None).unwrap();
        assert_eq!(analysis.summary, "fine");
        assert_eq!(analysis.compliance_score, Some(90.0));
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_scanner() {
        let text = r#"{"summary": "uses {placeholders} and \"quotes\"", "recommendations": ["a"]}"#;
        let analysis = parse_json_analysis(text, None).unwrap();
        assert_eq!(analysis.summary, r#"uses {placeholders} and "quotes""#);
        assert_eq!(analysis.recommendations, vec!["a"]);
    }

    #[test]
    fn skips_non_json_braces_before_the_object() {
        let text = "Template {name} filled below.\n{\"summary\": \"real\"}";
        let analysis = parse_json_analysis(text, None).unwrap();
        assert_eq!(analysis.summary, "real");
    }

    #[test]
    fn no_object_is_an_error() {
        let err = parse_json_analysis("no json here", None).unwrap_err();
        assert!(matches!(err, PolicyCheckerError::CitationValidation(_)));
    }

    #[test]
    fn unbalanced_object_is_an_error() {
        assert!(parse_json_analysis(r#"{"summary": {"x": 1}"#, None).is_err());
    }

    #[test]
    fn discrepancy_defaults() {
        let text = r#"{"discrepancies": [{"issue": "no consent record"}]}"#;
        let analysis = parse_json_analysis(text, Some("doc.txt")).unwrap();
        assert_eq!(analysis.summary, "");
        let d = &analysis.discrepancies[0];
        assert_eq!(d.title, UNTITLED_DISCREPANCY);
        assert_eq!(d.issue, "no consent record");
        assert_eq!(d.citation.regulation, "Unknown");
        assert_eq!(d.citation.full_citation, "");
        assert!(d.severity.is_none());
    }

    #[test]
    fn wrongly_typed_fields_degrade() {
        let text = r#"{
            "summary": 42,
            "discrepancies": [
                {"title": ["not", "a", "string"], "citation": "DSA Article 16", "severity": "High"},
                "stray string",
                7
            ],
            "compliance_score": {"value": 80},
            "recommendations": [1, "Review logs", null, "  "]
        }"#;
        let analysis = parse_json_analysis(text, None).unwrap();
        assert_eq!(analysis.summary, "42");
        assert_eq!(analysis.discrepancy_count(), 1);
        assert_eq!(analysis.discrepancies[0].title, UNTITLED_DISCREPANCY);
        assert_eq!(analysis.discrepancies[0].citation.regulation, "DSA");
        assert_eq!(analysis.discrepancies[0].severity.as_deref(), Some("High"));
        assert!(analysis.compliance_score.is_none());
        assert_eq!(analysis.recommendations, vec!["1", "Review logs"]);
    }

    #[test]
    fn discrepancies_not_an_array() {
        let text = r#"{"summary": "s", "discrepancies": "none"}"#;
        let analysis = parse_json_analysis(text, None).unwrap();
        assert!(!analysis.has_discrepancies());
    }

    #[test]
    fn score_forms() {
        let parse = |score: &str| {
            parse_json_analysis(&format!(r#"{{"compliance_score": {score}}}"#), None)
                .unwrap()
                .compliance_score
        };
        assert_eq!(parse("75.5"), Some(75.5));
        assert_eq!(parse(r#""75/100""#), Some(75.0));
        assert_eq!(parse(r#""about 40.5 percent""#), Some(40.5));
        assert_eq!(parse(r#""n/a""#), None);
        assert_eq!(parse("null"), None);
        assert_eq!(parse("250"), Some(100.0));
    }

    #[test]
    fn balanced_end_counts_nested_objects() {
        assert_eq!(balanced_end(r#"{"a": {"b": 1}} tail"#), Some(15));
        assert_eq!(balanced_end(r#"{"a": "}"}"#), Some(10));
        assert_eq!(balanced_end("{"), None);
    }
}
