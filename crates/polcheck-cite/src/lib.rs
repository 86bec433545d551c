//! Citation pipeline: extract legal citations from model output, check them
//! against retrieved regulatory text, and parse whole compliance analyses.

pub mod extract;
pub mod parse;
pub mod validate;

pub use extract::extract_citations;
pub use parse::{parse_compliance_analysis, parse_json_analysis, parse_markdown_analysis};
pub use validate::{
    CitationStats, Strategy, citation_statistics, validate_citation, validate_citations,
};
