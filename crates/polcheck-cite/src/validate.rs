//! Citation validation against retrieved regulatory text.
//!
//! A citation is substantiated by the first retrieved segment (in ranked
//! order) that passes two gates and then one of four strategies:
//!
//! 1. Regulation gate: an alias of the cited regulation appears in the
//!    segment's source, its content, or its source file stem.
//! 2. Article gate: the cited article has a leading number (`6(1)(a)` → `6`).
//!
//! Strategies, tried in [`Strategy::ORDER`]:
//!
//! - [`Strategy::MetadataArticle`]: article/recital number in metadata matches.
//! - [`Strategy::FullCitation`]: the full citation text appears verbatim.
//! - [`Strategy::ArticleContext`]: `Article N` appears with a regulation alias
//!   within 300 characters.
//! - [`Strategy::BareArticle`]: `Article N` appears anywhere. Low precision.
//!
//! Validation never fails: an unsubstantiated citation is returned unchanged.

use std::collections::BTreeMap;

use polcheck_core::{Citation, Provenance, Regulation, Segment};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Characters of context on each side of an article mention.
const CONTEXT_RADIUS: usize = 300;

/// Attempted sources listed in the debug log for an unvalidated citation.
const MAX_LOGGED_ATTEMPTS: usize = 5;

/// A way of substantiating a citation against one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    MetadataArticle,
    FullCitation,
    ArticleContext,
    BareArticle,
}

/// A citation prepared for matching: gate inputs plus the article patterns,
/// compiled once and reused for every segment.
struct Matcher<'a> {
    citation: &'a Citation,
    regulation: Regulation,
    article_base: &'a str,
    /// Lower-cased regulation aliases.
    aliases: Vec<String>,
    context_patterns: Vec<Regex>,
    bare_pattern: Option<Regex>,
}

impl<'a> Matcher<'a> {
    /// `None` when the citation fails a gate that does not depend on the
    /// segment: unknown regulation or no leading article number.
    fn new(citation: &'a Citation) -> Option<Self> {
        let regulation = Regulation::recognize(&citation.regulation)?;
        let article_base = article_base(&citation.article)?;

        let article = regex::escape(&citation.article.to_lowercase());
        let base = regex::escape(article_base);
        let end = word_end(&citation.article);
        let context_patterns = [
            format!(r"\barticle\s+{article}{end}"),
            format!(r"\bart\.\s+{article}{end}"),
            format!(r"\barticle\s+{base}\b"),
            format!(r"\barticle\s+{base}\s*\("),
            format!(r"\bart\.\s+{base}\b"),
            format!(r"\bart\.\s+{base}\s*\("),
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();

        Some(Self {
            citation,
            regulation,
            article_base,
            aliases: regulation.aliases().iter().map(|a| a.to_lowercase()).collect(),
            context_patterns,
            bare_pattern: Regex::new(&format!(r"\barticle\s+{base}\b")).ok(),
        })
    }

    fn check(&self, segment: &Segment) -> Option<(Strategy, Provenance)> {
        if !regulation_in(self.regulation, segment) {
            return None;
        }
        Strategy::ORDER
            .iter()
            .find_map(|s| s.apply(self, segment).map(|p| (*s, p)))
    }
}

impl Strategy {
    /// Fixed priority order.
    pub const ORDER: [Strategy; 4] = [
        Self::MetadataArticle,
        Self::FullCitation,
        Self::ArticleContext,
        Self::BareArticle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetadataArticle => "metadata-article",
            Self::FullCitation => "full-citation",
            Self::ArticleContext => "article-context",
            Self::BareArticle => "bare-article",
        }
    }

    fn apply(&self, matcher: &Matcher<'_>, segment: &Segment) -> Option<Provenance> {
        match self {
            Self::MetadataArticle => metadata_article(matcher, segment),
            Self::FullCitation => full_citation(matcher, segment),
            Self::ArticleContext => article_context(matcher, segment),
            Self::BareArticle => bare_article(matcher, segment),
        }
    }
}

/// Regulation gate: the recognised regulation of `citation`, if one of its
/// aliases appears in the segment's source, content, or source file stem.
pub fn regulation_match(citation: &Citation, segment: &Segment) -> Option<Regulation> {
    let regulation = Regulation::recognize(&citation.regulation)?;
    regulation_in(regulation, segment).then_some(regulation)
}

fn regulation_in(regulation: Regulation, segment: &Segment) -> bool {
    let source = segment.source().to_uppercase();
    regulation.appears_in_upper(&source)
        || regulation.appears_in_upper(&segment.content.to_uppercase())
        || regulation.appears_in_upper(&source_stem(&source))
}

/// Leading digit run of an article identifier: `"6(1)(a)"` → `"6"`.
pub fn article_base(article: &str) -> Option<&str> {
    let end = article
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(article.len());
    (end > 0).then(|| &article[..end])
}

/// Try to substantiate `citation` with a single segment.
pub fn validate_against_segment(
    citation: &Citation,
    segment: &Segment,
) -> Option<(Strategy, Provenance)> {
    Matcher::new(citation)?.check(segment)
}

/// Validate one citation against ranked segments. First match wins.
///
/// Returns a new citation; an already validated citation is returned as is.
pub fn validate_citation(citation: &Citation, segments: &[Segment]) -> Citation {
    if citation.is_validated() {
        return citation.clone();
    }

    if let Some(matcher) = Matcher::new(citation) {
        for (idx, segment) in segments.iter().enumerate() {
            if let Some((strategy, provenance)) = matcher.check(segment) {
                info!(
                    citation = %citation.full_citation,
                    segment = idx + 1,
                    source = %provenance.source_document,
                    article = %provenance.source_article,
                    strategy = strategy.as_str(),
                    "citation validated"
                );
                return citation.with_provenance(provenance);
            }
        }
    }

    warn!(citation = %citation.full_citation, "could not validate citation");
    let attempted: Vec<String> = segments
        .iter()
        .take(MAX_LOGGED_ATTEMPTS)
        .enumerate()
        .map(|(i, s)| format!("segment {}: {} (art {})", i + 1, s.source(), provision_label(s)))
        .collect();
    debug!(attempted = ?attempted, "validation attempts");
    citation.clone()
}

/// Validate every citation, preserving order one-to-one.
pub fn validate_citations(citations: &[Citation], segments: &[Segment]) -> Vec<Citation> {
    info!(
        citations = citations.len(),
        segments = segments.len(),
        "validating citations"
    );

    let mut by_source: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for segment in segments {
        by_source
            .entry(segment.source())
            .or_default()
            .push(provision_label(segment));
    }
    for (source, articles) in &by_source {
        debug!(source = %source, articles = ?articles, "retrieved source");
    }

    let validated: Vec<Citation> = citations
        .iter()
        .map(|c| validate_citation(c, segments))
        .collect();

    let stats = citation_statistics(&validated);
    info!(
        validated = stats.validated,
        total = stats.total_citations,
        "validation result"
    );
    validated
}

/// Aggregate validation outcome for a set of citations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationStats {
    pub total_citations: usize,
    pub validated: usize,
    pub unvalidated: usize,
    /// validated / total, 0.0 when there are no citations.
    pub validation_rate: f64,
}

pub fn citation_statistics(citations: &[Citation]) -> CitationStats {
    let total = citations.len();
    let validated = citations.iter().filter(|c| c.is_validated()).count();
    CitationStats {
        total_citations: total,
        validated,
        unvalidated: total - validated,
        validation_rate: if total > 0 {
            validated as f64 / total as f64
        } else {
            0.0
        },
    }
}

// ── Strategies ──

fn metadata_article(matcher: &Matcher<'_>, segment: &Segment) -> Option<Provenance> {
    let raw = segment.provision()?.to_string();
    let meta_digits = digits(&raw);
    let citation_digits = digits(&matcher.citation.article);

    let matched = matcher.article_base == meta_digits
        || meta_digits.contains(matcher.article_base)
        || (!citation_digits.is_empty() && meta_digits.contains(&citation_digits));

    matched.then(|| provenance(segment, raw))
}

fn full_citation(matcher: &Matcher<'_>, segment: &Segment) -> Option<Provenance> {
    let needle = matcher.citation.full_citation.trim().to_lowercase();
    if needle.is_empty() || !segment.content.to_lowercase().contains(&needle) {
        return None;
    }
    Some(provenance(segment, matcher.citation.article.clone()))
}

fn article_context(matcher: &Matcher<'_>, segment: &Segment) -> Option<Provenance> {
    let content = segment.content.to_lowercase();
    for re in &matcher.context_patterns {
        for m in re.find_iter(&content) {
            let window = around(&content, m.start(), m.end(), CONTEXT_RADIUS);
            if matcher.aliases.iter().any(|a| window.contains(a.as_str())) {
                return Some(provenance(segment, matcher.citation.article.clone()));
            }
        }
    }
    None
}

fn bare_article(matcher: &Matcher<'_>, segment: &Segment) -> Option<Provenance> {
    matcher
        .bare_pattern
        .as_ref()?
        .is_match(&segment.content.to_lowercase())
        .then(|| provenance(segment, matcher.article_base.to_string()))
}

// ── Helpers ──

fn provenance(segment: &Segment, source_article: String) -> Provenance {
    Provenance {
        source_document: segment.source().to_string(),
        source_article,
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Word boundary only makes sense after a word character: `6(1)` ends in `)`.
fn word_end(article: &str) -> &'static str {
    match article.chars().last() {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => "",
    }
}

/// `radius` characters either side of the byte range `start..end`.
fn around(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let hi = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    &text[lo..hi]
}

/// Upper-cased file stem of a source path with `_`/`-` read as spaces:
/// `"DOCS/GENERAL_DATA_PROTECTION_REGULATION.PDF"` → `"GENERAL DATA PROTECTION REGULATION"`.
fn source_stem(source_upper: &str) -> String {
    let name = source_upper
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source_upper);
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    };
    stem.replace(['_', '-'], " ")
}

fn provision_label(segment: &Segment) -> String {
    segment
        .provision()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polcheck_core::ProvisionNumber;

    fn cite(reg: &str, art: &str) -> Citation {
        Citation::new(reg, art, format!("{reg} Article {art}"))
    }

    fn ai_act_segment() -> Segment {
        Segment::new(
            "AI_Act.pdf",
            "... Article 10(2) requires risk management of training data ...",
        )
        .with_article(ProvisionNumber::Int(10))
    }

    fn nis2_segment() -> Segment {
        Segment::new(
            "NIS2_Directive.pdf",
            "Member States shall ensure that essential entities take cybersecurity measures.",
        )
        .with_article(ProvisionNumber::Int(21))
    }

    #[test]
    fn article_base_leading_digits() {
        assert_eq!(article_base("6(1)(a)"), Some("6"));
        assert_eq!(article_base("37"), Some("37"));
        assert_eq!(article_base("Unknown"), None);
        assert_eq!(article_base(""), None);
    }

    #[test]
    fn source_stem_reads_file_names() {
        assert_eq!(
            source_stem("DOCS/GENERAL_DATA_PROTECTION_REGULATION.PDF"),
            "GENERAL DATA PROTECTION REGULATION"
        );
        assert_eq!(source_stem("AI-ACT"), "AI ACT");
    }

    #[test]
    fn ai_act_citation_validates_on_metadata() {
        let c = cite("AI Act", "10(2)");
        let (strategy, prov) = validate_against_segment(&c, &ai_act_segment()).unwrap();
        assert_eq!(strategy, Strategy::MetadataArticle);
        assert_eq!(prov.source_document, "AI_Act.pdf");
        assert_eq!(prov.source_article, "10");
    }

    #[test]
    fn ai_act_citation_does_not_validate_on_nis2() {
        let c = cite("AI Act", "10(2)");
        assert!(validate_against_segment(&c, &nis2_segment()).is_none());
        let out = validate_citation(&c, &[nis2_segment()]);
        assert!(!out.is_validated());
    }

    #[test]
    fn regulation_found_via_official_identifier_in_content() {
        let seg = Segment::new(
            "eu_law_chunk_17",
            "Regulation (EU) 2016/679 ... Article 37 Designation of the data protection officer",
        );
        assert_eq!(regulation_match(&cite("GDPR", "37"), &seg), Some(Regulation::Gdpr));
    }

    #[test]
    fn regulation_found_via_file_stem() {
        let seg = Segment::new("regs/General_Data_Protection_Regulation.pdf", "Article 5 ...");
        assert_eq!(regulation_match(&cite("GDPR", "5"), &seg), Some(Regulation::Gdpr));
    }

    #[test]
    fn unknown_regulation_never_matches() {
        let seg = Segment::new("GDPR", "Article 5 GDPR");
        assert!(regulation_match(&Citation::placeholder("see policy"), &seg).is_none());
    }

    #[test]
    fn full_citation_strategy() {
        let c = Citation::new("GDPR", "5a", "GDPR Article 5a");
        let seg = Segment::new("GDPR", "As stated in gdpr article 5a, controllers ...");
        let (strategy, prov) = validate_against_segment(&c, &seg).unwrap();
        assert_eq!(strategy, Strategy::FullCitation);
        assert_eq!(prov.source_article, "5a");
    }

    #[test]
    fn article_context_strategy_with_compound_article() {
        let c = Citation::new("GDPR", "6(1)(a)", "consent under Article 6(1)(a)");
        let seg = Segment::new(
            "chunk-3",
            "Processing shall be lawful only if ... Article 6(1)(a) of Regulation (EU) 2016/679.",
        );
        let (strategy, prov) = validate_against_segment(&c, &seg).unwrap();
        assert_eq!(strategy, Strategy::ArticleContext);
        assert_eq!(prov.source_article, "6(1)(a)");
    }

    #[test]
    fn bare_article_fallback_when_alias_is_far_away() {
        let filler = "lorem ipsum ".repeat(60);
        let content = format!("GDPR overview. {filler} Article 17 right to erasure.");
        let seg = Segment::new("chunk-9", content);
        let c = Citation::new("GDPR", "17(1)", "Art 17(1)");
        let (strategy, prov) = validate_against_segment(&c, &seg).unwrap();
        assert_eq!(strategy, Strategy::BareArticle);
        assert_eq!(prov.source_article, "17");
    }

    #[test]
    fn first_matching_segment_wins() {
        let c = cite("GDPR", "5");
        let segments = vec![
            Segment::new("NIS2", "unrelated"),
            Segment::new("GDPR.pdf", "Article 5 Principles").with_article(ProvisionNumber::Int(5)),
            Segment::new("GDPR_consolidated.pdf", "Article 5").with_article(ProvisionNumber::Int(5)),
        ];
        let out = validate_citation(&c, &segments);
        assert!(out.is_validated());
        assert_eq!(out.source_document(), Some("GDPR.pdf"));
        assert_eq!(out.source_article(), Some("5"));
    }

    #[test]
    fn validated_citation_is_never_reverted() {
        let c = cite("AI Act", "10(2)");
        let validated = validate_citation(&c, &[ai_act_segment()]);
        assert!(validated.is_validated());
        let again = validate_citation(&validated, &[nis2_segment()]);
        assert!(again.is_validated());
        assert_eq!(again.source_document(), Some("AI_Act.pdf"));
        let none = validate_citation(&validated, &[]);
        assert!(none.is_validated());
    }

    #[test]
    fn unknown_regulation_stays_unvalidated_across_many_segments() {
        let segments: Vec<Segment> = (1..=50)
            .map(|i| {
                Segment::new(format!("GDPR_part_{i}.pdf"), format!("Article {i} GDPR text"))
                    .with_article(ProvisionNumber::Int(i))
            })
            .collect();
        let c = Citation::placeholder("internal policy section 4");
        let out = validate_citation(&c, &segments);
        assert!(!out.is_validated());
        assert!(out.source_document().is_none());
    }

    #[test]
    fn validate_citations_preserves_order_and_length() {
        let citations = vec![
            cite("NIS2", "21"),
            cite("AI Act", "10(2)"),
            Citation::placeholder("?"),
        ];
        let out = validate_citations(&citations, &[ai_act_segment()]);
        assert_eq!(out.len(), 3);
        assert!(!out[0].is_validated());
        assert!(out[1].is_validated());
        assert!(!out[2].is_validated());
        assert_eq!(out[0].full_citation, "NIS2 Article 21");
    }

    #[test]
    fn statistics_rate() {
        let c = cite("AI Act", "10(2)");
        let citations = vec![validate_citation(&c, &[ai_act_segment()]), cite("GDPR", "5")];
        let stats = citation_statistics(&citations);
        assert_eq!(stats.total_citations, 2);
        assert_eq!(stats.validated, 1);
        assert_eq!(stats.unvalidated, 1);
        assert_eq!(stats.validation_rate, 0.5);
    }

    #[test]
    fn statistics_empty_is_zero() {
        let stats = citation_statistics(&[]);
        assert_eq!(stats.total_citations, 0);
        assert_eq!(stats.validation_rate, 0.0);
    }

    #[test]
    fn statistics_serialize_with_expected_keys() {
        let value = serde_json::to_value(citation_statistics(&[cite("GDPR", "5")])).unwrap();
        assert_eq!(value["total_citations"], 1);
        assert_eq!(value["validated"], 0);
        assert_eq!(value["unvalidated"], 1);
        assert_eq!(value["validation_rate"], 0.0);
    }

    /// `GDPR` followed by filler so the alias starts `distance` characters
    /// before `Article 9(2)`.
    fn alias_before_article(distance: usize) -> Segment {
        let filler = "é".repeat(distance - "GDPR  ".len());
        Segment::new("chunk", format!("GDPR {filler} Article 9(2) applies"))
    }

    #[test]
    fn context_radius_counts_characters() {
        let c = Citation::new("GDPR", "9(2)", "GDPR Article 9(2)");

        let (strategy, prov) = validate_against_segment(&c, &alias_before_article(299)).unwrap();
        assert_eq!(strategy, Strategy::ArticleContext);
        assert_eq!(prov.source_article, "9(2)");

        let (strategy, prov) = validate_against_segment(&c, &alias_before_article(301)).unwrap();
        assert_eq!(strategy, Strategy::BareArticle);
        assert_eq!(prov.source_article, "9");
    }

    #[test]
    fn multibyte_filler_keeps_alias_in_context() {
        let c = Citation::new("GDPR", "9(2)", "GDPR Article 9(2)");
        let seg = Segment::new("chunk", format!("GDPR {} Article 9(2) applies", "é".repeat(200)));
        let (strategy, prov) = validate_against_segment(&c, &seg).unwrap();
        assert_eq!(strategy, Strategy::ArticleContext);
        assert_eq!(prov.source_article, "9(2)");

        let seg = Segment::new("chunk", format!("GDPR {} art. 9 applies", "é".repeat(200)));
        let out = validate_citation(&c, &[seg]);
        assert!(out.is_validated());
        assert_eq!(out.source_article(), Some("9(2)"));
    }

    #[test]
    fn matcher_is_built_once_per_citation() {
        let c = Citation::new("GDPR", "9(2)", "GDPR Article 9(2)");
        let matcher = Matcher::new(&c).unwrap();
        assert_eq!(matcher.context_patterns.len(), 6);
        assert!(matcher.bare_pattern.is_some());
        assert!(matcher.check(&alias_before_article(40)).is_some());
        assert!(matcher.check(&nis2_segment()).is_none());

        assert!(Matcher::new(&Citation::placeholder("see policy")).is_none());
        assert!(Matcher::new(&Citation::new("GDPR", "(a)", "GDPR (a)")).is_none());
    }

    #[test]
    fn around_is_character_based() {
        let text = "ééé[x]ééé";
        let start = text.find('[').unwrap();
        let end = text.find(']').unwrap() + 1;
        assert_eq!(around(text, start, end, 2), "éé[x]éé");
        assert_eq!(around(text, start, end, 10), text);
        assert_eq!(around(text, start, end, 0), "[x]");
    }
}
