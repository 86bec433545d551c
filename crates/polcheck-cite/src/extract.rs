//! Citation extraction from free text.
//!
//! Scans model output for references such as "GDPR Article 6(1)(a)",
//! "Art. 10 AI Act" or "NIS 2 ... Article 21" and returns them as
//! normalised, deduplicated [`Citation`] records.
//!
//! # Pattern families
//!
//! - Regulation first: `GDPR Article 6(1)(a)`, `DSA, Art. 16`
//! - Article first: `Article 6 GDPR`, `Art. 5 of the GDPR`
//! - Proximity: a regulation name followed within 50 characters by
//!   `Article N`. Low precision; the regulation is re-read from the
//!   closest name in the 100 characters before the article keyword.
//!
//! An article expression is the leading run of article tokens: digits with
//! attached lowercase letters and parentheses (`6(1)(a)`, `5a`), short
//! spaced parenthesised groups (`6 (1) (a)`), and comma-separated numbers
//! (`13, 14`). Parenthesis balance is not validated, except that unmatched
//! closing parentheses at the end are dropped.

use std::collections::HashSet;
use std::sync::LazyLock;

use polcheck_core::{Citation, normalize_regulation_name};
use regex::{Captures, Regex};

/// Recognised regulation names. Longer titles come first so alternation
/// prefers them.
const REGULATION: &str = r"\b(?:General\s+Data\s+Protection\s+Regulation|GDPR|Artificial\s+Intelligence\s+Act|AI\s+Act|NIS\s*2|Digital\s+Services\s+Act|DSA|Digital\s+Markets\s+Act|DMA|CNIL)\b";

const ARTICLE_KEYWORD: &str = r"\b(?:Articles?|Art\.?)";

/// Case-sensitive so that capitalised words never extend an article.
const ARTICLE_EXPR: &str = r"(?-i:[0-9]+[0-9a-z()]*(?:\s*\([0-9a-z]{1,4}\))*(?:\s*,\s*[0-9]+[0-9a-z()]*(?:\s*\([0-9a-z]{1,4}\))*)*)";

/// Maximum gap between regulation name and article keyword for the proximity pattern.
const PROXIMITY_GAP: usize = 50;

/// Left context scanned to recover the regulation of a proximity match.
const CONTEXT_WINDOW: usize = 100;

static REGULATION_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)(?P<reg>{REGULATION})[\s,]+{ARTICLE_KEYWORD}\s+(?P<art>{ARTICLE_EXPR})"
    ))
});

static ARTICLE_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i){ARTICLE_KEYWORD}\s+(?P<art>{ARTICLE_EXPR})[\s,]+(?:of\s+(?:the\s+)?)?(?P<reg>{REGULATION})"
    ))
});

/// The regulation is re-read as the closest name before the article keyword,
/// not the first name in the left context, so `GDPR ... AI Act Article 5`
/// resolves to the AI Act.
static PROXIMITY: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i){REGULATION}(?s:.){{0,{PROXIMITY_GAP}}}?(?P<kw>{ARTICLE_KEYWORD})\s+(?P<art>{ARTICLE_EXPR})"
    ))
});

static REGULATION_NAME: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"(?i){REGULATION}")));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("citation patterns are valid regexes")
}

/// A citation found in text, before normalisation and deduplication.
struct Candidate {
    /// Byte offset of the match in the scanned text.
    pos: usize,
    regulation: String,
    article: String,
    full_citation: String,
}

/// Extract all citations from `text`.
///
/// Results are ordered by first occurrence and deduplicated on
/// `(regulation.to_uppercase(), article)`. Text without a recognisable
/// regulation name yields nothing.
pub fn extract_citations(text: &str) -> Vec<Citation> {
    let mut candidates = Vec::new();

    for caps in REGULATION_FIRST.captures_iter(text) {
        let Some((whole, art, reg)) = groups(&caps) else {
            continue;
        };
        let (article, raw_len) = clean_article(art.as_str());
        let end = art.start() + raw_len;
        candidates.push(Candidate {
            pos: whole.start(),
            regulation: reg.as_str().to_string(),
            article,
            full_citation: text[whole.start()..end].trim().to_string(),
        });
    }

    for caps in ARTICLE_FIRST.captures_iter(text) {
        let Some((whole, art, reg)) = groups(&caps) else {
            continue;
        };
        let (article, _) = clean_article(art.as_str());
        candidates.push(Candidate {
            pos: whole.start(),
            regulation: reg.as_str().to_string(),
            article,
            full_citation: whole.as_str().trim().to_string(),
        });
    }

    for caps in PROXIMITY.captures_iter(text) {
        let (Some(whole), Some(kw), Some(art)) = (caps.get(0), caps.name("kw"), caps.name("art"))
        else {
            continue;
        };
        let Some(regulation) = nearest_regulation(text, kw.start()) else {
            continue;
        };
        let (article, _) = clean_article(art.as_str());
        candidates.push(Candidate {
            pos: whole.start(),
            full_citation: format!("{regulation} Article {article}"),
            regulation,
            article,
        });
    }

    // Stable: equal positions keep pattern order.
    candidates.sort_by_key(|c| c.pos);

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(|c| {
            let regulation = normalize_regulation_name(&c.regulation);
            if c.article.is_empty() {
                return None;
            }
            let key = (regulation.to_uppercase(), c.article.clone());
            if !seen.insert(key) {
                return None;
            }
            Some(Citation::new(regulation, c.article, c.full_citation))
        })
        .collect()
}

fn groups<'t>(
    caps: &Captures<'t>,
) -> Option<(regex::Match<'t>, regex::Match<'t>, regex::Match<'t>)> {
    Some((caps.get(0)?, caps.name("art")?, caps.name("reg")?))
}

/// Strip whitespace and unmatched trailing `)` from a raw article expression.
///
/// Returns the cleaned article and the byte length of the raw prefix kept.
fn clean_article(raw: &str) -> (String, usize) {
    let mut kept = raw.trim_end();
    while kept.ends_with(')') && kept.matches(')').count() > kept.matches('(').count() {
        kept = kept[..kept.len() - 1].trim_end();
    }
    let article = kept.chars().filter(|c| !c.is_whitespace()).collect();
    (article, kept.len())
}

/// Closest regulation name in the [`CONTEXT_WINDOW`] characters before byte
/// offset `end`.
fn nearest_regulation(text: &str, end: usize) -> Option<String> {
    let start = text[..end]
        .char_indices()
        .rev()
        .nth(CONTEXT_WINDOW - 1)
        .map_or(0, |(i, _)| i);
    REGULATION_NAME
        .find_iter(&text[start..end])
        .last()
        .map(|m| normalize_regulation_name(m.as_str()))
}
