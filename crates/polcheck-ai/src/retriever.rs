//! Regulation retrieval.
//!
//! [`CorpusRetriever`] reads the chunked regulation corpus (one JSON object
//! per line) and ranks chunks by lexical overlap with the query.
//!
//! # Corpus line format
//!
//! ```json
//! {"section": "Article", "article_number": "6", "text": "...", "document_title": "GDPR"}
//! {"section": "Recital", "number": 39, "text": "...", "document_title": "GDPR", "chunk_id": "Recital_39_0"}
//! ```

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use polcheck_core::{PolicyCheckerError, ProvisionNumber, Result, Segment, SegmentMetadata};
use serde::Deserialize;
use tracing::{debug, info};

/// Upper bound on segments returned by one retrieval.
pub const MAX_K: usize = 50;

/// Query terms shorter than this are ignored.
const MIN_TERM_LEN: usize = 3;

/// Returns the most relevant regulatory segments for a query, best first.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Segment>>;
}

/// One line of the chunk corpus.
#[derive(Debug, Deserialize)]
struct ChunkRecord {
    text: String,
    document_title: String,
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    number: Option<ProvisionNumber>,
    #[serde(default)]
    article_number: Option<ProvisionNumber>,
    #[serde(default)]
    chunk_id: Option<String>,
}

impl From<ChunkRecord> for Segment {
    fn from(c: ChunkRecord) -> Self {
        Segment {
            content: c.text,
            metadata: SegmentMetadata {
                source: c.document_title,
                article: c.article_number,
                recital: c.number,
                section: c.section,
                chunk_id: c.chunk_id,
            },
        }
    }
}

struct Indexed {
    segment: Segment,
    terms: HashSet<String>,
}

/// In-memory lexical retriever over a loaded corpus.
pub struct CorpusRetriever {
    entries: Vec<Indexed>,
}

impl CorpusRetriever {
    pub fn new(segments: Vec<Segment>) -> Self {
        let entries = segments
            .into_iter()
            .map(|segment| Indexed {
                terms: terms(&format!("{} {}", segment.source(), segment.content)),
                segment,
            })
            .collect();
        Self { entries }
    }

    /// Load a JSONL chunk corpus. Blank lines are skipped; a malformed line
    /// fails the load with its line number.
    pub fn from_jsonl(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let segments = parse_corpus(&raw)?;
        info!(path = %path.display(), segments = segments.len(), "loaded regulation corpus");
        Ok(Self::new(segments))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank by number of distinct query terms present. Ties keep corpus order.
    fn rank(&self, query: &str, k: usize) -> Vec<Segment> {
        let k = k.clamp(1, MAX_K);
        let query_terms = terms(query);

        let mut scored: Vec<(usize, &Indexed)> = self
            .entries
            .iter()
            .map(|e| (query_terms.intersection(&e.terms).count(), e))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        debug!(
            query_terms = query_terms.len(),
            best = scored.first().map(|(s, _)| *s).unwrap_or(0),
            k,
            "ranked corpus"
        );
        scored
            .into_iter()
            .take(k)
            .map(|(_, e)| e.segment.clone())
            .collect()
    }
}

#[async_trait]
impl Retriever for CorpusRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Segment>> {
        if self.entries.is_empty() {
            return Err(PolicyCheckerError::Retrieval(
                "regulation corpus is empty".into(),
            ));
        }
        Ok(self.rank(query, k))
    }
}

fn parse_corpus(raw: &str) -> Result<Vec<Segment>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<ChunkRecord>(line)
                .map(Segment::from)
                .map_err(|e| {
                    PolicyCheckerError::Retrieval(format!("corpus line {}: {e}", i + 1))
                })
        })
        .collect()
}

/// Lower-cased alphanumeric words of at least [`MIN_TERM_LEN`] characters.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TERM_LEN)
        .map(str::to_lowercase)
        .collect()
}
