//! Retrieved regulatory text, as handed over by the retrieval layer.

use serde::{Deserialize, Serialize};

/// An article or recital number as it appears in segment metadata.
///
/// Chunkers emit integers; hand-built corpora often carry strings such as
/// `"6"` or `"Art. 6"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProvisionNumber {
    Int(u64),
    Text(String),
}

impl std::fmt::Display for ProvisionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s.trim()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    /// Source identifier, usually the regulation's document title or file name.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<ProvisionNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recital: Option<ProvisionNumber>,
    /// "Article" or "Recital" when the chunker knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
}

/// One ranked unit of retrieved regulatory text. Read-only evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub content: String,
    pub metadata: SegmentMetadata,
}

impl Segment {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: SegmentMetadata {
                source: source.into(),
                article: None,
                recital: None,
                section: None,
                chunk_id: None,
            },
        }
    }

    pub fn with_article(mut self, article: ProvisionNumber) -> Self {
        self.metadata.article = Some(article);
        self
    }

    pub fn with_recital(mut self, recital: ProvisionNumber) -> Self {
        self.metadata.recital = Some(recital);
        self
    }

    pub fn source(&self) -> &str {
        &self.metadata.source
    }

    /// The article number, falling back to the recital number.
    pub fn provision(&self) -> Option<&ProvisionNumber> {
        self.metadata
            .article
            .as_ref()
            .or(self.metadata.recital.as_ref())
    }
}
