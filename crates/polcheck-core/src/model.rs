//! Compliance analysis records: citations, discrepancies, and the analysis itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a validated citation was found in the retrieved regulatory text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_document: String,
    pub source_article: String,
}

/// A normalised reference to a regulation and article, e.g. GDPR Article 6(1)(a).
///
/// Created unvalidated by the extractor. Validation state can only be set
/// through [`Citation::with_provenance`], so `is_validated` always implies a
/// source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CitationRecord")]
pub struct Citation {
    /// Canonical short name ("GDPR", "AI Act") or the raw name if unrecognised.
    pub regulation: String,
    /// Article identifier without whitespace, e.g. `6(1)(a)`.
    pub article: String,
    /// The citation as it appeared in the text.
    pub full_citation: String,
    is_validated: bool,
    source_document: Option<String>,
    source_article: Option<String>,
}

impl Citation {
    pub fn new(
        regulation: impl Into<String>,
        article: impl Into<String>,
        full_citation: impl Into<String>,
    ) -> Self {
        Self {
            regulation: regulation.into(),
            article: article.into(),
            full_citation: full_citation.into(),
            is_validated: false,
            source_document: None,
            source_article: None,
        }
    }

    /// Stand-in for a claimed citation the extractor could not read.
    pub fn placeholder(raw: impl Into<String>) -> Self {
        Self::new("Unknown", "Unknown", raw)
    }

    /// Return a validated copy carrying `provenance`.
    ///
    /// A citation that is already validated keeps its original provenance.
    pub fn with_provenance(&self, provenance: Provenance) -> Self {
        if self.is_validated {
            return self.clone();
        }
        Self {
            is_validated: true,
            source_document: Some(provenance.source_document),
            source_article: Some(provenance.source_article),
            ..self.clone()
        }
    }

    pub fn is_validated(&self) -> bool {
        self.is_validated
    }

    pub fn source_document(&self) -> Option<&str> {
        self.source_document.as_deref()
    }

    pub fn source_article(&self) -> Option<&str> {
        self.source_article.as_deref()
    }
}

impl std::fmt::Display for Citation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_citation)
    }
}

/// Serialised form of a [`Citation`], checked on the way in.
#[derive(Deserialize)]
struct CitationRecord {
    regulation: String,
    article: String,
    full_citation: String,
    #[serde(default)]
    is_validated: bool,
    #[serde(default)]
    source_document: Option<String>,
    #[serde(default)]
    source_article: Option<String>,
}

impl TryFrom<CitationRecord> for Citation {
    type Error = String;

    fn try_from(r: CitationRecord) -> Result<Self, Self::Error> {
        if r.is_validated && r.source_document.is_none() {
            return Err(format!(
                "citation {:?} is marked validated but has no source_document",
                r.full_citation
            ));
        }
        Ok(Self {
            regulation: r.regulation,
            article: r.article,
            full_citation: r.full_citation,
            is_validated: r.is_validated,
            source_document: r.source_document,
            source_article: r.source_article,
        })
    }
}

/// One identified instance of non-compliance, tied to exactly one citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub title: String,
    pub issue: String,
    pub location_in_document: String,
    pub regulatory_violation: String,
    pub citation: Citation,
    pub required_action: String,
    /// Free text, typically High/Medium/Low.
    pub severity: Option<String>,
}

/// Structured result of one compliance analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceAnalysis {
    pub summary: String,
    #[serde(default)]
    pub discrepancies: Vec<Discrepancy>,
    /// 0–100. Absent for informational answers.
    #[serde(default)]
    pub compliance_score: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub analyzed_document: Option<String>,
    #[serde(default = "Utc::now")]
    pub analysis_date: DateTime<Utc>,
}

impl ComplianceAnalysis {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            discrepancies: Vec::new(),
            compliance_score: None,
            recommendations: Vec::new(),
            analyzed_document: None,
            analysis_date: Utc::now(),
        }
    }

    pub fn discrepancy_count(&self) -> usize {
        self.discrepancies.len()
    }

    pub fn has_discrepancies(&self) -> bool {
        !self.discrepancies.is_empty()
    }

    /// Citations of all discrepancies, in discrepancy order.
    pub fn citations(&self) -> Vec<Citation> {
        self.discrepancies.iter().map(|d| d.citation.clone()).collect()
    }

    /// Replace discrepancy citations by ordinal position.
    ///
    /// Extra citations are ignored; discrepancies without a counterpart keep
    /// their current citation.
    pub fn apply_citations(&mut self, citations: Vec<Citation>) {
        for (discrepancy, citation) in self.discrepancies.iter_mut().zip(citations) {
            discrepancy.citation = citation;
        }
    }
}
