//! Document checks and regulation Q&A.
//!
//! # Document check
//!
//! 1. Reject near-empty documents.
//! 2. Retrieve regulatory segments using the head of the document as query.
//! 3. Ask the model for a JSON analysis, parse it (markdown fallback).
//! 4. Validate every discrepancy citation against the retrieved segments
//!    and write the results back by position.
//! 5. Ask for a short overview; on failure, reuse the analysis summary.

use std::collections::HashSet;

use polcheck_cite::{CitationStats, citation_statistics, parse_compliance_analysis, validate_citations};
use polcheck_core::{ComplianceAnalysis, PolicyCheckerError, Result, Segment};
use serde::Serialize;
use tracing::{info, warn};

use crate::completion::Completion;
use crate::config::CheckerConfig;
use crate::prompts;
use crate::retriever::Retriever;

/// A question answer and the sources behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    /// `"<source>"` or `"<source> (Article N)"`, one per distinct source.
    pub sources: Vec<String>,
}

/// Outcome of checking one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentCheck {
    pub analysis: ComplianceAnalysis,
    pub stats: CitationStats,
    pub overview: String,
}

pub struct Checker<C, R> {
    completion: C,
    retriever: R,
    config: CheckerConfig,
}

impl<C: Completion, R: Retriever> Checker<C, R> {
    pub fn new(completion: C, retriever: R, config: CheckerConfig) -> Self {
        Self {
            completion,
            retriever,
            config,
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Answer a free-form question from retrieved regulatory text.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PolicyCheckerError::Other(
                "please provide a question".into(),
            ));
        }

        let segments = self
            .retriever
            .retrieve(question, self.config.retriever_k)
            .await?;
        let context = segments
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let text = self
            .completion
            .complete(&prompts::question_prompt(&context, question))
            .await?;
        let sources = source_list(&segments, self.config.max_sources);
        info!(segments = segments.len(), sources = sources.len(), "answered question");
        Ok(Answer { text, sources })
    }

    /// Compare a document against retrieved regulations and validate the
    /// citations in the resulting analysis.
    pub async fn check_document(&self, name: &str, content: &str) -> Result<DocumentCheck> {
        if content.trim().chars().count() < self.config.min_document_length {
            return Err(PolicyCheckerError::DocumentParsing(format!(
                "{name} appears to be empty or could not be parsed; it must contain readable text"
            )));
        }

        let query = head(content, self.config.retrieval_query_length);
        let segments = self
            .retriever
            .retrieve(query, self.config.document_retriever_k)
            .await?;
        info!(document = %name, segments = segments.len(), "retrieved regulatory context");

        let prompt = prompts::comparison_prompt(
            head(content, self.config.analysis_document_length),
            &regulatory_context(&segments),
        );
        let response = self.completion.complete(&prompt).await?;

        let mut analysis = parse_compliance_analysis(&response, Some(name), true);
        let validated = validate_citations(&analysis.citations(), &segments);
        let stats = citation_statistics(&validated);
        analysis.apply_citations(validated);
        info!(
            document = %name,
            discrepancies = analysis.discrepancy_count(),
            validated = stats.validated,
            total = stats.total_citations,
            "document analysed"
        );

        let overview = match self
            .completion
            .complete(&prompts::overview_prompt(&analysis))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "overview request failed, using analysis summary");
                analysis.summary.clone()
            }
        };

        Ok(DocumentCheck {
            analysis,
            stats,
            overview,
        })
    }
}

/// `[Source: S, Article: A]` header followed by the segment text, per segment.
pub fn regulatory_context(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| {
            let article = s
                .metadata
                .article
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            format!("[Source: {}, Article: {article}]\n{}", s.source(), s.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Distinct sources in retrieval order, each with the article of its first segment.
fn source_list(segments: &[Segment], max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    segments
        .iter()
        .filter(|s| seen.insert(s.source()))
        .map(|s| match &s.metadata.article {
            Some(article) => format!("{} (Article {article})", s.source()),
            None => s.source().to_string(),
        })
        .take(max)
        .collect()
}

/// The first `max_chars` characters of `text`.
fn head(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
