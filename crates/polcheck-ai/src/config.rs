//! Pipeline settings, passed explicitly to [`crate::Checker`].

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub model: String,
    pub temperature: f32,
    /// Segments retrieved for question answering.
    pub retriever_k: usize,
    /// Segments retrieved for a document check.
    pub document_retriever_k: usize,
    /// Characters kept from an uploaded document.
    pub max_document_length: usize,
    /// Leading characters of the document used as the retrieval query.
    pub retrieval_query_length: usize,
    /// Leading characters of the document sent to the comparison prompt.
    pub analysis_document_length: usize,
    /// Documents shorter than this (after trimming) are rejected.
    pub min_document_length: usize,
    /// Distinct sources listed under a question answer.
    pub max_sources: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            retriever_k: 4,
            document_retriever_k: 8,
            max_document_length: 50_000,
            retrieval_query_length: 2_000,
            analysis_document_length: 10_000,
            min_document_length: 50,
            max_sources: 5,
        }
    }
}
