//! Application layer: regulation retrieval, LLM completion, and the
//! document-check and question-answering pipelines built on them.

pub mod completion;
pub mod config;
pub mod pipeline;
pub mod prompts;
pub mod retriever;

#[cfg(feature = "http")]
pub mod openai;

pub use completion::Completion;
pub use config::CheckerConfig;
pub use pipeline::{Answer, Checker, DocumentCheck};
pub use retriever::{CorpusRetriever, Retriever};

#[cfg(feature = "http")]
pub use openai::{CompletionError, OpenAiClient};
