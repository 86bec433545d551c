//! Text completion boundary.

use async_trait::async_trait;
use polcheck_core::Result;

/// A language model that turns a prompt into a single text response.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
