use async_trait::async_trait;

use crate::Result;

/// Hexagonal port for the question-answering backend.
///
/// `Ok(None)` means the backend answered but carried no answer field. Every other problem
/// (unreachable, non-success status, unparseable body) is an `Err`.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, question: &str) -> Result<Option<String>>;
}
