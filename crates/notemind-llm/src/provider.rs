use crate::error::LlmError;

/// A backend that turns text into a fixed-length embedding vector.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or the response is invalid.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    fn name(&self) -> &'static str;
}

impl<P: EmbeddingProvider> EmbeddingProvider for std::sync::Arc<P> {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send {
        (**self).embed(text)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
