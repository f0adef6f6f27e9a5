use futures::future::try_join_all;
use notemind_llm::{EmbeddingProvider, LlmError};

/// Number of embedding calls issued concurrently by default.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 5;

/// Embed `texts` in fixed-size batches.
///
/// Batches run one after another; calls inside a batch run concurrently.
/// The output has one vector per input, in input order. A `batch_size` of
/// zero is treated as one.
///
/// # Errors
///
/// Returns the first provider error; remaining batches are not started.
pub async fn embed_in_batches<P: EmbeddingProvider>(
    provider: &P,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, LlmError> {
    let batch_size = batch_size.max(1);
    let total_batches = texts.len().div_ceil(batch_size);
    let mut vectors = Vec::with_capacity(texts.len());

    for (batch_num, batch) in texts.chunks(batch_size).enumerate() {
        let started = std::time::Instant::now();
        let embedded = try_join_all(batch.iter().map(|t| provider.embed(t))).await?;
        tracing::debug!(
            provider = provider.name(),
            batch = batch_num + 1,
            total_batches,
            size = batch.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "embedded batch"
        );
        vectors.extend(embedded);
    }

    Ok(vectors)
}
