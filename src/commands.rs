use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use notemind_core::NoteAssistant;
use notemind_core::config::{Config, EmbeddingProviderKind};
use notemind_llm::AnyEmbedder;
use notemind_llm::mock::MockEmbedder;
use notemind_llm::openai::OpenAiEmbedder;
use notemind_memory::document::{Note, TextSplitter, loader_for};
use notemind_memory::{
    InMemoryCache, InMemoryVectorStore, RetrievedFragment, assemble_context, filter_by_score,
};

pub(crate) fn build_embedder(config: &Config) -> anyhow::Result<AnyEmbedder> {
    match config.embedding.provider {
        EmbeddingProviderKind::Mock => Ok(AnyEmbedder::Mock(MockEmbedder::default())),
        EmbeddingProviderKind::OpenAi => {
            let Some(key) = config.secrets.openai_api_key.as_ref() else {
                bail!("NOTEMIND_OPENAI_API_KEY is required for the openai embedding provider");
            };
            let embedder = OpenAiEmbedder::new(
                key.expose().to_owned(),
                config.embedding.base_url.clone(),
                config.embedding.model.clone(),
            )
            .with_max_retries(config.embedding.max_retries)
            .with_timeout(Duration::from_secs(config.timeouts.embedding_secs))
            .context("failed to build embedding client")?;
            tracing::debug!(model = embedder.model(), "using openai embeddings");
            Ok(AnyEmbedder::OpenAi(embedder))
        }
    }
}

async fn load_note(path: &Path, user: &str) -> anyhow::Result<Note> {
    let loader = loader_for(path)?;
    let loaded = loader
        .load(path)
        .await
        .with_context(|| format!("failed to load {}", path.display()))?;
    Ok(loaded.into_note(uuid::Uuid::new_v4().to_string(), user))
}

pub(crate) async fn chunk(config: &Config, file: &Path, out: &mut impl Write) -> anyhow::Result<()> {
    let note = load_note(file, "local").await?;
    let splitter = TextSplitter::new(config.chunking);
    tracing::debug!(
        max_chunk_size = splitter.config().max_chunk_size,
        overlap_size = splitter.config().overlap_size,
        "splitting note"
    );
    for chunk in splitter.chunks(&note.content) {
        writeln!(out, "{}", serde_json::to_string(&chunk)?)?;
    }
    Ok(())
}

pub(crate) fn context(
    fragments: &Path,
    min_score: Option<f32>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(fragments)
        .with_context(|| format!("failed to read {}", fragments.display()))?;
    let mut parsed: Vec<RetrievedFragment> =
        serde_json::from_str(&raw).context("fragments file must be a JSON array")?;
    if let Some(min) = min_score {
        parsed = filter_by_score(&parsed, min);
    }
    writeln!(out, "{}", assemble_context(&parsed))?;
    Ok(())
}

fn assistant(config: &Config) -> anyhow::Result<NoteAssistant<AnyEmbedder>> {
    let cache = InMemoryCache::new(Duration::from_secs(config.cache.ttl_secs));
    tracing::debug!(ttl_secs = cache.ttl().as_secs(), "context cache ready");
    Ok(NoteAssistant::new(
        config,
        build_embedder(config)?,
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(cache),
    ))
}

async fn ingest_all(
    assistant: &NoteAssistant<AnyEmbedder>,
    files: &[PathBuf],
    user: &str,
    mut on_stored: impl FnMut(&notemind_memory::document::StoredChunk) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    for file in files {
        let note = load_note(file, user).await?;
        let stored = assistant
            .ingest_note(&note)
            .await
            .with_context(|| format!("failed to index {}", file.display()))?;
        tracing::info!(file = %file.display(), chunks = stored.len(), "indexed note file");
        for s in &stored {
            on_stored(s)?;
        }
    }
    Ok(())
}

pub(crate) async fn ingest(
    config: &Config,
    files: &[PathBuf],
    user: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let assistant = assistant(config)?;
    ingest_all(&assistant, files, user, |s| {
        writeln!(out, "{}", serde_json::to_string(s)?)?;
        Ok(())
    })
    .await
}

pub(crate) async fn ask(
    config: &Config,
    notes: &[PathBuf],
    user: &str,
    messages: &[String],
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let assistant = assistant(config)?;
    ingest_all(&assistant, notes, user, |_| Ok(())).await?;
    let context = assistant.context_for(user, messages).await?;
    writeln!(out, "{context}")?;
    Ok(())
}
