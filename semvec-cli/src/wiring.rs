//! Construction of the pipeline from command-line flags and the environment.

use std::sync::Arc;

use anyhow::Context;
use semvec_rag::openai::OpenAIEmbeddingProvider;
use semvec_rag::supabase::SupabaseVectorStore;
use semvec_rag::{EmbeddingProvider, InMemoryVectorStore, RagConfig, RagPipeline, VectorStore};
use tracing::info;

use crate::cli::{Cli, StoreKind};

/// Apply the chunking and aggregation flags on top of the defaults.
pub fn rag_config(cli: &Cli) -> anyhow::Result<RagConfig> {
    let mut builder = RagConfig::builder();
    if let Some(size) = cli.chunk_size {
        builder = builder.chunk_size(size);
    }
    if let Some(overlap) = cli.overlap {
        builder = builder.overlap_fraction(overlap);
    }
    if let Some(strategy) = cli.chunking {
        builder = builder.chunking(strategy);
    }
    if let Some(aggregation) = cli.aggregation {
        builder = builder.aggregation(aggregation);
    }
    Ok(builder.build()?)
}

fn embedder(cli: &Cli, config: &RagConfig) -> anyhow::Result<OpenAIEmbeddingProvider> {
    let mut provider = OpenAIEmbeddingProvider::from_env()?;
    if let Some(model) = &cli.model {
        provider = provider.with_model(model.clone());
    }
    Ok(provider.with_timeout(config.request_timeout)?)
}

async fn vector_store(
    kind: StoreKind,
    config: &RagConfig,
    dimensions: usize,
) -> anyhow::Result<Arc<dyn VectorStore>> {
    Ok(match kind {
        StoreKind::Memory => Arc::new(InMemoryVectorStore::new()),
        StoreKind::Supabase => Arc::new(
            SupabaseVectorStore::from_env()?
                .with_dimensions(dimensions)
                .with_timeout(config.request_timeout)?,
        ),
        StoreKind::Pgvector => pgvector_store(dimensions).await?,
    })
}

#[cfg(feature = "pgvector")]
async fn pgvector_store(dimensions: usize) -> anyhow::Result<Arc<dyn VectorStore>> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")?;
    let store = semvec_rag::pgvector::PgVectorStore::new(&url).await?;
    store.ensure_schema(dimensions).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "pgvector"))]
async fn pgvector_store(_dimensions: usize) -> anyhow::Result<Arc<dyn VectorStore>> {
    anyhow::bail!("this binary was built without the `pgvector` feature")
}

/// Build the pipeline once; every command and request shares it.
pub async fn build_pipeline(cli: &Cli) -> anyhow::Result<Arc<RagPipeline>> {
    let config = rag_config(cli)?;
    let provider = embedder(cli, &config).context("failed to configure the embedding model")?;
    let dimensions = provider.dimensions();
    let store = vector_store(cli.store, &config, dimensions)
        .await
        .context("failed to configure the vector store")?;

    info!(
        model = provider.model(),
        dimensions,
        store = store.name(),
        chunk_size = config.chunk_size,
        "pipeline ready"
    );

    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(provider))
        .vector_store(store)
        .build()?;
    Ok(Arc::new(pipeline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use semvec_rag::ChunkingStrategy;

    #[test]
    fn flags_override_config_defaults() {
        let cli = Cli::try_parse_from([
            "semvec", "--chunk-size", "200", "--overlap", "0.1", "--chunking", "boundary",
            "embed", "x",
        ])
        .unwrap();
        let config = rag_config(&cli).unwrap();
        assert_eq!(config.chunk_size, 200);
        assert_eq!(config.chunking, ChunkingStrategy::Boundary);
        assert_eq!(config.chunk_overlap(), 20);
        assert_eq!(config.match_threshold, RagConfig::default().match_threshold);
    }

    #[test]
    fn invalid_flags_are_rejected() {
        let cli = Cli::try_parse_from(["semvec", "--overlap", "1.5", "embed", "x"]).unwrap();
        assert!(rag_config(&cli).is_err());
    }
}
