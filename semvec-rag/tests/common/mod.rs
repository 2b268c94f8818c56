//! Deterministic embedding providers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use semvec_rag::{EmbeddingProvider, RagError, Result};

/// Hash-based embeddings: the same text always maps to the same unit vector.
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Returns fixed vectors for known texts and records every batch it receives.
pub struct TableEmbedder {
    dimensions: usize,
    table: HashMap<String, Vec<f32>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl TableEmbedder {
    pub fn new(dimensions: usize, entries: &[(&str, Vec<f32>)]) -> Self {
        let table = entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        Self { dimensions, table, batches: Mutex::new(Vec::new()) }
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| RagError::embedding("table", format!("unknown text '{text}'")))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batches.lock().unwrap().push(texts.iter().map(|t| t.to_string()).collect());
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledEmbedder;

#[async_trait]
impl EmbeddingProvider for StalledEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![1.0])
    }

    fn dimensions(&self) -> usize {
        1
    }
}

/// Always fails like an unreachable service.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::embedding("failing", "connection refused"))
    }

    fn dimensions(&self) -> usize {
        3
    }
}
