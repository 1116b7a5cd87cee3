//! Retrieval-augmented generation sources.
//!
//! A [`Retriever`] turns a query into [`Document`]s. Domain agents run every
//! retriever they were configured with, in order, and append the documents'
//! text to the request context. [`VectorRetriever`] is the Milvus-backed
//! implementation; it embeds the query with an [`Embedder`] first.

pub mod milvus;

pub use milvus::{MilvusClient, SearchHit, VectorRetriever};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AgentError, WorkflowError};

/// One retrieved document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Text added to the request context.
    pub page_content: String,
    /// Source fields and score.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Creates a document without metadata.
    #[must_use]
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Map::new(),
        }
    }
}

/// A source of documents for a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Name used in logs and error context.
    fn name(&self) -> &str;

    /// Returns documents relevant to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StoreConnection`] when the backing store is
    /// unreachable or rejects the search.
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, WorkflowError>;
}

/// Turns query text into an embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embedding model name.
    fn model(&self) -> &str;

    /// Embeds `text`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the embedding API fails.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AgentError>;
}
