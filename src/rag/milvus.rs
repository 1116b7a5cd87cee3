//! Milvus vector search over the v2 REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{Document, Embedder, Retriever};
use crate::error::{ExecutionStage, WorkflowError, error_context};

/// Path of the search endpoint relative to the server URI.
const SEARCH_PATH: &str = "/v2/vectordb/entities/search";

/// Field holding the document text.
const CONTENT_FIELD: &str = "content";

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Primary key.
    pub id: Value,
    /// Similarity score reported by the server.
    pub distance: f64,
    /// Requested output fields.
    pub fields: Map<String, Value>,
}

impl SearchHit {
    fn from_row(mut row: Map<String, Value>) -> Self {
        let id = row.remove("id").unwrap_or(Value::Null);
        let distance = row
            .remove("distance")
            .and_then(|d| d.as_f64())
            .unwrap_or_default();
        Self {
            id,
            distance,
            fields: row,
        }
    }

    /// Converts the hit into a document.
    ///
    /// `content` becomes the page content; every other field, the id and the
    /// score go into metadata.
    #[must_use]
    pub fn into_document(mut self) -> Document {
        let page_content = match self.fields.remove(CONTENT_FIELD) {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let mut metadata = self.fields;
        metadata.insert("id".to_string(), self.id);
        metadata.insert("score".to_string(), json!(self.distance));
        Document {
            page_content,
            metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Vec<Map<String, Value>>,
}

/// HTTP client for one Milvus server.
#[derive(Debug, Clone)]
pub struct MilvusClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl MilvusClient {
    /// Validates `uri` and builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StoreConnection`] for an invalid URI or if
    /// the HTTP client cannot be built.
    pub fn connect(
        uri: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, WorkflowError> {
        let parsed = reqwest::Url::parse(uri).map_err(|e| {
            WorkflowError::store(
                format!("invalid vector store URI: {uri}"),
                Some(Box::new(e)),
                error_context([("uri", uri)]),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(WorkflowError::store(
                format!("unsupported vector store scheme: {}", parsed.scheme()),
                None,
                error_context([("uri", uri)]),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                WorkflowError::store(
                    "failed to build vector store client",
                    Some(Box::new(e)),
                    error_context([("uri", uri)]),
                )
            })?;

        info!(uri, "vector store client ready");
        Ok(Self {
            http,
            endpoint: format!("{}{SEARCH_PATH}", uri.trim_end_matches('/')),
            token: token.filter(|t| !t.is_empty()).map(ToString::to_string),
        })
    }

    /// Runs a similarity search in `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StoreConnection`] if the request fails, the
    /// server answers with a non-success status, or the response carries a
    /// non-zero `code`.
    pub async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        output_fields: &[String],
    ) -> Result<Vec<SearchHit>, WorkflowError> {
        let ctx = || {
            error_context([
                ("collection", collection),
                ("endpoint", self.endpoint.as_str()),
            ])
        };
        let body = json!({
            "collectionName": collection,
            "data": [vector],
            "limit": limit,
            "outputFields": output_fields,
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            WorkflowError::store("vector search request failed", Some(Box::new(e)), ctx())
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WorkflowError::store(
                format!("vector store returned {status}: {text}"),
                None,
                ctx(),
            ));
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            WorkflowError::store("malformed vector search response", Some(Box::new(e)), ctx())
        })?;

        if parsed.code != 0 {
            let mut context = ctx();
            context.insert("code".to_string(), parsed.code.to_string());
            return Err(WorkflowError::store(
                format!("vector search failed: {}", parsed.message),
                None,
                context,
            ));
        }

        debug!(collection, hits = parsed.data.len(), "vector search complete");
        Ok(parsed.data.into_iter().map(SearchHit::from_row).collect())
    }
}

/// Retriever that embeds the query and searches one Milvus collection.
///
/// The server connection is established on first use and shared by
/// later calls.
pub struct VectorRetriever {
    name: String,
    uri: String,
    token: Option<String>,
    timeout: Duration,
    collection: String,
    limit: usize,
    output_fields: Vec<String>,
    embedder: Arc<dyn Embedder>,
    client: OnceCell<MilvusClient>,
}

impl VectorRetriever {
    /// Creates a retriever; nothing is contacted until the first query.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            token: None,
            timeout: Duration::from_secs(30),
            collection: collection.into(),
            limit: 5,
            output_fields: vec!["*".to_string()],
            embedder,
            client: OnceCell::new(),
        }
    }

    /// Sets the access token.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Sets the number of hits requested per query.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Collection searched by this retriever.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn client(&self) -> Result<&MilvusClient, WorkflowError> {
        self.client
            .get_or_try_init(|| async {
                MilvusClient::connect(&self.uri, self.token.as_deref(), self.timeout)
            })
            .await
    }
}

impl std::fmt::Debug for VectorRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorRetriever")
            .field("name", &self.name)
            .field("uri", &self.uri)
            .field("collection", &self.collection)
            .field("limit", &self.limit)
            .field("embedder", &self.embedder.model())
            .field("connected", &self.client.initialized())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    fn name(&self) -> &str {
        &self.name
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, WorkflowError> {
        let client = self.client().await?;

        let vector = self.embedder.embed(query).await.map_err(|e| {
            WorkflowError::execution(
                ExecutionStage::Retrieval,
                "query embedding failed",
                e,
                error_context([("retriever", self.name.as_str()), ("query", query)]),
            )
        })?;

        let hits = client
            .search(&self.collection, &vector, self.limit, &self.output_fields)
            .await?;

        Ok(hits.into_iter().map(SearchHit::into_document).collect())
    }
}
