//! In-memory doubles for the remote collaborators.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use super::embedding::EmbeddingProvider;
use super::vector_store::IndexService;
use crate::error::{EmbeddingError, IndexServiceError};
use crate::models::{IndexConfig, IndexStats, IndexedVector};

/// Embedding provider returning canned vectors and recording every call.
pub struct MockProvider {
    dimension: usize,
    vector: Vec<f32>,
    scripted: Mutex<VecDeque<Result<Vec<f32>, EmbeddingError>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl MockProvider {
    /// Always returns `vector`, reporting its length as the dimension.
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            dimension: vector.len(),
            vector,
            scripted: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Claims `dimension` but returns `vector`.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Queue a response used before falling back to the default vector.
    pub fn push_response(&self, response: Result<Vec<f32>, EmbeddingError>) {
        self.scripted.lock().unwrap().push_back(response);
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(t, _)| t.clone())
            .collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), Instant::now()));
        match self.scripted.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(self.vector.clone()),
        }
    }

    fn model(&self) -> &str {
        "mock-embedding"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Debug, Clone)]
pub struct StoredIndex {
    pub config: IndexConfig,
    pub namespaces: HashMap<String, BTreeMap<String, IndexedVector>>,
}

/// Index service keeping everything in process memory.
#[derive(Default)]
pub struct InMemoryIndex {
    indexes: Mutex<HashMap<String, StoredIndex>>,
    log: Mutex<Vec<String>>,
    fail_create: Mutex<Option<IndexServiceError>>,
    upsert_failures: Mutex<VecDeque<IndexServiceError>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an index as if left behind by a previous run.
    pub fn with_index(self, config: IndexConfig) -> Self {
        self.indexes.lock().unwrap().insert(
            config.name.clone(),
            StoredIndex {
                config,
                namespaces: HashMap::new(),
            },
        );
        self
    }

    pub fn fail_next_create(&self, error: IndexServiceError) {
        *self.fail_create.lock().unwrap() = Some(error);
    }

    pub fn fail_next_upsert(&self, error: IndexServiceError) {
        self.upsert_failures.lock().unwrap().push_back(error);
    }

    pub fn index(&self, name: &str) -> Option<StoredIndex> {
        self.indexes.lock().unwrap().get(name).cloned()
    }

    /// Operation log, e.g. `["list", "delete:reviews", "create:reviews"]`.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn upsert_calls(&self) -> usize {
        self.log()
            .iter()
            .filter(|op| op.starts_with("upsert:"))
            .count()
    }

    fn record(&self, op: String) {
        self.log.lock().unwrap().push(op);
    }
}

#[async_trait]
impl IndexService for InMemoryIndex {
    async fn list_index_names(&self) -> Result<Vec<String>, IndexServiceError> {
        self.record("list".to_string());
        let mut names: Vec<String> = self.indexes.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_index(&self, config: &IndexConfig) -> Result<(), IndexServiceError> {
        self.record(format!("create:{}", config.name));
        if let Some(error) = self.fail_create.lock().unwrap().take() {
            return Err(error);
        }
        let mut indexes = self.indexes.lock().unwrap();
        if indexes.contains_key(&config.name) {
            return Err(IndexServiceError::Api {
                status: 409,
                message: format!("index {} already exists", config.name),
            });
        }
        indexes.insert(
            config.name.clone(),
            StoredIndex {
                config: config.clone(),
                namespaces: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), IndexServiceError> {
        self.record(format!("delete:{}", name));
        self.indexes
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| IndexServiceError::NotFound(name.to_string()))
    }

    async fn upsert(
        &self,
        index: &str,
        namespace: &str,
        vectors: &[IndexedVector],
    ) -> Result<u64, IndexServiceError> {
        self.record(format!("upsert:{}:{}", index, vectors.len()));
        if let Some(error) = self.upsert_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        let mut indexes = self.indexes.lock().unwrap();
        let stored = indexes
            .get_mut(index)
            .ok_or_else(|| IndexServiceError::NotFound(index.to_string()))?;

        for vector in vectors {
            if vector.values.len() != stored.config.dimension {
                return Err(IndexServiceError::Api {
                    status: 400,
                    message: format!(
                        "vector dimension {} does not match the dimension of the index {}",
                        vector.values.len(),
                        stored.config.dimension
                    ),
                });
            }
        }

        let target = stored.namespaces.entry(namespace.to_string()).or_default();
        for vector in vectors {
            target.insert(vector.id.clone(), vector.clone());
        }
        Ok(vectors.len() as u64)
    }

    async fn describe_stats(&self, index: &str) -> Result<IndexStats, IndexServiceError> {
        self.record(format!("stats:{}", index));
        let indexes = self.indexes.lock().unwrap();
        let stored = indexes
            .get(index)
            .ok_or_else(|| IndexServiceError::NotFound(index.to_string()))?;

        let namespaces: BTreeMap<String, u64> = stored
            .namespaces
            .iter()
            .map(|(name, vectors)| (name.clone(), vectors.len() as u64))
            .collect();
        Ok(IndexStats {
            dimension: stored.config.dimension,
            total_vector_count: namespaces.values().sum(),
            namespaces,
        })
    }
}
