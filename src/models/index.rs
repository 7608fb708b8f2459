//! Vector index models: index definition, uploaded vectors and index statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::review::ReviewRecord;

/// Similarity metric of a vector index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            _ => Err(format!("unknown metric: {}", s)),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Cosine => write!(f, "cosine"),
            Metric::Euclidean => write!(f, "euclidean"),
        }
    }
}

/// Where a serverless index is provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerlessSpec {
    pub cloud: String,
    pub region: String,
}

impl Default for ServerlessSpec {
    fn default() -> Self {
        Self {
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

/// Definition of the target index for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    pub spec: ServerlessSpec,
}

/// Metadata stored next to each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub department: String,
    pub rating: serde_json::Number,
    pub review: String,
    pub timestamp: String,
}

/// A vector ready to be upserted, keyed by professor id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedVector {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: VectorMetadata,
}

impl IndexedVector {
    pub fn from_record(record: ReviewRecord, values: Vec<f32>) -> Self {
        Self {
            id: record.professor_id,
            values,
            metadata: VectorMetadata {
                department: record.department,
                rating: record.rating,
                review: record.review_text,
                timestamp: record.timestamp,
            },
        }
    }
}

/// Statistics reported by the index service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub dimension: usize,
    pub total_vector_count: u64,
    pub namespaces: BTreeMap<String, u64>,
}

/// Outcome of a successful ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReport {
    pub index: String,
    pub namespace: String,
    pub records_read: u64,
    pub vectors_upserted: u64,
    pub duration_ms: u64,
    pub finished_at: String,
    pub stats: IndexStats,
}
