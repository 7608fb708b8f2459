//! Pinecone REST backend.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use super::IndexService;
use crate::error::IndexServiceError;
use crate::models::{IndexConfig, IndexStats, IndexedVector, Metric};

const API_VERSION: &str = "2024-07";

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: Metric,
    spec: SpecRequest<'a>,
}

#[derive(Debug, Serialize)]
struct SpecRequest<'a> {
    serverless: ServerlessRequest<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessRequest<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    name: String,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [IndexedVector],
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    total_vector_count: u64,
    #[serde(default)]
    namespaces: HashMap<String, NamespaceSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceSummary {
    #[serde(default)]
    vector_count: u64,
}

/// Pinecone control-plane and data-plane client.
pub struct PineconeClient {
    client: Client,
    control_url: String,
    api_key: String,
    ready_timeout: Duration,
    poll_interval: Duration,
    hosts: RwLock<HashMap<String, String>>,
}

impl PineconeClient {
    pub fn new(
        control_url: &str,
        api_key: String,
        ready_timeout: Duration,
    ) -> Result<Self, IndexServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| IndexServiceError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            control_url: control_url.trim_end_matches('/').to_string(),
            api_key,
            ready_timeout,
            poll_interval: Duration::from_secs(1),
            hosts: RwLock::new(HashMap::new()),
        })
    }

    /// Set how often readiness is polled after creating an index.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, IndexServiceError> {
        let response = builder
            .send()
            .await
            .map_err(|e| IndexServiceError::ConnectionError(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let message = response.text().await.unwrap_or_default();
        Err(IndexServiceError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn describe_index(&self, name: &str) -> Result<IndexDescription, IndexServiceError> {
        let url = format!("{}/indexes/{}", self.control_url, name);
        match self.send(self.request(reqwest::Method::GET, &url)).await {
            Ok(response) => response
                .json()
                .await
                .map_err(|e| IndexServiceError::InvalidResponse(e.to_string())),
            Err(IndexServiceError::Api { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Err(IndexServiceError::NotFound(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Data-plane base URL of an index, cached after the first lookup.
    async fn data_url(&self, index: &str) -> Result<String, IndexServiceError> {
        if let Some(url) = self.hosts.read().await.get(index) {
            return Ok(url.clone());
        }

        let description = self.describe_index(index).await?;
        let host = description.host.filter(|h| !h.is_empty()).ok_or_else(|| {
            IndexServiceError::InvalidResponse(format!("index {} has no host", index))
        })?;
        let url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };

        self.hosts
            .write()
            .await
            .insert(index.to_string(), url.clone());
        Ok(url)
    }

    async fn wait_until_ready(&self, name: &str) -> Result<(), IndexServiceError> {
        let start = Instant::now();
        loop {
            let description = self.describe_index(name).await?;
            if description.status.is_some_and(|s| s.ready) {
                debug!(index = name, waited_ms = start.elapsed().as_millis() as u64, "index ready");
                return Ok(());
            }
            if start.elapsed() >= self.ready_timeout {
                return Err(IndexServiceError::NotReady {
                    name: name.to_string(),
                    waited_secs: self.ready_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Deletion is asynchronous on the service side; a same-name create only
    /// succeeds once the index is gone.
    async fn wait_until_deleted(&self, name: &str) -> Result<(), IndexServiceError> {
        let start = Instant::now();
        loop {
            match self.describe_index(name).await {
                Err(IndexServiceError::NotFound(_)) => return Ok(()),
                Err(e) => return Err(e),
                Ok(_) if start.elapsed() >= self.ready_timeout => {
                    return Err(IndexServiceError::StillTerminating {
                        name: name.to_string(),
                        waited_secs: self.ready_timeout.as_secs(),
                    });
                }
                Ok(_) => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}

#[async_trait]
impl IndexService for PineconeClient {
    async fn list_index_names(&self) -> Result<Vec<String>, IndexServiceError> {
        let url = format!("{}/indexes", self.control_url);
        let list: IndexList = self
            .send(self.request(reqwest::Method::GET, &url))
            .await?
            .json()
            .await
            .map_err(|e| IndexServiceError::InvalidResponse(e.to_string()))?;

        Ok(list.indexes.into_iter().map(|i| i.name).collect())
    }

    async fn create_index(&self, config: &IndexConfig) -> Result<(), IndexServiceError> {
        let url = format!("{}/indexes", self.control_url);
        let body = CreateIndexRequest {
            name: &config.name,
            dimension: config.dimension,
            metric: config.metric,
            spec: SpecRequest {
                serverless: ServerlessRequest {
                    cloud: &config.spec.cloud,
                    region: &config.spec.region,
                },
            },
        };

        self.send(self.request(reqwest::Method::POST, &url).json(&body))
            .await?;
        self.wait_until_ready(&config.name).await
    }

    async fn delete_index(&self, name: &str) -> Result<(), IndexServiceError> {
        let url = format!("{}/indexes/{}", self.control_url, name);
        self.send(self.request(reqwest::Method::DELETE, &url))
            .await?;
        self.hosts.write().await.remove(name);
        self.wait_until_deleted(name).await
    }

    async fn upsert(
        &self,
        index: &str,
        namespace: &str,
        vectors: &[IndexedVector],
    ) -> Result<u64, IndexServiceError> {
        if vectors.is_empty() {
            return Ok(0);
        }

        let url = format!("{}/vectors/upsert", self.data_url(index).await?);
        let body = UpsertRequest { vectors, namespace };
        let response: UpsertResponse = self
            .send(self.request(reqwest::Method::POST, &url).json(&body))
            .await?
            .json()
            .await
            .map_err(|e| IndexServiceError::InvalidResponse(e.to_string()))?;

        Ok(response.upserted_count)
    }

    async fn describe_stats(&self, index: &str) -> Result<IndexStats, IndexServiceError> {
        let url = format!("{}/describe_index_stats", self.data_url(index).await?);
        let stats: StatsResponse = self
            .send(self.request(reqwest::Method::POST, &url).json(&json!({})))
            .await?
            .json()
            .await
            .map_err(|e| IndexServiceError::InvalidResponse(e.to_string()))?;

        Ok(IndexStats {
            dimension: stats.dimension,
            total_vector_count: stats.total_vector_count,
            namespaces: stats
                .namespaces
                .into_iter()
                .map(|(name, summary)| (name, summary.vector_count))
                .collect::<BTreeMap<_, _>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ServerlessSpec, VectorMetadata};
    use crate::utils::Retryable;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> PineconeClient {
        PineconeClient::new(&server.url(), "pc-test".to_string(), Duration::from_secs(1))
            .unwrap()
            .with_poll_interval(Duration::from_millis(10))
    }

    fn describe_body(server: &mockito::ServerGuard, ready: bool) -> String {
        let state = if ready { "Ready" } else { "Initializing" };
        json!({
            "name": "reviews",
            "dimension": 4,
            "metric": "cosine",
            "host": server.url(),
            "status": {"ready": ready, "state": state},
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_list_index_names() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/indexes")
            .match_header("api-key", "pc-test")
            .match_header("x-pinecone-api-version", API_VERSION)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"indexes":[{"name":"axionrag","host":"a.io"},{"name":"other"}]}"#)
            .create_async()
            .await;

        let names = client_for(&server).list_index_names().await.unwrap();
        assert_eq!(names, vec!["axionrag".to_string(), "other".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_index_waits_until_ready() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/indexes")
            .match_body(Matcher::Json(json!({
                "name": "reviews",
                "dimension": 4,
                "metric": "euclidean",
                "spec": {"serverless": {"cloud": "aws", "region": "us-east-1"}},
            })))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;
        let describe = server
            .mock("GET", "/indexes/reviews")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(describe_body(&server, true))
            .create_async()
            .await;

        let config = IndexConfig {
            name: "reviews".to_string(),
            dimension: 4,
            metric: Metric::Euclidean,
            spec: ServerlessSpec::default(),
        };
        client_for(&server).create_index(&config).await.unwrap();

        create.assert_async().await;
        describe.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_index_not_ready_times_out() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/indexes")
            .with_status(201)
            .create_async()
            .await;
        server
            .mock("GET", "/indexes/reviews")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(describe_body(&server, false))
            .expect_at_least(1)
            .create_async()
            .await;

        let client = PineconeClient::new(
            &server.url(),
            "pc-test".to_string(),
            Duration::from_millis(50),
        )
        .unwrap()
        .with_poll_interval(Duration::from_millis(10));
        let config = IndexConfig {
            name: "reviews".to_string(),
            dimension: 4,
            metric: Metric::Cosine,
            spec: ServerlessSpec::default(),
        };

        let err = client.create_index(&config).await.unwrap_err();
        assert!(matches!(err, IndexServiceError::NotReady { .. }));
    }

    #[tokio::test]
    async fn test_create_index_surfaces_remote_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/indexes")
            .with_status(403)
            .with_body(r#"{"error":{"code":"FORBIDDEN","message":"quota exceeded"}}"#)
            .create_async()
            .await;

        let config = IndexConfig {
            name: "reviews".to_string(),
            dimension: 4,
            metric: Metric::Cosine,
            spec: ServerlessSpec::default(),
        };
        let err = client_for(&server).create_index(&config).await.unwrap_err();
        match err {
            IndexServiceError::Api { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_stats_use_data_plane_host() {
        let mut server = mockito::Server::new_async().await;
        let describe = server
            .mock("GET", "/indexes/reviews")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(describe_body(&server, true))
            .expect(1)
            .create_async()
            .await;
        let upsert = server
            .mock("POST", "/vectors/upsert")
            .match_body(Matcher::Json(json!({
                "vectors": [{
                    "id": "p1",
                    "values": [0.5, 0.25],
                    "metadata": {
                        "department": "CS",
                        "rating": 4,
                        "review": "great",
                        "timestamp": "2024-01-01",
                    },
                }],
                "namespace": "arag",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"upsertedCount":1}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/describe_index_stats")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"dimension":2,"indexFullness":0.0,"totalVectorCount":1,"namespaces":{"arag":{"vectorCount":1}}}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let vectors = vec![IndexedVector {
            id: "p1".to_string(),
            values: vec![0.5, 0.25],
            metadata: VectorMetadata {
                department: "CS".to_string(),
                rating: 4.into(),
                review: "great".to_string(),
                timestamp: "2024-01-01".to_string(),
            },
        }];

        let written = client.upsert("reviews", "arag", &vectors).await.unwrap();
        assert_eq!(written, 1);

        let stats = client.describe_stats("reviews").await.unwrap();
        assert_eq!(stats.dimension, 2);
        assert_eq!(stats.total_vector_count, 1);
        assert_eq!(stats.namespaces.get("arag"), Some(&1));

        // Host lookup happens once and is then cached
        describe.assert_async().await;
        upsert.assert_async().await;
    }

    #[tokio::test]
    async fn test_describe_missing_index() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/indexes/absent")
            .with_status(404)
            .create_async()
            .await;

        let err = client_for(&server).describe_stats("absent").await.unwrap_err();
        assert!(matches!(err, IndexServiceError::NotFound(name) if name == "absent"));
    }

    #[tokio::test]
    async fn test_delete_index() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/indexes/reviews")
            .with_status(202)
            .create_async()
            .await;
        server
            .mock("GET", "/indexes/reviews")
            .with_status(404)
            .create_async()
            .await;

        client_for(&server).delete_index("reviews").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_index_still_terminating_times_out() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/indexes/reviews")
            .with_status(202)
            .create_async()
            .await;
        server
            .mock("GET", "/indexes/reviews")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(describe_body(&server, true))
            .expect_at_least(1)
            .create_async()
            .await;

        let client = PineconeClient::new(
            &server.url(),
            "pc-test".to_string(),
            Duration::from_millis(50),
        )
        .unwrap()
        .with_poll_interval(Duration::from_millis(10));

        let err = client.delete_index("reviews").await.unwrap_err();
        assert!(matches!(
            err,
            IndexServiceError::StillTerminating { ref name, .. } if name == "reviews"
        ));
        assert!(!err.is_retryable());
    }
}
