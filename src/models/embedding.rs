use serde::{Deserialize, Serialize};

/// Embedding backends that can be selected for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

/// Embedding models with a known output length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingModel {
    #[default]
    #[serde(rename = "text-embedding-3-small")]
    TextEmbedding3Small,
    #[serde(rename = "text-embedding-3-large")]
    TextEmbedding3Large,
    #[serde(rename = "text-embedding-ada-002")]
    Ada002,
}

impl EmbeddingModel {
    pub fn id(&self) -> &'static str {
        match self {
            EmbeddingModel::TextEmbedding3Small => "text-embedding-3-small",
            EmbeddingModel::TextEmbedding3Large => "text-embedding-3-large",
            EmbeddingModel::Ada002 => "text-embedding-ada-002",
        }
    }

    /// Output length when no `dimensions` override is requested.
    pub fn native_dimension(&self) -> usize {
        match self {
            EmbeddingModel::TextEmbedding3Small | EmbeddingModel::Ada002 => 1536,
            EmbeddingModel::TextEmbedding3Large => 3072,
        }
    }

    /// Whether the provider can shorten vectors of this model on request.
    pub fn supports_dimension_override(&self) -> bool {
        !matches!(self, EmbeddingModel::Ada002)
    }

    pub fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }
}

impl std::str::FromStr for EmbeddingModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text-embedding-3-small" => Ok(EmbeddingModel::TextEmbedding3Small),
            "text-embedding-3-large" => Ok(EmbeddingModel::TextEmbedding3Large),
            "text-embedding-ada-002" => Ok(EmbeddingModel::Ada002),
            _ => Err(format!("unsupported embedding model: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
