use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub recommend: Recommend,
	#[serde(default)]
	pub catalog: Catalog,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	#[serde(default)]
	pub cors_allow_any_origin: bool,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	#[serde(default = "default_acquire_timeout_ms")]
	pub acquire_timeout_ms: u64,
	/// Upper bound for one metadata lookup or listing, connection acquisition included.
	#[serde(default = "default_query_timeout_ms")]
	pub query_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	#[serde(default = "default_qdrant_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm_reasoner: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Knobs for the `/recommend` pipeline.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Recommend {
	/// Candidate breadth requested from the vector index.
	pub candidate_k: u32,
	/// Final list length after reasoning; at most 5.
	pub top_n: u32,
	pub max_prior_selections: u32,
	pub max_query_chars: u32,
	/// Sleep before the single embedding retry.
	pub embedding_retry_backoff_ms: u64,
	/// Overrides `storage.qdrant.collection` for retrieval when set.
	pub namespace: Option<String>,
}
impl Default for Recommend {
	fn default() -> Self {
		Self {
			candidate_k: 40,
			top_n: 5,
			max_prior_selections: 20,
			max_query_chars: 1_000,
			embedding_retry_backoff_ms: 250,
			namespace: None,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Catalog {
	pub default_page_limit: u32,
	pub max_page_limit: u32,
	pub poster_base_url: String,
}
impl Default for Catalog {
	fn default() -> Self {
		Self {
			default_page_limit: 24,
			max_page_limit: 100,
			poster_base_url: "https://image.tmdb.org/t/p/w500".to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}

fn default_acquire_timeout_ms() -> u64 {
	3_000
}

fn default_query_timeout_ms() -> u64 {
	5_000
}

fn default_qdrant_timeout_ms() -> u64 {
	5_000
}
