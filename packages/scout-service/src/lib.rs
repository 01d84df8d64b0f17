pub mod augment;
pub mod catalog;
pub mod embed;
pub mod hydrate;
pub mod pipeline;
pub mod reason;
pub mod retrieve;

mod error;

pub use catalog::{CatalogItem, CatalogMeta, CatalogRequest, CatalogResponse};
pub use error::{Error, ErrorKind, Result, UpstreamError};
pub use hydrate::{EnrichedCandidate, Hydrated};
pub use pipeline::{
	PipelineStage, RecommendOutcome, RecommendRequest, RecommendResponse, RecommendedMovie,
};
pub use reason::{Reasoned, ReasoningStatus};

use std::{future::Future, pin::Pin, sync::Arc};

use reqwest::Client;
use serde_json::Value;
use sqlx::{PgPool, Postgres, pool::PoolConnection};

use scout_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use scout_domain::candidate::Candidate;
use scout_providers::{embedding, reasoning};
use scout_storage::{db::Db, models::MovieRecord, movies, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, UpstreamResult<Vec<Vec<f32>>>>;
}

pub trait ReasoningProvider
where
	Self: Send + Sync,
{
	/// Returns the model's raw message content.
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, UpstreamResult<String>>;
}

/// Approximate nearest-neighbour lookup over the catalog embeddings.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	/// Returns at most `k` candidates in the order the index ranked them.
	///
	/// `namespace` selects an alternative collection. An empty index yields an empty list.
	fn query<'a>(
		&'a self,
		vector: &'a [f32],
		k: u32,
		namespace: Option<&'a str>,
	) -> BoxFuture<'a, UpstreamResult<Vec<Candidate>>>;
}

/// Local movie metadata.
pub trait MetadataStore
where
	Self: Send + Sync,
{
	/// Opens one session that all lookups of a batch go through.
	fn session(&self) -> BoxFuture<'_, UpstreamResult<Box<dyn MetadataSession>>>;

	fn list_page(
		&self,
		offset: i64,
		limit: i64,
	) -> BoxFuture<'_, UpstreamResult<Vec<MovieRecord>>>;

	fn count(&self) -> BoxFuture<'_, UpstreamResult<i64>>;

	fn close(&self) -> BoxFuture<'_, ()> {
		Box::pin(async {})
	}
}

pub trait MetadataSession
where
	Self: Send,
{
	fn fetch_one<'a>(
		&'a mut self,
		movie_id: &'a str,
	) -> BoxFuture<'a, UpstreamResult<Option<MovieRecord>>>;

	/// Returns the rows that exist among `movie_ids`, in no particular order.
	fn fetch_many<'a>(
		&'a mut self,
		movie_ids: &'a [String],
	) -> BoxFuture<'a, UpstreamResult<Vec<MovieRecord>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub reasoning: Arc<dyn ReasoningProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		reasoning: Arc<dyn ReasoningProvider>,
	) -> Self {
		Self { embedding, reasoning }
	}

	/// HTTP-backed providers sharing one connection pool.
	pub fn http(client: Client) -> Self {
		let provider = Arc::new(DefaultProviders { client });

		Self { embedding: provider.clone(), reasoning: provider }
	}
}

#[derive(Clone)]
pub struct Stores {
	pub index: Arc<dyn VectorIndex>,
	pub metadata: Arc<dyn MetadataStore>,
}
impl Stores {
	pub fn new(index: Arc<dyn VectorIndex>, metadata: Arc<dyn MetadataStore>) -> Self {
		Self { index, metadata }
	}
}

pub struct ScoutService {
	pub cfg: Config,
	pub stores: Stores,
	pub providers: Providers,
}
impl ScoutService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore, client: Client) -> Self {
		let stores = Stores::new(Arc::new(qdrant), Arc::new(PgMetadataStore { pool: db.pool }));

		Self { cfg, stores, providers: Providers::http(client) }
	}

	pub fn with_backends(cfg: Config, stores: Stores, providers: Providers) -> Self {
		Self { cfg, stores, providers }
	}

	/// Releases pooled store connections. Call once, after the last request finished.
	pub async fn shutdown(&self) {
		self.stores.metadata.close().await;

		tracing::info!("Scout service stopped.");
	}
}

struct DefaultProviders {
	client: Client,
}
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, UpstreamResult<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(&self.client, cfg, texts).await?) })
	}
}
impl ReasoningProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, UpstreamResult<String>> {
		Box::pin(async move { Ok(reasoning::complete(&self.client, cfg, messages).await?) })
	}
}

/// Postgres-backed metadata store; a session is one pooled connection.
pub struct PgMetadataStore {
	pub pool: PgPool,
}
impl MetadataStore for PgMetadataStore {
	fn session(&self) -> BoxFuture<'_, UpstreamResult<Box<dyn MetadataSession>>> {
		Box::pin(async move {
			let conn = self.pool.acquire().await.map_err(scout_storage::Error::from)?;

			Ok(Box::new(PgSession { conn }) as Box<dyn MetadataSession>)
		})
	}

	fn list_page(
		&self,
		offset: i64,
		limit: i64,
	) -> BoxFuture<'_, UpstreamResult<Vec<MovieRecord>>> {
		Box::pin(async move { Ok(movies::list_page(&self.pool, offset, limit).await?) })
	}

	fn count(&self) -> BoxFuture<'_, UpstreamResult<i64>> {
		Box::pin(async move { Ok(movies::count(&self.pool).await?) })
	}

	fn close(&self) -> BoxFuture<'_, ()> {
		Box::pin(async move { self.pool.close().await })
	}
}

struct PgSession {
	conn: PoolConnection<Postgres>,
}
impl MetadataSession for PgSession {
	fn fetch_one<'a>(
		&'a mut self,
		movie_id: &'a str,
	) -> BoxFuture<'a, UpstreamResult<Option<MovieRecord>>> {
		Box::pin(async move { Ok(movies::fetch_by_id(&mut self.conn, movie_id).await?) })
	}

	fn fetch_many<'a>(
		&'a mut self,
		movie_ids: &'a [String],
	) -> BoxFuture<'a, UpstreamResult<Vec<MovieRecord>>> {
		Box::pin(async move { Ok(movies::fetch_by_ids(&mut self.conn, movie_ids).await?) })
	}
}
