pub const DENSE_VECTOR_NAME: &str = "dense";
pub const MOVIE_ID_PAYLOAD_KEY: &str = "movie_id";

use std::time::Duration;

use qdrant_client::qdrant::{
	CreateCollectionBuilder, Distance, PointId, VectorParamsBuilder, VectorsConfigBuilder,
};
use uuid::Uuid;

use crate::Result;

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &scout_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url)
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Creates the collection with a single cosine `dense` vector when it does not exist yet.
	///
	/// Returns `true` when a new collection was created.
	pub async fn ensure_collection(&self) -> Result<bool> {
		if self.client.collection_exists(self.collection.as_str()).await? {
			return Ok(false);
		}

		let mut vectors_config = VectorsConfigBuilder::default();

		vectors_config.add_named_vector_params(
			DENSE_VECTOR_NAME,
			VectorParamsBuilder::new(self.vector_dim.into(), Distance::Cosine),
		);

		let builder =
			CreateCollectionBuilder::new(self.collection.clone()).vectors_config(vectors_config);

		self.client.create_collection(builder).await?;

		Ok(true)
	}
}

/// Maps a catalog movie id onto a Qdrant point id.
///
/// Numeric ids are used directly. Anything else gets a deterministic UUIDv5, so re-ingesting a
/// row overwrites its point.
pub fn point_id_for(movie_id: &str) -> PointId {
	match movie_id.parse::<u64>() {
		Ok(num) => PointId::from(num),
		Err(_) => {
			let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, movie_id.as_bytes());

			PointId::from(uuid.to_string())
		},
	}
}
