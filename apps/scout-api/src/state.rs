use std::sync::Arc;

use scout_service::ScoutService;
use scout_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ScoutService>,
}
impl AppState {
	/// Connects every backend once for the lifetime of the process.
	pub async fn new(config: scout_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;
		let http = scout_providers::http_client()?;
		let service = ScoutService::new(config, db, qdrant, http);

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: ScoutService) -> Self {
		Self { service: Arc::new(service) }
	}
}
