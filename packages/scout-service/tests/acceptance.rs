use std::{collections::HashMap, sync::Arc};

use qdrant_client::{
	Payload,
	qdrant::{PointStruct, UpsertPointsBuilder, Vector},
};
use serde_json::Value;

use scout_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, Qdrant};
use scout_service::{
	BoxFuture, CatalogRequest, EmbeddingProvider, PgMetadataStore, Providers, ReasoningProvider,
	ReasoningStatus, RecommendRequest, ScoutService, Stores, UpstreamResult,
};
use scout_storage::{
	db::Db,
	models::MovieRecord,
	movies,
	qdrant::{self, DENSE_VECTOR_NAME, MOVIE_ID_PAYLOAD_KEY, QdrantStore},
};
use scout_testkit::TestDatabase;

const CONFIG: &str = r#"
[service]
http_bind = "127.0.0.1:0"
log_level = "info"

[storage.postgres]
dsn = "postgres://replaced"
pool_max_conns = 2

[storage.qdrant]
url = "http://replaced"
collection = "replaced"
vector_dim = 3

[providers.embedding]
provider_id = "stub"
api_base = "http://unused"
api_key = "key"
path = "/embeddings"
model = "embed"
dimensions = 3
timeout_ms = 1000

[providers.llm_reasoner]
provider_id = "stub"
api_base = "http://unused"
api_key = "key"
path = "/chat"
model = "chat"
temperature = 0.0
timeout_ms = 1000

[security]
bind_localhost_only = true
"#;

/// Embeds everything onto the "time travel" axis.
struct AxisEmbedding;
impl EmbeddingProvider for AxisEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, UpstreamResult<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(vec![vec![1.0, 0.0, 0.0]; texts.len()]) })
	}
}

struct HallucinatingReasoner;
impl ReasoningProvider for HallucinatingReasoner {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, UpstreamResult<String>> {
		Box::pin(async move {
			Ok(r#"{"reasoning":"Loops done simply.","picks":[
				{"id":"105","rank":1,"explanation":"Clean rules for its time machine."},
				{"id":"999999","rank":2,"explanation":"Does not exist."}
			]}"#
				.to_string())
		})
	}
}

fn movie(id: &str, title: &str, vote_average: f32) -> MovieRecord {
	MovieRecord {
		movie_id: id.to_string(),
		title: title.to_string(),
		overview: format!("{title} overview."),
		poster_path: Some(format!("/{id}.jpg")),
		genre: Some("Science Fiction".to_string()),
		release_date: None,
		vote_average: Some(vote_average),
		original_language: Some("en".to_string()),
	}
}

fn point(id: &str, vector: Vec<f32>) -> PointStruct {
	let mut payload = Payload::new();

	payload.insert(MOVIE_ID_PAYLOAD_KEY, id.to_string());

	let vectors = HashMap::from([(DENSE_VECTOR_NAME.to_string(), Vector::from(vector))]);

	PointStruct::new(qdrant::point_id_for(id), vectors, payload)
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set SCOUT_PG_DSN and SCOUT_QDRANT_URL to run."]
async fn recommendation_runs_against_live_stores() {
	let (Some(base_dsn), Some(qdrant_url)) =
		(scout_testkit::env_dsn(), scout_testkit::env_qdrant_url())
	else {
		eprintln!(
			"Skipping recommendation_runs_against_live_stores; set SCOUT_PG_DSN and SCOUT_QDRANT_URL."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let mut cfg: Config = toml::from_str(CONFIG).expect("Failed to parse test config.");

	cfg.storage.postgres = Postgres {
		dsn: test_db.dsn().to_string(),
		pool_max_conns: 2,
		acquire_timeout_ms: 3_000,
		query_timeout_ms: 5_000,
	};
	cfg.storage.qdrant = Qdrant {
		url: qdrant_url,
		collection: test_db.collection_name("scout_movies"),
		vector_dim: 3,
		timeout_ms: 5_000,
	};

	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let mut tx = db.pool.begin().await.expect("Failed to open transaction.");

	movies::upsert_movies(
		&mut tx,
		&[movie("105", "Back to the Future", 8.0), movie("137", "Groundhog Day", 7.5)],
	)
	.await
	.expect("Failed to seed movies.");
	tx.commit().await.expect("Failed to commit seed.");

	let qdrant = QdrantStore::new(&cfg.storage.qdrant).expect("Failed to build Qdrant client.");

	qdrant.ensure_collection().await.expect("Failed to create collection.");
	qdrant
		.client
		.upsert_points(
			UpsertPointsBuilder::new(
				qdrant.collection.clone(),
				vec![
					point("105", vec![0.9, 0.1, 0.0]),
					point("137", vec![0.6, 0.8, 0.0]),
					// Indexed but never hydrated.
					point("31357", vec![0.7, 0.7, 0.1]),
				],
			)
			.wait(true),
		)
		.await
		.expect("Failed to seed vectors.");

	let metadata = PgMetadataStore { pool: db.pool.clone() };
	let service = ScoutService::with_backends(
		cfg,
		Stores::new(Arc::new(qdrant), Arc::new(metadata)),
		Providers::new(Arc::new(AxisEmbedding), Arc::new(HallucinatingReasoner)),
	);
	let outcome = service
		.recommend_traced(RecommendRequest {
			query: "time travel but not confusing".to_string(),
			selected_movie_ids: vec!["137".to_string()],
		})
		.await
		.expect("Expected a completed recommendation.");
	let ids: Vec<&str> = outcome.response.movies.iter().map(|m| m.id.as_str()).collect();

	assert_eq!(outcome.reasoning, ReasoningStatus::Complete);
	assert_eq!(ids, vec!["105"]);
	assert_eq!(outcome.missing, vec!["31357"]);

	let page = service
		.list_movies(CatalogRequest { page: Some(1), limit: Some(1) })
		.await
		.expect("Expected a catalog page.");

	assert_eq!(page.data[0].id, "105");
	assert_eq!(page.meta.total_pages, 2);

	service.shutdown().await;
	test_db.cleanup().await.expect("Failed to clean up test database.");
}
