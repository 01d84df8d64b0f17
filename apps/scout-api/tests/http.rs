use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;

use scout_api::{routes, state::AppState};
use scout_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use scout_domain::candidate::Candidate;
use scout_service::{
	BoxFuture, EmbeddingProvider, MetadataSession, MetadataStore, Providers, ReasoningProvider,
	ScoutService, Stores, UpstreamError, UpstreamResult, VectorIndex,
};
use scout_storage::models::MovieRecord;

const CONFIG: &str = r#"
[service]
http_bind = "127.0.0.1:0"
log_level = "info"
cors_allow_any_origin = true

[storage.postgres]
dsn = "postgres://unused"
pool_max_conns = 1

[storage.qdrant]
url = "http://unused"
collection = "movies"
vector_dim = 2

[providers.embedding]
provider_id = "stub"
api_base = "http://unused"
api_key = "key"
path = "/embeddings"
model = "embed"
dimensions = 2
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

const REPLY: &str = r#"{"reasoning":"Both are gentle.","picks":[{"id":"2","rank":1,"explanation":"Warm and slow."}]}"#;

struct StubEmbedding {
	fail: bool,
	calls: Arc<AtomicUsize>,
}
impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, UpstreamResult<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let fail = self.fail;

		Box::pin(async move {
			if fail {
				return Err(UpstreamError::permanent("invalid api key"));
			}

			Ok(vec![vec![0.1, 0.2]; texts.len()])
		})
	}
}

struct StubIndex;
impl VectorIndex for StubIndex {
	fn query<'a>(
		&'a self,
		_vector: &'a [f32],
		_k: u32,
		_namespace: Option<&'a str>,
	) -> BoxFuture<'a, UpstreamResult<Vec<Candidate>>> {
		Box::pin(async move {
			Ok(vec![
				Candidate { id: "1".to_string(), score: 0.9 },
				Candidate { id: "2".to_string(), score: 0.8 },
			])
		})
	}
}

struct StubMetadata;
impl MetadataStore for StubMetadata {
	fn session(&self) -> BoxFuture<'_, UpstreamResult<Box<dyn MetadataSession>>> {
		Box::pin(async move { Ok(Box::new(StubSession) as Box<dyn MetadataSession>) })
	}

	fn list_page(
		&self,
		offset: i64,
		limit: i64,
	) -> BoxFuture<'_, UpstreamResult<Vec<MovieRecord>>> {
		let rows = catalog().into_iter().skip(offset as usize).take(limit as usize).collect();

		Box::pin(async move { Ok(rows) })
	}

	fn count(&self) -> BoxFuture<'_, UpstreamResult<i64>> {
		Box::pin(async move { Ok(catalog().len() as i64) })
	}
}

struct StubSession;
impl MetadataSession for StubSession {
	fn fetch_one<'a>(
		&'a mut self,
		movie_id: &'a str,
	) -> BoxFuture<'a, UpstreamResult<Option<MovieRecord>>> {
		let found = catalog().into_iter().find(|row| row.movie_id == movie_id);

		Box::pin(async move { Ok(found) })
	}

	fn fetch_many<'a>(
		&'a mut self,
		movie_ids: &'a [String],
	) -> BoxFuture<'a, UpstreamResult<Vec<MovieRecord>>> {
		let found = catalog().into_iter().filter(|row| movie_ids.contains(&row.movie_id)).collect();

		Box::pin(async move { Ok(found) })
	}
}

struct StubReasoner;
impl ReasoningProvider for StubReasoner {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, UpstreamResult<String>> {
		Box::pin(async move { Ok(REPLY.to_string()) })
	}
}

fn catalog() -> Vec<MovieRecord> {
	[("1", "Paddington 2", Some(7.8)), ("2", "My Neighbor Totoro", Some(8.1)), ("3", "Cats", None)]
		.into_iter()
		.map(|(id, title, vote_average)| MovieRecord {
			movie_id: id.to_string(),
			title: title.to_string(),
			overview: format!("{title} overview."),
			poster_path: Some("nan".to_string()),
			genre: None,
			release_date: None,
			vote_average,
			original_language: Some("en".to_string()),
		})
		.collect()
}

fn app(embedding_fails: bool) -> (Router, Arc<AtomicUsize>) {
	let cfg: Config = toml::from_str(CONFIG).expect("Failed to parse test config.");
	let embed_calls = Arc::new(AtomicUsize::new(0));
	let embedding = StubEmbedding { fail: embedding_fails, calls: embed_calls.clone() };
	let service = ScoutService::with_backends(
		cfg,
		Stores::new(Arc::new(StubIndex), Arc::new(StubMetadata)),
		Providers::new(Arc::new(embedding), Arc::new(StubReasoner)),
	);

	(routes::router(AppState::from_service(service)), embed_calls)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.oneshot(request).await.expect("Failed to call router.");
	let status = response.status();
	let bytes = body::to_bytes(response.into_body(), usize::MAX).await.expect("Failed to read body.");
	let json = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).expect("Body is not JSON.")
	};

	(status, json)
}

fn post_recommend(body: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri("/recommend")
		.header("content-type", "application/json")
		.body(Body::from(body.to_string()))
		.expect("Failed to build request.")
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request.")
}

#[tokio::test]
async fn root_reports_online() {
	let (app, _) = app(false);
	let (status, json) = send(app, get("/")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["status"], "online");
	assert!(json["version"].is_string());
}

#[tokio::test]
async fn health_is_ok() {
	let (app, _) = app(false);
	let (status, _) = send(app, get("/health")).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn recommend_returns_reasoned_movies() {
	let (app, _) = app(false);
	let (status, json) = send(
		app,
		post_recommend(serde_json::json!({ "query": "cozy", "selected_movie_ids": ["3"] })),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["ai_reasoning"], "Both are gentle.");

	let movies = json["movies"].as_array().expect("Expected movies array.");

	assert_eq!(movies.len(), 1);
	assert_eq!(movies[0]["id"], "2");
	assert_eq!(movies[0]["title"], "My Neighbor Totoro");
	assert_eq!(movies[0]["rank"], 1);
	assert!(movies[0]["poster_url"].is_null());
	assert!(movies[0]["score"].is_number());
}

#[tokio::test]
async fn selected_movie_ids_are_optional() {
	let (app, _) = app(false);
	let (status, _) = send(app, post_recommend(serde_json::json!({ "query": "cozy" }))).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn blank_query_is_bad_request() {
	let (app, embed_calls) = app(false);
	let (status, json) = send(app, post_recommend(serde_json::json!({ "query": "  " }))).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "invalid_input");
	assert_eq!(embed_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_recommend_body_is_structured_bad_request() {
	for body in [
		Body::from(serde_json::json!({ "selected_movie_ids": [] }).to_string()),
		Body::from("{\"query\": "),
	] {
		let (app, embed_calls) = app(false);
		let request = Request::builder()
			.method("POST")
			.uri("/recommend")
			.header("content-type", "application/json")
			.body(body)
			.expect("Failed to build request.");
		let (status, json) = send(app, request).await;

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(json["error_code"], "invalid_input");
		assert!(json["message"].as_str().is_some_and(|message| !message.is_empty()));
		assert_eq!(embed_calls.load(Ordering::SeqCst), 0);
	}
}

#[tokio::test]
async fn embedding_outage_is_bad_gateway() {
	let (app, _) = app(true);
	let (status, json) = send(app, post_recommend(serde_json::json!({ "query": "cozy" }))).await;

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(json["error_code"], "embedding_unavailable");
	assert!(json.get("movies").is_none());
}

#[tokio::test]
async fn movies_pages_local_catalog() {
	let (app, embed_calls) = app(false);
	let (status, json) = send(app, get("/movies?page=1&limit=2")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["data"].as_array().map(Vec::len), Some(2));
	assert_eq!(json["meta"]["current_page"], 1);
	assert_eq!(json["meta"]["limit"], 2);
	assert_eq!(json["meta"]["total_items"], 3);
	assert_eq!(json["meta"]["total_pages"], 2);
	assert_eq!(embed_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn movies_rejects_oversized_limit() {
	let (app, _) = app(false);
	let (status, json) = send(app, get("/movies?limit=500")).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "invalid_input");
}

#[tokio::test]
async fn movies_rejects_non_numeric_paging() {
	for uri in ["/movies?page=abc", "/movies?limit=-1"] {
		let (app, _) = app(false);
		let (status, json) = send(app, get(uri)).await;

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(json["error_code"], "invalid_input");
		assert!(json["message"].is_string());
	}
}
