use axum::{
	Json, Router,
	extract::{
		Query, State,
		rejection::{JsonRejection, QueryRejection},
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use scout_service::{
	CatalogRequest, CatalogResponse, Error, RecommendRequest, RecommendResponse,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	let allow_any_origin = state.service.cfg.service.cors_allow_any_origin;
	let router = Router::new()
		.route("/", get(root))
		.route("/health", get(health))
		.route("/movies", get(movies))
		.route("/recommend", post(recommend))
		.with_state(state);

	if allow_any_origin {
		router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
	} else {
		router
	}
}

async fn root() -> Json<Value> {
	Json(serde_json::json!({ "status": "online", "version": scout_cli::VERSION }))
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn movies(
	State(state): State<AppState>,
	params: Result<Query<CatalogRequest>, QueryRejection>,
) -> Result<Json<CatalogResponse>, ApiError> {
	let Query(params) = params.map_err(|err| bad_request(err.body_text()))?;
	let response = state.service.list_movies(params).await?;

	Ok(Json(response))
}

async fn recommend(
	State(state): State<AppState>,
	payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
	let Json(payload) = payload.map_err(|err| bad_request(err.body_text()))?;
	let service = state.service.clone();
	// The pipeline runs detached so a dropped connection cannot abandon a stage midway.
	let task = tokio::spawn(async move { service.recommend(payload).await });
	let response = task.await.map_err(|err| {
		tracing::error!(error = %err, "Recommendation task did not complete.");

		json_error(
			StatusCode::INTERNAL_SERVER_ERROR,
			"internal_error",
			"Recommendation did not complete.",
		)
	})??;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let message = err.to_string();

		match err {
			Error::InvalidInput { .. } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_input", message),
			Error::EmbeddingService { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "embedding_unavailable", message),
			Error::RetrievalService { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "retrieval_unavailable", message),
			Error::HydrationService { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "metadata_unavailable", message),
			Error::ReasoningService { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "reasoning_unavailable", message),
			Error::Storage { .. } => {
				tracing::error!(error = %message, "Catalog storage failure.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

fn bad_request(message: String) -> ApiError {
	json_error(StatusCode::BAD_REQUEST, "invalid_input", message)
}

fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError { status, error_code: code.to_string(), message: message.into() }
}
