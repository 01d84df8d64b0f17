pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal outcome of a service call.
///
/// Reasoning failures are recovered inside the pipeline; `ReasoningService` only surfaces from
/// callers that ask for the raw reasoning step.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid input: {message}")]
	InvalidInput { message: String },
	#[error("Embedding service error: {message}")]
	EmbeddingService { message: String },
	#[error("Retrieval service error: {message}")]
	RetrievalService { message: String },
	#[error("Metadata store error: {message}")]
	HydrationService { message: String },
	#[error("Reasoning service error: {message}")]
	ReasoningService { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::InvalidInput { .. } => ErrorKind::InvalidInput,
			Self::EmbeddingService { .. } => ErrorKind::Embedding,
			Self::RetrievalService { .. } => ErrorKind::Retrieval,
			Self::HydrationService { .. } => ErrorKind::Hydration,
			Self::ReasoningService { .. } => ErrorKind::Reasoning,
			Self::Storage { .. } => ErrorKind::Storage,
		}
	}
}
impl From<scout_domain::query::QueryError> for Error {
	fn from(err: scout_domain::query::QueryError) -> Self {
		Self::InvalidInput { message: err.to_string() }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	InvalidInput,
	Embedding,
	Retrieval,
	Hydration,
	Reasoning,
	Storage,
}

/// Failure reported by an external collaborator before it is attributed to a pipeline stage.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct UpstreamError {
	pub message: String,
	/// Whether a second attempt could plausibly succeed.
	pub transient: bool,
}
impl UpstreamError {
	pub fn transient(message: impl Into<String>) -> Self {
		Self { message: message.into(), transient: true }
	}

	pub fn permanent(message: impl Into<String>) -> Self {
		Self { message: message.into(), transient: false }
	}
}
impl From<scout_providers::Error> for UpstreamError {
	fn from(err: scout_providers::Error) -> Self {
		Self { transient: err.is_transient(), message: err.to_string() }
	}
}
impl From<scout_storage::Error> for UpstreamError {
	fn from(err: scout_storage::Error) -> Self {
		let transient = matches!(
			&err,
			scout_storage::Error::Sqlx(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_))
		);

		Self { message: err.to_string(), transient }
	}
}
