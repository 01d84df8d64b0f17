pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	/// Whether a second attempt could plausibly succeed.
	pub fn is_transient(&self) -> bool {
		let Self::Reqwest(err) = self else {
			return false;
		};

		if err.is_timeout() || err.is_connect() {
			return true;
		}

		err.status()
			.map(|status| status.is_server_error() || status.as_u16() == 429)
			.unwrap_or(false)
	}
}
