pub mod embedding;
pub mod reasoning;

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

const POOL_IDLE_TIMEOUT_SECS: u64 = 90;
const POOL_MAX_IDLE_PER_HOST: usize = 32;

/// Builds the process-wide HTTP client shared by every provider call.
///
/// Per-call deadlines come from each provider's `timeout_ms`, so the client itself carries no
/// overall timeout.
pub fn http_client() -> Result<Client> {
	let client = Client::builder()
		.pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
		.pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
		.build()?;

	Ok(client)
}

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
