mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Catalog, Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, Providers, Qdrant,
	Recommend, Security, Service, Storage,
};

use std::{env, fs, path::Path};

pub const EMBEDDING_API_KEY_ENV: &str = "SCOUT_EMBEDDING_API_KEY";
pub const REASONER_API_KEY_ENV: &str = "SCOUT_REASONER_API_KEY";
pub const MAX_TOP_N: u32 = 5;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg, |name| env::var(name).ok());

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if !cfg.providers.llm_reasoner.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.llm_reasoner.temperature must be a finite number.".to_string(),
		});
	}
	if cfg.providers.llm_reasoner.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.llm_reasoner.temperature must be zero or greater.".to_string(),
		});
	}

	for (label, value) in [
		("providers.embedding.timeout_ms", cfg.providers.embedding.timeout_ms),
		("providers.llm_reasoner.timeout_ms", cfg.providers.llm_reasoner.timeout_ms),
		("storage.qdrant.timeout_ms", cfg.storage.qdrant.timeout_ms),
		("storage.postgres.acquire_timeout_ms", cfg.storage.postgres.acquire_timeout_ms),
		("storage.postgres.query_timeout_ms", cfg.storage.postgres.query_timeout_ms),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}
	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm_reasoner", &cfg.providers.llm_reasoner.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	let recommend = &cfg.recommend;

	if recommend.candidate_k == 0 {
		return Err(Error::Validation {
			message: "recommend.candidate_k must be greater than zero.".to_string(),
		});
	}
	if !(1..=MAX_TOP_N).contains(&recommend.top_n) {
		return Err(Error::Validation {
			message: format!("recommend.top_n must be in the range 1-{MAX_TOP_N}."),
		});
	}
	if recommend.top_n > recommend.candidate_k {
		return Err(Error::Validation {
			message: "recommend.top_n must not exceed recommend.candidate_k.".to_string(),
		});
	}
	if recommend.max_query_chars == 0 {
		return Err(Error::Validation {
			message: "recommend.max_query_chars must be greater than zero.".to_string(),
		});
	}

	let catalog = &cfg.catalog;

	if catalog.max_page_limit == 0 {
		return Err(Error::Validation {
			message: "catalog.max_page_limit must be greater than zero.".to_string(),
		});
	}
	if !(1..=catalog.max_page_limit).contains(&catalog.default_page_limit) {
		return Err(Error::Validation {
			message: "catalog.default_page_limit must be between 1 and catalog.max_page_limit."
				.to_string(),
		});
	}
	if catalog.poster_base_url.trim().is_empty() {
		return Err(Error::Validation {
			message: "catalog.poster_base_url must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize<F>(cfg: &mut Config, lookup_env: F)
where
	F: Fn(&str) -> Option<String>,
{
	if cfg.recommend.namespace.as_deref().map(|ns| ns.trim().is_empty()).unwrap_or(false) {
		cfg.recommend.namespace = None;
	}
	if cfg.providers.embedding.api_key.trim().is_empty()
		&& let Some(key) = lookup_env(EMBEDDING_API_KEY_ENV)
	{
		cfg.providers.embedding.api_key = key;
	}
	if cfg.providers.llm_reasoner.api_key.trim().is_empty()
		&& let Some(key) = lookup_env(REASONER_API_KEY_ENV)
	{
		cfg.providers.llm_reasoner.api_key = key;
	}

	let base = cfg.catalog.poster_base_url.trim().trim_end_matches('/');

	cfg.catalog.poster_base_url = base.to_string();
}
