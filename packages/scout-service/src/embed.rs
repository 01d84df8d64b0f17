use std::time::Duration;

use tokio::time;

use scout_config::EmbeddingProviderConfig;

use crate::{EmbeddingProvider, Error, Result, UpstreamError, UpstreamResult};

/// Embeds the augmented query into a single vector.
///
/// A transient failure, timeouts included, is retried once after `retry_backoff`. Anything else
/// fails the request with `Error::EmbeddingService`.
pub async fn embed_query(
	provider: &dyn EmbeddingProvider,
	cfg: &EmbeddingProviderConfig,
	text: &str,
	retry_backoff: Duration,
) -> Result<Vec<f32>> {
	let texts = [text.to_string()];
	let mut retried = false;

	loop {
		match embed_once(provider, cfg, &texts).await {
			Ok(vector) => return Ok(vector),
			Err(err) if err.transient && !retried => {
				tracing::warn!(
					provider_id = %cfg.provider_id,
					error = %err,
					backoff_ms = retry_backoff.as_millis() as u64,
					"Embedding call failed. Retrying once."
				);

				retried = true;

				time::sleep(retry_backoff).await;
			},
			Err(err) =>
				return Err(Error::EmbeddingService {
					message: format!("{}: {}", cfg.provider_id, err.message),
				}),
		}
	}
}

/// Checks that a vector has the configured width and only finite components.
pub fn validate_vector(vector: &[f32], dimensions: u32) -> UpstreamResult<()> {
	if vector.len() != dimensions as usize {
		return Err(UpstreamError::permanent(format!(
			"Embedding has {} dimensions; expected {dimensions}.",
			vector.len()
		)));
	}
	if vector.iter().any(|value| !value.is_finite()) {
		return Err(UpstreamError::permanent("Embedding contains a non-finite value."));
	}

	Ok(())
}

async fn embed_once(
	provider: &dyn EmbeddingProvider,
	cfg: &EmbeddingProviderConfig,
	texts: &[String],
) -> UpstreamResult<Vec<f32>> {
	let vectors = time::timeout(Duration::from_millis(cfg.timeout_ms), provider.embed(cfg, texts))
		.await
		.map_err(|_| {
			UpstreamError::transient(format!("Embedding call exceeded {} ms.", cfg.timeout_ms))
		})??;
	let vector = vectors
		.into_iter()
		.next()
		.ok_or_else(|| UpstreamError::permanent("Embedding response contained no vectors."))?;

	validate_vector(&vector, cfg.dimensions)?;

	Ok(vector)
}
