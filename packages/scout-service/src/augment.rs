use std::time::Duration;

use tokio::time;

use scout_domain::query;

use crate::MetadataStore;

#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedQuery {
	/// Text handed to the embedding service.
	pub text: String,
	/// Titles of the prior selections that resolved, in request order.
	pub liked_titles: Vec<String>,
}

/// Folds the titles of previously selected movies into the query.
///
/// Resolution is best-effort: ids that are unknown or whose lookup fails are left out, and a
/// request without resolvable selections embeds the trimmed query unchanged. The whole lookup is
/// bounded by `timeout`; on expiry no titles are used.
pub async fn augment_query(
	metadata: &dyn MetadataStore,
	query: &str,
	prior_ids: &[String],
	max_prior: u32,
	timeout: Duration,
) -> AugmentedQuery {
	let ids = query::normalize_prior_ids(prior_ids, max_prior);
	let liked_titles = if ids.is_empty() {
		Vec::new()
	} else {
		match time::timeout(timeout, resolve_titles(metadata, &ids)).await {
			Ok(titles) => titles,
			Err(_) => {
				tracing::warn!(
					timeout_ms = timeout.as_millis() as u64,
					selections = ids.len(),
					"Prior selection lookup timed out. Ignoring prior selections."
				);

				Vec::new()
			},
		}
	};

	AugmentedQuery { text: query::compose_augmented(query, &liked_titles), liked_titles }
}

async fn resolve_titles(metadata: &dyn MetadataStore, ids: &[String]) -> Vec<String> {
	let mut session = match metadata.session().await {
		Ok(session) => session,
		Err(err) => {
			tracing::warn!(error = %err, "Metadata unavailable. Ignoring prior selections.");

			return Vec::new();
		},
	};
	let mut titles = Vec::with_capacity(ids.len());

	for id in ids {
		match session.fetch_one(id).await {
			Ok(Some(record)) if !record.title.trim().is_empty() =>
				titles.push(record.title.trim().to_string()),
			Ok(_) => tracing::debug!(movie_id = %id, "Prior selection not found."),
			Err(err) => {
				tracing::debug!(movie_id = %id, error = %err, "Prior selection lookup failed.")
			},
		}
	}

	titles
}
