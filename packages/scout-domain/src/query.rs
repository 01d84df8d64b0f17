use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
	#[error("Query must be non-empty.")]
	Empty,
	#[error("Query exceeds {max_chars} characters.")]
	TooLong { max_chars: u32 },
}

/// Trims the raw query and enforces the size bounds.
pub fn validate_query(raw: &str, max_chars: u32) -> Result<&str, QueryError> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return Err(QueryError::Empty);
	}
	if trimmed.chars().count() > max_chars as usize {
		return Err(QueryError::TooLong { max_chars });
	}

	Ok(trimmed)
}

/// Trims, drops blanks, de-duplicates keeping first occurrence, and caps the list.
pub fn normalize_prior_ids(ids: &[String], max: u32) -> Vec<String> {
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for id in ids {
		let id = id.trim();

		if id.is_empty() || !seen.insert(id) {
			continue;
		}

		out.push(id.to_string());

		if out.len() >= max as usize {
			break;
		}
	}

	out
}

/// Builds the text sent to the embedding service.
///
/// With no resolved titles the trimmed query is returned unchanged.
pub fn compose_augmented(query: &str, titles: &[String]) -> String {
	if titles.is_empty() {
		return query.to_string();
	}

	format!("Movies similar to {}. Context: {query}", titles.join(", "))
}
