const INIT_SQL: &str = include_str!("../../../sql/init.sql");

/// Splits the bootstrap script into executable statements.
pub fn statements() -> impl Iterator<Item = &'static str> {
	INIT_SQL.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bootstrap_creates_movies_table_and_index() {
		let statements: Vec<&str> = statements().collect();

		assert_eq!(statements.len(), 2);
		assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS movies"));
		assert!(statements[1].contains("idx_movies_vote_average"));
	}
}
