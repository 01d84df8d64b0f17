use time::Date;

/// A row of the `movies` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MovieRecord {
	pub movie_id: String,
	pub title: String,
	pub overview: String,
	pub poster_path: Option<String>,
	pub genre: Option<String>,
	pub release_date: Option<Date>,
	pub vote_average: Option<f32>,
	pub original_language: Option<String>,
}
