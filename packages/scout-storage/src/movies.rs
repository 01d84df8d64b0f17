use sqlx::{PgConnection, PgExecutor, Postgres, QueryBuilder, Transaction};

use crate::{Result, models::MovieRecord};

const MOVIE_COLUMNS: &str = "\
movie_id,
	title,
	overview,
	poster_path,
	genre,
	release_date,
	vote_average,
	original_language";

pub async fn fetch_by_id(conn: &mut PgConnection, movie_id: &str) -> Result<Option<MovieRecord>> {
	let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE movie_id = $1");
	let row = sqlx::query_as::<_, MovieRecord>(&sql).bind(movie_id).fetch_optional(conn).await?;

	Ok(row)
}

/// Loads every known row among `movie_ids`. Order of the result is unspecified.
pub async fn fetch_by_ids(
	conn: &mut PgConnection,
	movie_ids: &[String],
) -> Result<Vec<MovieRecord>> {
	if movie_ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE movie_id = ANY($1)");
	let rows = sqlx::query_as::<_, MovieRecord>(&sql).bind(movie_ids).fetch_all(conn).await?;

	Ok(rows)
}

/// Catalog page ordered by rating, best first. Unrated rows sort last.
pub async fn list_page<'e, E>(executor: E, offset: i64, limit: i64) -> Result<Vec<MovieRecord>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT {MOVIE_COLUMNS}
FROM movies
ORDER BY vote_average DESC NULLS LAST, movie_id ASC
LIMIT $1 OFFSET $2"
	);
	let rows = sqlx::query_as::<_, MovieRecord>(&sql)
		.bind(limit)
		.bind(offset)
		.fetch_all(executor)
		.await?;

	Ok(rows)
}

pub async fn count<'e, E>(executor: E) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let total: i64 = sqlx::query_scalar("SELECT count(*) FROM movies").fetch_one(executor).await?;

	Ok(total)
}

pub async fn upsert_movies(
	tx: &mut Transaction<'_, Postgres>,
	movies: &[MovieRecord],
) -> Result<u64> {
	if movies.is_empty() {
		return Ok(0);
	}

	let mut builder =
		QueryBuilder::<Postgres>::new(format!("INSERT INTO movies ({MOVIE_COLUMNS}) "));

	builder.push_values(movies, |mut row, movie| {
		row.push_bind(&movie.movie_id)
			.push_bind(&movie.title)
			.push_bind(&movie.overview)
			.push_bind(&movie.poster_path)
			.push_bind(&movie.genre)
			.push_bind(movie.release_date)
			.push_bind(movie.vote_average)
			.push_bind(&movie.original_language);
	});
	builder.push(
		"
ON CONFLICT (movie_id) DO UPDATE
SET
	title = EXCLUDED.title,
	overview = EXCLUDED.overview,
	poster_path = EXCLUDED.poster_path,
	genre = EXCLUDED.genre,
	release_date = EXCLUDED.release_date,
	vote_average = EXCLUDED.vote_average,
	original_language = EXCLUDED.original_language,
	updated_at = now()",
	);

	let result = builder.build().execute(&mut **tx).await?;

	Ok(result.rows_affected())
}
