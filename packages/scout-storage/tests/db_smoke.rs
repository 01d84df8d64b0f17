use time::macros::date;

use scout_config::Postgres;
use scout_storage::{db::Db, models::MovieRecord, movies};
use scout_testkit::TestDatabase;

fn movie(movie_id: &str, title: &str, vote_average: Option<f32>) -> MovieRecord {
	MovieRecord {
		movie_id: movie_id.to_string(),
		title: title.to_string(),
		overview: format!("{title} overview."),
		poster_path: Some(format!("/{movie_id}.jpg")),
		genre: Some("Drama".to_string()),
		release_date: Some(date!(1995 - 10 - 30)),
		vote_average,
		original_language: Some("en".to_string()),
	}
}

async fn connect(test_db: &TestDatabase) -> Db {
	let cfg = Postgres {
		dsn: test_db.dsn().to_string(),
		pool_max_conns: 2,
		acquire_timeout_ms: 3_000,
		query_timeout_ms: 5_000,
	};
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some(base_dsn) = scout_testkit::env_dsn() else {
		eprintln!("Skipping schema_bootstrap_is_idempotent; set SCOUT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	db.ensure_schema().await.expect("Second bootstrap failed.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name = 'movies'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 1);

	db.close().await;
	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SCOUT_PG_DSN to run."]
async fn upsert_then_fetch_and_page_by_rating() {
	let Some(base_dsn) = scout_testkit::env_dsn() else {
		eprintln!("Skipping upsert_then_fetch_and_page_by_rating; set SCOUT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let rows = vec![
		movie("862", "Toy Story", Some(7.7)),
		movie("8844", "Jumanji", Some(6.9)),
		movie("15602", "Grumpier Old Men", None),
	];
	let mut tx = db.pool.begin().await.expect("Failed to open transaction.");

	movies::upsert_movies(&mut tx, &rows).await.expect("Failed to upsert movies.");

	// Re-ingesting a row replaces it in place.
	movies::upsert_movies(&mut tx, &[movie("862", "Toy Story", Some(8.0))])
		.await
		.expect("Failed to re-upsert movie.");
	tx.commit().await.expect("Failed to commit.");

	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let found = movies::fetch_by_ids(
		&mut conn,
		&["8844".to_string(), "missing".to_string(), "862".to_string()],
	)
	.await
	.expect("Failed to fetch movies.");

	assert_eq!(found.len(), 2);

	let toy_story = movies::fetch_by_id(&mut conn, "862")
		.await
		.expect("Failed to fetch movie.")
		.expect("Expected Toy Story to exist.");

	assert_eq!(toy_story.vote_average, Some(8.0));

	drop(conn);

	assert_eq!(movies::count(&db.pool).await.expect("Failed to count."), 3);

	let page = movies::list_page(&db.pool, 0, 2).await.expect("Failed to list page.");
	let ids: Vec<&str> = page.iter().map(|row| row.movie_id.as_str()).collect();

	assert_eq!(ids, vec!["862", "8844"]);

	let tail = movies::list_page(&db.pool, 2, 2).await.expect("Failed to list page.");

	assert_eq!(tail.len(), 1);
	assert_eq!(tail[0].vote_average, None);

	db.close().await;
	test_db.cleanup().await.expect("Failed to clean up test database.");
}
