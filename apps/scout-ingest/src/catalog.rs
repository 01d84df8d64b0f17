//! Reading and cleaning the catalog CSV export.

use std::{collections::HashSet, fs::File, io::Read, path::Path, sync::LazyLock};

use regex::Regex;
use serde::Deserialize;
use time::{Date, macros::format_description};

use scout_storage::models::MovieRecord;

use crate::Result;

static GENRE_NAME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"['"]name['"]\s*:\s*['"]([^'"]+)['"]"#).expect("Invalid genre regex")
});

/// The columns of `movies_metadata.csv` that the catalog uses. Everything else is ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
	#[serde(default)]
	id: Option<String>,
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	overview: Option<String>,
	#[serde(default)]
	poster_path: Option<String>,
	#[serde(default)]
	original_language: Option<String>,
	#[serde(default)]
	genres: Option<String>,
	#[serde(default)]
	release_date: Option<String>,
	#[serde(default)]
	vote_average: Option<String>,
}

#[derive(Debug, Default)]
pub struct CatalogRows {
	pub records: Vec<MovieRecord>,
	/// Rows that were malformed, incomplete, in another language, or repeated an id.
	pub skipped: usize,
}

pub fn read_catalog_file(path: &Path, language: &str) -> Result<CatalogRows> {
	let file = File::open(path).map_err(csv::Error::from)?;

	read_catalog(file, language)
}

/// Keeps rows that have an id, title, overview, and poster in `language`; the first row wins
/// for a repeated id.
pub fn read_catalog<R>(reader: R, language: &str) -> Result<CatalogRows>
where
	R: Read,
{
	let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
	let mut rows = CatalogRows::default();
	let mut seen = HashSet::new();

	for result in reader.deserialize::<CsvRow>() {
		let row = match result {
			Ok(row) => row,
			Err(err) => {
				tracing::debug!(error = %err, "Skipping malformed catalog row.");

				rows.skipped += 1;

				continue;
			},
		};

		match to_record(row, language) {
			Some(record) if seen.insert(record.movie_id.clone()) => rows.records.push(record),
			_ => rows.skipped += 1,
		}
	}

	Ok(rows)
}

/// Pulls genre names out of the stringified list stored in the `genres` column.
pub fn genre_names(raw: &str) -> Vec<String> {
	GENRE_NAME.captures_iter(raw).map(|caps| caps[1].trim().to_string()).collect()
}

/// Text embedded for a movie.
pub fn embedding_text(record: &MovieRecord) -> String {
	format!("{}: {}", record.title, record.overview)
}

fn to_record(row: CsvRow, language: &str) -> Option<MovieRecord> {
	let movie_id = non_blank(row.id)?;
	let title = non_blank(row.title)?;
	let overview = non_blank(row.overview)?;
	let poster_path = non_blank(row.poster_path)?;
	let original_language = non_blank(row.original_language)?;

	if !original_language.eq_ignore_ascii_case(language) {
		return None;
	}

	let genre = row
		.genres
		.map(|raw| genre_names(&raw))
		.filter(|names| !names.is_empty())
		.map(|names| names.join(", "));
	let release_date = row.release_date.as_deref().and_then(parse_date);
	let vote_average = row
		.vote_average
		.as_deref()
		.and_then(|raw| raw.trim().parse::<f32>().ok())
		.filter(|value| value.is_finite());

	Some(MovieRecord {
		movie_id,
		title,
		overview,
		poster_path: Some(poster_path),
		genre,
		release_date,
		vote_average,
		original_language: Some(original_language),
	})
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_date(raw: &str) -> Option<Date> {
	Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}
