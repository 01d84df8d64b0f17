use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time;

use scout_domain::poster;
use scout_storage::models::MovieRecord;

use crate::{Error, Result, ScoutService};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogRequest {
	pub page: Option<u32>,
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
	pub id: String,
	pub title: String,
	pub overview: String,
	pub poster_url: Option<String>,
	/// The catalog's vote average.
	pub score: Option<f32>,
	pub genre: Option<String>,
	pub release_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogMeta {
	pub current_page: u32,
	pub limit: u32,
	pub total_items: u64,
	pub total_pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogResponse {
	pub data: Vec<CatalogItem>,
	pub meta: CatalogMeta,
}

impl ScoutService {
	/// Pages through the local catalog, best rated first.
	///
	/// Only the metadata store is consulted.
	pub async fn list_movies(&self, req: CatalogRequest) -> Result<CatalogResponse> {
		let catalog = &self.cfg.catalog;
		let page = req.page.unwrap_or(1);
		let limit = req.limit.unwrap_or(catalog.default_page_limit);

		if page == 0 {
			return Err(Error::InvalidInput { message: "page must be 1 or greater.".to_string() });
		}
		if !(1..=catalog.max_page_limit).contains(&limit) {
			return Err(Error::InvalidInput {
				message: format!("limit must be between 1 and {}.", catalog.max_page_limit),
			});
		}

		let offset = i64::from(page - 1) * i64::from(limit);
		let metadata = self.stores.metadata.as_ref();
		let timeout = Duration::from_millis(self.cfg.storage.postgres.query_timeout_ms);
		let (total, rows) = time::timeout(timeout, async {
			let total = metadata.count().await?;
			let rows = metadata.list_page(offset, i64::from(limit)).await?;

			Ok::<_, crate::UpstreamError>((total, rows))
		})
		.await
		.map_err(|_| Error::Storage {
			message: format!("Catalog listing exceeded {} ms.", timeout.as_millis()),
		})?
		.map_err(|err| Error::Storage { message: err.message })?;
		let total_items = u64::try_from(total).unwrap_or(0);
		let data = rows
			.into_iter()
			.map(|record| catalog_item(record, &catalog.poster_base_url))
			.collect::<Vec<_>>();

		tracing::debug!(page, limit, returned = data.len(), total_items, "Catalog page served.");

		Ok(CatalogResponse {
			data,
			meta: CatalogMeta {
				current_page: page,
				limit,
				total_items,
				total_pages: total_items.div_ceil(u64::from(limit)),
			},
		})
	}
}

fn catalog_item(record: MovieRecord, poster_base_url: &str) -> CatalogItem {
	CatalogItem {
		poster_url: poster::poster_url(record.poster_path.as_deref(), poster_base_url),
		id: record.movie_id,
		title: record.title,
		overview: record.overview,
		score: record.vote_average,
		genre: record.genre,
		release_date: record.release_date.map(|date| date.to_string()),
	}
}
