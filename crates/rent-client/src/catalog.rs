//! # Catalog Reader
//!
//! Read-only access to items and categories, cached for a short time.
//! Availability seen in any read is remembered so the reservation flow can
//! fail fast without another request.

use crate::cache::TtlCache;
use crate::http::{ApiClient, Auth};
use reqwest::Method;
use rent_core::{Category, Item, ItemDetail, ItemPage, ItemQuery, RentResult};
use tracing::{debug, instrument};

const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Cached reader over the catalog service
pub struct CatalogReader {
    api: ApiClient,
    pages: TtlCache<String, ItemPage>,
    details: TtlCache<u64, ItemDetail>,
    categories: TtlCache<(), Vec<Category>>,
    availability: TtlCache<u64, bool>,
}

impl CatalogReader {
    pub fn new(api: ApiClient) -> Self {
        let item_ttl = api.config().item_ttl();
        let category_ttl = api.config().category_ttl();

        Self {
            api,
            pages: TtlCache::new(item_ttl),
            details: TtlCache::new(item_ttl),
            categories: TtlCache::new(category_ttl),
            availability: TtlCache::new(item_ttl),
        }
    }

    /// List items matching `query` (`GET /items/`)
    #[instrument(skip(self, query), fields(query = %query.cache_key()))]
    pub async fn list_items(&self, query: &ItemQuery) -> RentResult<ItemPage> {
        let key = query.cache_key();
        if let Some(page) = self.pages.get(&key) {
            debug!("Item list served from cache");
            return Ok(page);
        }

        let builder = self
            .api
            .request(Method::GET, "/items/", Auth::IfPresent)?
            .query(&query.to_query_pairs());
        let (items, headers) = self.api.fetch_with_headers::<Vec<Item>>(builder).await?;

        let total = headers
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());

        for item in &items {
            self.remember(item);
        }

        debug!("Fetched {} items (total={:?})", items.len(), total);
        let page = ItemPage { items, total };
        self.pages.insert(key, page.clone());
        Ok(page)
    }

    /// Full record for one item (`GET /items/{id}`)
    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: u64) -> RentResult<ItemDetail> {
        if let Some(detail) = self.details.get(&item_id) {
            debug!("Item detail served from cache");
            return Ok(detail);
        }

        let path = format!("/items/{}", item_id);
        let detail: ItemDetail = self.api.get_json(&path, &[], Auth::IfPresent).await?;

        self.remember(&detail.item);
        self.details.insert(item_id, detail.clone());
        Ok(detail)
    }

    /// All categories (`GET /categories/`)
    #[instrument(skip(self))]
    pub async fn categories(&self) -> RentResult<Vec<Category>> {
        if let Some(categories) = self.categories.get(&()) {
            return Ok(categories);
        }

        let categories: Vec<Category> =
            self.api.get_json("/categories/", &[], Auth::IfPresent).await?;
        self.categories.insert((), categories.clone());
        Ok(categories)
    }

    /// Last known availability of an item, without any request.
    ///
    /// `None` when the item has not been seen recently.
    pub fn cached_availability(&self, item_id: u64) -> Option<bool> {
        self.availability.get(&item_id)
    }

    /// Record an item the UI already holds (e.g. from a detail view)
    pub fn remember(&self, item: &Item) {
        self.availability.insert(item.id, item.available);
    }

    /// Drop every cached item read; categories are kept
    pub fn invalidate_items(&self) {
        self.pages.invalidate_all();
        self.details.invalidate_all();
        self.availability.invalidate_all();
    }
}

impl std::fmt::Debug for CatalogReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogReader")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}
