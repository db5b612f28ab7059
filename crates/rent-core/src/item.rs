//! # Catalog Types
//!
//! Items and categories as served by the catalog service.
//! Read-only from the client's point of view.

use crate::money::{Currency, Price};
use serde::{Deserialize, Serialize};

/// A catalog category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
}

/// An item as listed by `GET /items/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Hourly rental price in the marketplace currency
    pub price_per_h: f64,

    /// Availability flag; advisory only, the rental service re-checks it
    pub available: bool,

    /// Legacy single image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default)]
    pub image_urls: Vec<String>,

    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Item {
    /// First image to show for this item, falling back to the legacy field
    pub fn primary_image(&self) -> Option<&str> {
        self.image_urls
            .first()
            .map(String::as_str)
            .or(self.image_url.as_deref())
    }

    pub fn hourly_price(&self, currency: Currency) -> Price {
        Price::new(self.price_per_h, currency)
    }

    pub fn in_category(&self, category_id: u64) -> bool {
        self.categories.iter().any(|c| c.id == category_id)
    }
}

/// How an item reaches the renter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingType {
    Free,
    #[default]
    LocalPickup,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    #[default]
    Used,
}

/// Full item record from `GET /items/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    #[serde(default)]
    pub stock: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,

    #[serde(default)]
    pub shipping_type: ShippingType,

    #[serde(default)]
    pub condition: Condition,

    #[serde(default)]
    pub hashtags: Vec<String>,

    #[serde(default)]
    pub owner_username: String,
}

/// Sort key accepted by the catalog service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderBy {
    Price,
    Name,
    Id,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Price => "price",
            OrderBy::Name => "name",
            OrderBy::Id => "id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl OrderDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDir::Asc => "asc",
            OrderDir::Desc => "desc",
        }
    }
}

/// Filter and sort parameters for `GET /items/`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemQuery {
    /// Case-insensitive name substring
    pub name: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub available: Option<bool>,
    pub categories: Vec<u64>,
    pub order: Option<(OrderBy, OrderDir)>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

/// Largest page the catalog service accepts
pub const MAX_PAGE_SIZE: u32 = 1000;

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: filter by name substring
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
        self
    }

    /// Builder: restrict the hourly price range
    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn only_available(mut self) -> Self {
        self.available = Some(true);
        self
    }

    pub fn with_category(mut self, category_id: u64) -> Self {
        if !self.categories.contains(&category_id) {
            self.categories.push(category_id);
        }
        self
    }

    pub fn sorted_by(mut self, by: OrderBy, dir: OrderDir) -> Self {
        self.order = Some((by, dir));
        self
    }

    /// Builder: pagination window; `limit` is clamped to 1..=1000
    pub fn page(mut self, skip: u32, limit: u32) -> Self {
        self.skip = Some(skip);
        self.limit = Some(limit.clamp(1, MAX_PAGE_SIZE));
        self
    }

    /// Query-string pairs in the shape the catalog service expects.
    /// Categories repeat the `categories` key once per id.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if let Some(ref name) = self.name {
            pairs.push(("name".to_string(), name.clone()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("min_price".to_string(), min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price".to_string(), max.to_string()));
        }
        if let Some(available) = self.available {
            pairs.push(("available".to_string(), available.to_string()));
        }
        for id in &self.categories {
            pairs.push(("categories".to_string(), id.to_string()));
        }
        if let Some((by, dir)) = self.order {
            pairs.push(("order_by".to_string(), by.as_str().to_string()));
            pairs.push(("order_dir".to_string(), dir.as_str().to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip".to_string(), skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }

    /// Stable key for caching list results
    pub fn cache_key(&self) -> String {
        let mut pairs = self.to_query_pairs();
        pairs.sort();
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// One page of catalog results
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemPage {
    pub items: Vec<Item>,
    /// Total matches across all pages (`X-Total-Count`), when reported
    pub total: Option<u64>,
}
