//! # Rental Types
//!
//! Rentals, rental windows and reservation attempts.

use crate::error::{RentError, RentResult};
use crate::money::{Currency, Price};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the window used when the caller gives none
pub const DEFAULT_WINDOW_HOURS: i64 = 1;

/// Lifecycle of a rental
///
/// `Pending` until the payment is confirmed; `Returned` is set by a
/// process outside this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    #[default]
    Pending,
    Confirmed,
    Returned,
}

impl std::fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RentalStatus::Pending => "pending",
            RentalStatus::Confirmed => "confirmed",
            RentalStatus::Returned => "returned",
        };
        f.write_str(s)
    }
}

/// Minimal item view embedded in rental records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: u64,
    pub name: String,
    pub price_per_h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

/// A rental record as returned by the rental service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    pub id: u64,

    /// Hold amount computed by the rental service. Never recomputed here.
    pub deposit: f64,

    #[serde(default)]
    pub status: RentalStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renter_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemSnapshot>,
}

impl Rental {
    pub fn deposit_price(&self, currency: Currency) -> Price {
        Price::new(self.deposit, currency)
    }

    pub fn is_pending(&self) -> bool {
        self.status == RentalStatus::Pending
    }

    /// Display name of the rented item, when the service embedded one
    pub fn item_name(&self) -> Option<&str> {
        self.item.as_ref().map(|i| i.name.as_str())
    }
}

/// A validated rental window, `start_at < end_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalWindow {
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
}

impl RentalWindow {
    /// Create a window; rejects empty or inverted ranges
    pub fn new(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> RentResult<Self> {
        if end_at <= start_at {
            return Err(RentError::InvalidRequest(
                "end_at must be after start_at".to_string(),
            ));
        }
        Ok(Self { start_at, end_at })
    }

    /// The default one-hour window beginning at `start`
    pub fn default_from(start: DateTime<Utc>) -> Self {
        Self {
            start_at: start,
            end_at: start + Duration::hours(DEFAULT_WINDOW_HOURS),
        }
    }

    pub fn starting_now() -> Self {
        Self::default_from(Utc::now())
    }

    pub fn start_at(&self) -> DateTime<Utc> {
        self.start_at
    }

    pub fn end_at(&self) -> DateTime<Utc> {
        self.end_at
    }

    pub fn duration(&self) -> Duration {
        self.end_at - self.start_at
    }

    pub fn overlaps(&self, range: &DateRange) -> bool {
        self.start_at < range.end_at && range.start_at < self.end_at
    }
}

/// Body of `POST /rentals/`
#[derive(Debug, Clone, Serialize)]
pub struct CreateRentalRequest {
    pub item_id: u64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl CreateRentalRequest {
    pub fn new(item_id: u64, window: &RentalWindow) -> Self {
        Self {
            item_id,
            start_at: window.start_at,
            end_at: window.end_at,
        }
    }
}

/// A range during which an item is already booked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// Identifier of one reservation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
