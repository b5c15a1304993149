//! Raw source records and best-effort field parsing.
//!
//! Adapters for storefront orders, abandoned carts, and spreadsheet rows all
//! produce [`SourceRecord`] values. Fields stay as text so the ingestion
//! normalizer owns the parsing rules.

use super::ParseOrderSourceError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of lead an order was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSource {
    /// Cash-on-delivery order placed on a storefront.
    StorefrontOrder,
    /// Checkout abandoned before payment.
    AbandonedCart,
}

impl OrderSource {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StorefrontOrder => "cod",
            Self::AbandonedCart => "abandoned_cart",
        }
    }
}

impl fmt::Display for OrderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OrderSource {
    type Error = ParseOrderSourceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "cod" | "order" | "storefront_order" => Ok(Self::StorefrontOrder),
            "abandoned_cart" | "abandoned" | "cart" => Ok(Self::AbandonedCart),
            _ => Err(ParseOrderSourceError(value.to_owned())),
        }
    }
}

/// Unvalidated record produced by a source adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Source-assigned identifier; may be blank in malformed input.
    pub external_id: String,
    /// Lead kind, when the adapter knows it.
    pub source: Option<OrderSource>,
    /// Free-text store or channel label used for store resolution.
    pub channel: Option<String>,
    /// Customer display name.
    pub customer_name: String,
    /// Customer phone number as supplied.
    pub phone: String,
    /// Delivery address.
    pub address: String,
    /// Postal code.
    pub postal_code: String,
    /// Description of the ordered product.
    pub product_name: String,
    /// Unit price as text.
    pub price: String,
    /// Quantity as text.
    pub quantity: String,
    /// Source timestamp as text.
    pub ordered_at: String,
}

/// Parses a price, falling back to `0.0` for anything non-numeric.
#[must_use]
pub fn parse_price(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ',' | '₹' | '$' | ' '))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(0.0)
}

/// Parses a quantity, falling back to `1` for anything non-numeric or zero.
#[must_use]
pub fn parse_quantity(raw: &str) -> u32 {
    let trimmed = raw.trim();
    let parsed = trimmed.parse::<u32>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 1.0 && *value <= f64::from(u32::MAX))
            .map(|value| format!("{value:.0}"))
            .and_then(|whole| whole.parse::<u32>().ok())
    });
    parsed.filter(|value| *value > 0).unwrap_or(1)
}

/// Parses a source timestamp in RFC 3339, `YYYY-MM-DD HH:MM:SS`, or
/// `YYYY-MM-DD` form.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}
