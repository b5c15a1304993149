//! Diesel row models for order lifecycle persistence.

use super::schema::{call_logs, orders, store_assignments, stores, users};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

/// Query result row for orders.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    /// Internal order identifier.
    pub id: uuid::Uuid,
    /// Source-assigned identifier.
    pub external_id: String,
    /// Owning store.
    pub store_id: Option<uuid::Uuid>,
    /// Lead kind.
    pub source: String,
    /// Ingested customer name.
    pub customer_name: String,
    /// Ingested phone number.
    pub phone: String,
    /// Ingested address.
    pub address: String,
    /// Ingested postal code.
    pub postal_code: String,
    /// Product description.
    pub product_name: String,
    /// Unit price.
    pub unit_price: f64,
    /// Ordered quantity.
    pub quantity: i32,
    /// Source-reported order timestamp.
    pub ordered_at: Option<DateTime<Utc>>,
    /// Corrected customer name.
    pub edited_customer_name: Option<String>,
    /// Corrected phone number.
    pub edited_phone: Option<String>,
    /// Corrected address.
    pub edited_address: Option<String>,
    /// Corrected postal code.
    pub edited_postal_code: Option<String>,
    /// Correction timestamp.
    pub edited_at: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: String,
    /// Last disposition label.
    pub final_status: Option<String>,
    /// Call attempt count.
    pub attempts: i32,
    /// Assigned agent.
    pub assigned_to: Option<uuid::Uuid>,
    /// Assignment timestamp.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last successful sync.
    pub synced_at: Option<DateTime<Utc>>,
    /// Revision counter.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for orders.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    /// Internal order identifier.
    pub id: uuid::Uuid,
    /// Source-assigned identifier.
    pub external_id: String,
    /// Owning store.
    pub store_id: Option<uuid::Uuid>,
    /// Lead kind.
    pub source: String,
    /// Ingested customer name.
    pub customer_name: String,
    /// Ingested phone number.
    pub phone: String,
    /// Ingested address.
    pub address: String,
    /// Ingested postal code.
    pub postal_code: String,
    /// Product description.
    pub product_name: String,
    /// Unit price.
    pub unit_price: f64,
    /// Ordered quantity.
    pub quantity: i32,
    /// Source-reported order timestamp.
    pub ordered_at: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: String,
    /// Call attempt count.
    pub attempts: i32,
    /// Revision counter.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Mutable order columns written on update.
///
/// Ingested details and identity columns are never rewritten.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = orders)]
#[diesel(treat_none_as_null = true)]
pub struct OrderChangesRow {
    /// Corrected customer name.
    pub edited_customer_name: Option<String>,
    /// Corrected phone number.
    pub edited_phone: Option<String>,
    /// Corrected address.
    pub edited_address: Option<String>,
    /// Corrected postal code.
    pub edited_postal_code: Option<String>,
    /// Correction timestamp.
    pub edited_at: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: String,
    /// Last disposition label.
    pub final_status: Option<String>,
    /// Call attempt count.
    pub attempts: i32,
    /// Assigned agent.
    pub assigned_to: Option<uuid::Uuid>,
    /// Assignment timestamp.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last successful sync.
    pub synced_at: Option<DateTime<Utc>>,
    /// Revision counter.
    pub version: i64,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Call log row, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = call_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CallLogRow {
    /// Call log identifier.
    pub id: uuid::Uuid,
    /// Called order.
    pub order_id: uuid::Uuid,
    /// Calling agent.
    pub agent_id: uuid::Uuid,
    /// Number dialed.
    pub phone_dialed: String,
    /// Dial start.
    pub started_at: Option<DateTime<Utc>>,
    /// Call end.
    pub ended_at: Option<DateTime<Utc>>,
    /// Talk time in seconds.
    pub duration_secs: i32,
    /// Disposition label.
    pub disposition: String,
    /// Agent notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Store row, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = stores)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoreRow {
    /// Store identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Source-system handle.
    pub handle: String,
    /// Active flag.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// User row, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Sign-in PIN.
    pub pin: String,
    /// Role name.
    pub role: String,
    /// Active flag.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Store assignment row, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = store_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssignmentRow {
    /// Assignment identifier.
    pub id: uuid::Uuid,
    /// Assigned store.
    pub store_id: uuid::Uuid,
    /// Assigned agent.
    pub agent_id: uuid::Uuid,
    /// Calendar day.
    pub assigned_date: NaiveDate,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
