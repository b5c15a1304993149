//! Domain model for the order lifecycle.
//!
//! Orders are ingested from source records, handed to agents through daily
//! store assignments, and settled by call dispositions. Infrastructure
//! concerns stay outside this boundary.

mod assignment;
mod call_log;
mod contact;
mod disposition;
mod error;
mod ids;
mod order;
mod record;
mod roster;

pub use assignment::{Assignment, AssignmentMap};
pub use call_log::{CallLog, CallTiming, PersistedCallLogData};
pub use contact::{
    ContactEdit, MAX_ADDRESS_CHARS, MAX_NAME_CHARS, MAX_POSTAL_CODE_CHARS, PhoneNumber,
};
pub use disposition::{CallOutcome, DispositionCode, SyncTag};
pub use error::{OrderDomainError, ParseOrderSourceError, ParseOrderStatusError};
pub use ids::{AgentId, AssignmentId, CallLogId, ExternalOrderId, OrderId, OrderVersion, StoreId};
pub use order::{Order, OrderDetails, OrderStatus, PersistedOrderData};
pub use record::{OrderSource, SourceRecord, parse_price, parse_quantity, parse_timestamp};
pub use roster::{Agent, AgentPin, Store, StoreName, resolve_store};
