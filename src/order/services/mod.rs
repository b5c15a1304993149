//! Application services for the order lifecycle.

mod disposition;
mod edit;
mod ingestion;
mod planner;
mod queue;
mod roster;
mod sync;

pub use disposition::{
    DispositionError, DispositionReceipt, DispositionResult, DispositionService,
    RecordDispositionRequest,
};
pub use edit::{EditError, EditOrderRequest, EditReceipt, EditResult, EditService};
pub use ingestion::{
    DEFAULT_PREVIEW_LIMIT, IngestionBatch, IngestionError, IngestionReport, IngestionResult,
    IngestionService,
};
pub use planner::{AssignmentPlanner, DistributionReport, PlannerError, PlannerResult};
pub use queue::{MAX_AGENT_CALLS, QueueError, QueueResult, QueueService};
pub use roster::{RosterService, RosterServiceError, RosterServiceResult, StoreSpec};
pub use sync::{
    OutboundSyncGateway, SkipReason, StoreBindings, SyncChange, SyncIntent, SyncOutcome,
};
