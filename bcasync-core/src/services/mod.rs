//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one step of the sync pipeline.

pub mod clearance;
pub mod export;
pub mod import_id;
pub mod logging;
pub mod mapper;
pub mod reconcile;
pub mod submit;
mod sync;

pub use clearance::clearance_date;
pub use export::{to_csv_string, write_csv};
pub use import_id::import_id;
pub use logging::{init_logging, LogEvent};
pub use mapper::TransactionMapper;
pub use reconcile::{balance_delta, BalanceReconciler, SplitReconciler};
pub use submit::{BatchSubmitter, SplitSubmitter, SubmitResult};
pub use sync::{ReconcileStatus, SyncOutcome, SyncReport, SyncService, SyncTarget};
