//! bcasync core - mirror KlikBCA statements into YNAB or Firefly III
//!
//! This crate implements the sync pipeline following hexagonal architecture:
//!
//! - **domain**: Statement lines, ledger transactions, accounts
//! - **ports**: Trait definitions for the bank and the ledgers
//! - **services**: Mapping, import ids, submission, reconciliation, the run itself
//! - **adapters**: Concrete implementations (KlikBCA, YNAB, Firefly III)
//! - **config**: The run's settings and the stored credentials

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export commonly used types at crate root
pub use config::{Config, CredentialField, CredentialStore, Credentials, Sink};
pub use domain::result::Error;
pub use domain::{BankBalance, CanonicalTransaction, EntryType, LedgerSplit, StatementEntry};
pub use services::{ReconcileStatus, SyncOutcome, SyncReport, SyncService, SyncTarget};
