//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The sync pipeline
//! depends only on these traits, not on concrete implementations.

mod bank;
mod ledger;

pub use bank::{BankSession, BankingProvider};
pub use ledger::{BudgetLedger, CreateTransactionsResponse, SplitLedger, RECONCILIATION_ACCOUNT_TYPE};
