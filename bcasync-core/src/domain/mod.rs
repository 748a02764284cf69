//! Core domain entities
//!
//! Pure data structures shared by the pipeline, the ports and the adapters.
//! No I/O happens here.

mod account;
mod entry;
pub mod result;
pub mod transaction;

pub use account::{find_category, BudgetAccount, Category, CategoryGroup, LedgerAccount};
pub use entry::{BankBalance, EntryType, StatementEntry};
pub use transaction::{
    to_milliunits, CanonicalTransaction, ClearedStatus, LedgerSplit, SplitType, ADJUSTMENT_PAYEE,
};
