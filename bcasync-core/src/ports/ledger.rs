//! Ledger ports - the budgeting service and the double-entry ledger service

use crate::domain::result::Result;
use crate::domain::{BudgetAccount, CanonicalTransaction, CategoryGroup, LedgerAccount, LedgerSplit};
use uuid::Uuid;

/// Account type used to look up the ledger service's reconciliation account
pub const RECONCILIATION_ACCOUNT_TYPE: &str = "Reconciliation account";

/// Result of a bulk transaction create
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTransactionsResponse {
    /// IDs of the transactions actually created
    pub transaction_ids: Vec<String>,
    /// Import IDs the ledger already knew within the account
    pub duplicate_import_ids: Vec<String>,
}

/// Budgeting service (milliunit, envelope-style budget)
///
/// `budget_id` may be an ID or an alias such as "last-used".
pub trait BudgetLedger: Send + Sync {
    /// List accounts in a budget
    fn list_accounts(&self, budget_id: &str) -> Result<Vec<BudgetAccount>>;

    /// Get a single account, with its current balance
    fn get_account(&self, budget_id: &str, account_id: Uuid) -> Result<BudgetAccount>;

    /// List categories, grouped
    fn list_categories(&self, budget_id: &str) -> Result<Vec<CategoryGroup>>;

    /// Create many transactions in one call
    ///
    /// Transactions whose `import_id` already exists in the account are
    /// skipped by the service and reported in `duplicate_import_ids`.
    fn create_transactions(
        &self,
        budget_id: &str,
        transactions: &[CanonicalTransaction],
    ) -> Result<CreateTransactionsResponse>;

    /// Create one transaction, returning its ID
    fn create_transaction(&self, budget_id: &str, transaction: &CanonicalTransaction) -> Result<String>;
}

/// Double-entry ledger service
pub trait SplitLedger: Send + Sync {
    /// Search accounts by name, optionally restricted to an account type
    fn search_accounts(&self, name: &str, account_type: Option<&str>) -> Result<Vec<LedgerAccount>>;

    /// Get an account by ID
    fn get_account(&self, id: &str) -> Result<LedgerAccount>;

    /// Store a single-split transaction
    fn store_transaction(&self, split: &LedgerSplit) -> Result<()>;
}
