//! Balance reconciliation
//!
//! After an import the ledger's balance should match the bank's. When it
//! does not (missed lines, manual edits, opening balance) a single
//! adjustment transaction closes the gap.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::result::Error;
use crate::domain::{find_category, to_milliunits, CanonicalTransaction, LedgerSplit, SplitType};
use crate::ports::{BudgetLedger, SplitLedger, RECONCILIATION_ACCOUNT_TYPE};

/// Milliunits to add to the ledger so it matches the bank
pub fn balance_delta(bank_balance: Decimal, ledger_balance: i64) -> i64 {
    to_milliunits(bank_balance).saturating_sub(ledger_balance)
}

/// Reconciles a budgeting-service account against the bank balance
pub struct BalanceReconciler<'a> {
    ledger: &'a dyn BudgetLedger,
    budget_id: &'a str,
    category_name: &'a str,
}

impl<'a> BalanceReconciler<'a> {
    /// `category_name` is the category adjustments are booked against
    pub fn new(ledger: &'a dyn BudgetLedger, budget_id: &'a str, category_name: &'a str) -> Self {
        Self {
            ledger,
            budget_id,
            category_name,
        }
    }

    /// Post an adjustment if the account drifted from `bank_balance`
    ///
    /// Returns the posted adjustment, or `None` when already balanced.
    pub fn reconcile(
        &self,
        bank_balance: Decimal,
        account_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<CanonicalTransaction>> {
        let account = self
            .ledger
            .get_account(self.budget_id, account_id)
            .context("failed to get ynab account")?;

        let delta = balance_delta(bank_balance, account.balance);
        debug!(delta, "balance delta");
        if delta == 0 {
            return Ok(None);
        }

        let groups = self
            .ledger
            .list_categories(self.budget_id)
            .context("failed to get categories")?;
        let category = find_category(&groups, self.category_name).ok_or_else(|| {
            Error::not_found(format!("couldn't find category {:?}", self.category_name))
        })?;

        let adjustment = CanonicalTransaction::adjustment(account_id, category.id, date, delta);
        self.ledger
            .create_transaction(self.budget_id, &adjustment)
            .context("failed to create balance adjustment transaction")?;

        info!("balance adjustment transaction created");
        Ok(Some(adjustment))
    }
}

/// Reconciles a ledger-service asset account against the bank balance
pub struct SplitReconciler<'a> {
    ledger: &'a dyn SplitLedger,
    account_name: &'a str,
    days: i64,
}

impl<'a> SplitReconciler<'a> {
    /// `days` is the statement window length, used in the description
    pub fn new(ledger: &'a dyn SplitLedger, account_name: &'a str, days: i64) -> Self {
        Self {
            ledger,
            account_name,
            days,
        }
    }

    pub fn reconcile(
        &self,
        bank_balance: Decimal,
        account_id: &str,
        to: NaiveDate,
    ) -> Result<Option<LedgerSplit>> {
        let account = self
            .ledger
            .get_account(account_id)
            .context("failed to get firefly account")?;

        if account.current_balance == bank_balance {
            return Ok(None);
        }

        let found = self
            .ledger
            .search_accounts(self.account_name, Some(RECONCILIATION_ACCOUNT_TYPE))
            .context("failed to search reconciliation account")?;
        let reconciliation_account = found.into_iter().next().ok_or_else(|| {
            Error::not_found(format!(
                "no reconciliation accounts found with name {:?}",
                self.account_name
            ))
        })?;

        let from = to - Duration::days(self.days);
        let split = reconciliation_split(
            account.current_balance,
            bank_balance,
            &account.id,
            &reconciliation_account.id,
            from,
            to,
        );
        self.ledger
            .store_transaction(&split)
            .context("failed to create firefly reconciliation")?;

        info!("reconciliation transaction created");
        Ok(Some(split))
    }
}

/// Build the reconciliation split closing `bank_balance - ledger_balance`
///
/// A positive gap moves money from the reconciliation account into the
/// asset account, a negative one the other way.
pub fn reconciliation_split(
    ledger_balance: Decimal,
    bank_balance: Decimal,
    account_id: &str,
    reconciliation_account_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> LedgerSplit {
    let delta = bank_balance - ledger_balance;
    let (source, destination) = if delta.is_sign_positive() && !delta.is_zero() {
        (reconciliation_account_id, account_id)
    } else {
        (account_id, reconciliation_account_id)
    };

    LedgerSplit {
        split_type: SplitType::Reconciliation,
        date: to,
        amount: delta.abs().normalize().to_string(),
        description: format!(
            "Reconciliation ({} to {})",
            from.format("%B %-d, %Y"),
            to.format("%B %-d, %Y")
        ),
        source_id: Some(source.to_string()),
        source_name: None,
        destination_id: Some(destination.to_string()),
        destination_name: None,
        reconciled: Some(true),
        external_id: None,
    }
}
