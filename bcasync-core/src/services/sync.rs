//! Sync service - mirror the bank statement into a ledger
//!
//! One run: log in, fetch the statement window, map, submit, reconcile the
//! balance, log out. Everything is sequential and no step is retried.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{Config, CredentialField};
use crate::domain::result::Error;
use crate::domain::{CanonicalTransaction, LedgerSplit, StatementEntry};
use crate::ports::{BankSession, BankingProvider, BudgetLedger, SplitLedger};
use crate::services::export::write_csv;
use crate::services::mapper::TransactionMapper;
use crate::services::reconcile::{BalanceReconciler, SplitReconciler};
use crate::services::submit::{BatchSubmitter, SplitSubmitter};

/// Ledger a run writes into
#[derive(Clone, Copy)]
pub enum SyncTarget<'a> {
    /// Budgeting service (YNAB)
    Budget(&'a dyn BudgetLedger),
    /// Double-entry ledger service (Firefly III)
    Ledger(&'a dyn SplitLedger),
}

impl SyncTarget<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            SyncTarget::Budget(_) => "ynab",
            SyncTarget::Ledger(_) => "firefly",
        }
    }
}

/// Sync service driving one bank session
pub struct SyncService<'a> {
    bank: &'a dyn BankingProvider,
    config: &'a Config,
    mapper: TransactionMapper,
}

impl<'a> SyncService<'a> {
    /// `now` is the run time in the bank's zone; every date in the run derives from it
    pub fn new(bank: &'a dyn BankingProvider, config: &'a Config, now: DateTime<FixedOffset>) -> Self {
        Self {
            bank,
            config,
            mapper: TransactionMapper::new(now),
        }
    }

    /// Statement window `(start, end)`, end being today
    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        let end = self.mapper.today();
        (end - Duration::days(self.config.days), end)
    }

    /// Run `f` inside a portal session
    ///
    /// Logout always runs once login succeeded; a failed logout is only
    /// logged so it never masks the outcome of `f`.
    fn with_session<T>(
        &self,
        client_ip: &str,
        f: impl FnOnce(&BankSession) -> Result<T>,
    ) -> Result<T> {
        let credentials = &self.config.credentials;
        let username = credentials.require(CredentialField::BankUsername)?;
        let password = credentials.require(CredentialField::BankPassword)?;

        let session = self
            .bank
            .login(username, password, client_ip)
            .context("failed to login to klikbca. try --reset")?;
        info!(provider = self.bank.name(), "logged in");

        let result = f(&session);

        if let Err(e) = self.bank.logout(&session) {
            warn!(error = %e, "failed to logout of klikbca");
        }
        result
    }

    fn fetch_entries(&self, session: &BankSession) -> Result<Vec<StatementEntry>> {
        let (start, end) = self.window();
        let entries = self
            .bank
            .fetch_statement(session, start, end)
            .context("failed to get bca transactions. try --reset")?;
        info!(count = entries.len(), "fetched statement");
        Ok(entries)
    }

    fn report(&self, sink: &str, entries: &[StatementEntry], outcome: SyncOutcome) -> SyncReport {
        let (start_date, end_date) = self.window();
        SyncReport {
            sink: sink.to_string(),
            start_date,
            end_date,
            fetched: entries.len(),
            pending: entries.iter().filter(|e| e.is_pending()).count(),
            outcome,
        }
    }

    /// Sync the statement window into `target`
    ///
    /// With `dry_run` the statement is mapped into the target's own shape
    /// against an unbound account and the ledger is never called.
    pub fn sync(&self, target: SyncTarget<'_>, client_ip: &str, dry_run: bool) -> Result<SyncReport> {
        self.with_session(client_ip, |session| {
            let entries = self.fetch_entries(session)?;

            let outcome = if entries.is_empty() {
                info!("no transactions in statement window");
                SyncOutcome::EmptyStatement
            } else if dry_run {
                match target {
                    SyncTarget::Budget(_) => SyncOutcome::DryRun {
                        transactions: self.mapper.map_all(&entries, Uuid::nil()),
                    },
                    SyncTarget::Ledger(_) => SyncOutcome::LedgerDryRun {
                        splits: self.mapper.map_all_splits(&entries, ""),
                    },
                }
            } else {
                match target {
                    SyncTarget::Budget(ledger) => self.sync_budget(ledger, session, &entries)?,
                    SyncTarget::Ledger(ledger) => self.sync_ledger(ledger, session, &entries)?,
                }
            };

            Ok(self.report(target.name(), &entries, outcome))
        })
    }

    fn sync_budget(
        &self,
        ledger: &dyn BudgetLedger,
        session: &BankSession,
        entries: &[StatementEntry],
    ) -> Result<SyncOutcome> {
        let budget_id = self.config.budget_id.as_str();
        let accounts = ledger
            .list_accounts(budget_id)
            .context("failed to get ynab accounts. try --reset")?;
        let account = accounts
            .into_iter()
            .find(|a| !a.deleted && a.name == self.config.account_name)
            .ok_or_else(|| {
                Error::not_found(format!(
                    "couldn't find ynab account {:?}",
                    self.config.account_name
                ))
            })?;

        let transactions = self.mapper.map_all(entries, account.id);
        let result = BatchSubmitter::new(ledger, budget_id)
            .submit(&transactions)
            .context("failed to create ynab transactions")?;

        let reconciliation = if self.config.adjust {
            let (_, end) = self.window();
            let reconciler = BalanceReconciler::new(ledger, budget_id, &self.config.adjust_category);
            reconcile_status(self.fetch_balance(session).and_then(|balance| {
                reconciler
                    .reconcile(balance, account.id, end)
                    .map(|adjustment| adjustment.map(|tx| tx.amount_units()))
            }))
        } else {
            ReconcileStatus::Skipped
        };

        Ok(SyncOutcome::Submitted {
            created: result.created,
            duplicates: result.duplicates,
            reconciliation,
        })
    }

    fn sync_ledger(
        &self,
        ledger: &dyn SplitLedger,
        session: &BankSession,
        entries: &[StatementEntry],
    ) -> Result<SyncOutcome> {
        let name = self.config.account_name.as_str();
        let account = ledger
            .search_accounts(name, None)
            .with_context(|| format!("failed to search account {:?}", name))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("no accounts found with name {:?}", name)))?;

        let splits = self.mapper.map_all_splits(entries, &account.id);
        let result = SplitSubmitter::new(ledger)
            .submit(&splits)
            .context("failed to create firefly transactions")?;

        let reconciliation = if self.config.adjust {
            let (_, end) = self.window();
            let reconciler = SplitReconciler::new(ledger, name, self.config.days);
            reconcile_status(self.fetch_balance(session).and_then(|balance| {
                let before = ledger
                    .get_account(&account.id)
                    .context("failed to get firefly account")?
                    .current_balance;
                reconciler
                    .reconcile(balance, &account.id, end)
                    .map(|split| split.map(|_| balance - before))
            }))
        } else {
            ReconcileStatus::Skipped
        };

        Ok(SyncOutcome::Submitted {
            created: result.created,
            duplicates: result.duplicates,
            reconciliation,
        })
    }

    fn fetch_balance(&self, session: &BankSession) -> Result<Decimal> {
        let balance = self
            .bank
            .fetch_balance(session)
            .context("failed to get bca balance")?;
        Ok(balance.balance)
    }

    /// Write the statement window as CSV instead of posting it
    pub fn export<W: Write>(&self, client_ip: &str, writer: W) -> Result<SyncReport> {
        self.with_session(client_ip, |session| {
            let entries = self.fetch_entries(session)?;
            let transactions = self.mapper.map_all(&entries, Uuid::nil());
            write_csv(writer, &transactions).context("failed to write csv")?;

            Ok(self.report(
                "csv",
                &entries,
                SyncOutcome::Exported {
                    count: transactions.len(),
                },
            ))
        })
    }
}

fn reconcile_status(result: Result<Option<Decimal>>) -> ReconcileStatus {
    match result {
        Ok(Some(amount)) => ReconcileStatus::Adjusted { amount },
        Ok(None) => ReconcileStatus::Balanced,
        Err(e) => {
            // Causes can quote amounts; the full chain goes to the report only
            warn!(error = %e, "balance reconciliation failed");
            ReconcileStatus::Failed {
                error: format!("{:#}", e),
            }
        }
    }
}

/// Summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub sink: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Statement lines fetched, pending ones included
    pub fetched: usize,
    pub pending: usize,
    pub outcome: SyncOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Nothing in the window; no ledger call was made
    EmptyStatement,
    DryRun {
        transactions: Vec<CanonicalTransaction>,
    },
    /// Dry run against the ledger service, amounts as positive decimals
    LedgerDryRun {
        splits: Vec<LedgerSplit>,
    },
    Exported {
        count: usize,
    },
    Submitted {
        created: usize,
        duplicates: usize,
        reconciliation: ReconcileStatus,
    },
}

/// What the balance reconciliation step did
///
/// `Failed` leaves the import in place; callers decide how loud to be.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileStatus {
    Skipped,
    Balanced,
    /// Amount posted, in currency units
    Adjusted { amount: Decimal },
    Failed { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_status_mapping() {
        assert_eq!(reconcile_status(Ok(None)), ReconcileStatus::Balanced);
        assert_eq!(
            reconcile_status(Ok(Some(Decimal::new(3000, 0)))),
            ReconcileStatus::Adjusted {
                amount: Decimal::new(3000, 0)
            }
        );

        let failed = reconcile_status(Err(anyhow::Error::new(Error::not_found(
            "couldn't find category \"Inflows\"",
        ))
        .context("reconcile")));
        match failed {
            ReconcileStatus::Failed { error } => {
                assert!(error.starts_with("reconcile: "));
                assert!(error.contains("Inflows"));
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }
}
