//! Batch submission of mapped transactions

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::result::Error;
use crate::domain::{CanonicalTransaction, LedgerSplit};
use crate::ports::{BudgetLedger, SplitLedger};

/// Counts reported back by the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmitResult {
    pub created: usize,
    pub duplicates: usize,
}

/// Posts a run's transactions to the budgeting service in one call
pub struct BatchSubmitter<'a> {
    ledger: &'a dyn BudgetLedger,
    budget_id: &'a str,
}

impl<'a> BatchSubmitter<'a> {
    pub fn new(ledger: &'a dyn BudgetLedger, budget_id: &'a str) -> Self {
        Self { ledger, budget_id }
    }

    /// Submit all transactions; dedup is left to the ledger's import id check
    pub fn submit(&self, transactions: &[CanonicalTransaction]) -> Result<SubmitResult> {
        if transactions.is_empty() {
            return Ok(SubmitResult::default());
        }

        debug!(count = transactions.len(), "submitting transaction batch");
        let response = self.ledger.create_transactions(self.budget_id, transactions)?;

        let result = SubmitResult {
            created: response.transaction_ids.len(),
            duplicates: response.duplicate_import_ids.len(),
        };

        if result.created + result.duplicates > transactions.len() {
            return Err(Error::validation(format!(
                "ledger reported {} created and {} duplicate transaction(s) for a batch of {}",
                result.created,
                result.duplicates,
                transactions.len()
            ))
            .into());
        }

        info!(created = result.created, duplicates = result.duplicates, "batch submitted");
        Ok(result)
    }
}

/// Posts a run's transactions to the ledger service, one split per call
///
/// The ledger service has no bulk endpoint and no import id matching, so
/// every stored split counts as created.
pub struct SplitSubmitter<'a> {
    ledger: &'a dyn SplitLedger,
}

impl<'a> SplitSubmitter<'a> {
    pub fn new(ledger: &'a dyn SplitLedger) -> Self {
        Self { ledger }
    }

    pub fn submit(&self, splits: &[LedgerSplit]) -> Result<SubmitResult> {
        for split in splits {
            self.ledger.store_transaction(split).with_context(|| {
                format!("failed to store transaction {:?} dated {}", split.description, split.date)
            })?;
        }

        info!(created = splits.len(), "splits stored");
        Ok(SubmitResult {
            created: splits.len(),
            duplicates: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::domain::result::Result as DomainResult;
    use crate::domain::{BudgetAccount, CategoryGroup, ClearedStatus};
    use crate::ports::CreateTransactionsResponse;

    /// Ledger that treats every import id it has seen as a duplicate
    #[derive(Default)]
    struct DedupLedger {
        seen: Mutex<Vec<String>>,
        calls: Mutex<usize>,
        overreport: bool,
    }

    impl BudgetLedger for DedupLedger {
        fn list_accounts(&self, _budget_id: &str) -> DomainResult<Vec<BudgetAccount>> {
            Ok(vec![])
        }

        fn get_account(&self, _budget_id: &str, account_id: Uuid) -> DomainResult<BudgetAccount> {
            Err(Error::not_found(account_id.to_string()))
        }

        fn list_categories(&self, _budget_id: &str) -> DomainResult<Vec<CategoryGroup>> {
            Ok(vec![])
        }

        fn create_transactions(
            &self,
            _budget_id: &str,
            transactions: &[CanonicalTransaction],
        ) -> DomainResult<CreateTransactionsResponse> {
            *self.calls.lock().unwrap() += 1;
            let mut seen = self.seen.lock().unwrap();
            let mut response = CreateTransactionsResponse::default();
            for tx in transactions {
                let id = tx.import_id.clone().unwrap_or_default();
                if seen.contains(&id) {
                    response.duplicate_import_ids.push(id);
                } else {
                    seen.push(id.clone());
                    response.transaction_ids.push(format!("tx-{}", id));
                }
            }
            if self.overreport {
                response.transaction_ids.push("phantom".to_string());
            }
            Ok(response)
        }

        fn create_transaction(&self, _budget_id: &str, _tx: &CanonicalTransaction) -> DomainResult<String> {
            Ok("single".to_string())
        }
    }

    fn tx(import_id: &str) -> CanonicalTransaction {
        CanonicalTransaction {
            account_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            amount: 1000,
            payee_name: Some("ACME".to_string()),
            category_id: None,
            memo: None,
            cleared: ClearedStatus::Cleared,
            approved: true,
            flag_color: None,
            import_id: Some(import_id.to_string()),
        }
    }

    #[test]
    fn test_submit_reports_created_and_duplicates() {
        let ledger = DedupLedger::default();
        let submitter = BatchSubmitter::new(&ledger, "last-used");

        let first = submitter.submit(&[tx("a"), tx("b")]).unwrap();
        assert_eq!(first, SubmitResult { created: 2, duplicates: 0 });

        let second = submitter.submit(&[tx("a"), tx("b"), tx("c")]).unwrap();
        assert_eq!(second, SubmitResult { created: 1, duplicates: 2 });
    }

    #[test]
    fn test_submit_empty_batch_skips_ledger() {
        let ledger = DedupLedger::default();
        let result = BatchSubmitter::new(&ledger, "last-used").submit(&[]).unwrap();

        assert_eq!(result, SubmitResult::default());
        assert_eq!(*ledger.calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_submit_rejects_overreporting_ledger() {
        let ledger = DedupLedger {
            overreport: true,
            ..Default::default()
        };
        let err = BatchSubmitter::new(&ledger, "last-used")
            .submit(&[tx("a")])
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Validation(_))));
    }
}
