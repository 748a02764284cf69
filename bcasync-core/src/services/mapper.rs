//! Statement line to ledger transaction mapping

use chrono::{DateTime, FixedOffset, NaiveDate};
use uuid::Uuid;

use crate::domain::{
    to_milliunits, CanonicalTransaction, ClearedStatus, EntryType, LedgerSplit, SplitType,
    StatementEntry,
};
use crate::services::clearance::clearance_date;
use crate::services::import_id::import_id;

/// Maps statement lines into ledger payloads relative to a fixed run time
///
/// All mapping in a run shares one `now`, so pending lines get the same
/// predicted date and no line is dated after the run.
#[derive(Debug, Clone, Copy)]
pub struct TransactionMapper {
    now: DateTime<FixedOffset>,
}

impl TransactionMapper {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    /// The run's local calendar date
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Posted date, or the predicted clearance date for pending lines
    fn resolve_date(&self, entry: &StatementEntry) -> NaiveDate {
        entry.date.unwrap_or_else(|| clearance_date(&self.now))
    }

    /// Map one line into the budgeting-service shape
    ///
    /// Pass `Uuid::nil()` as `account_id` when the result is only written
    /// to a file.
    pub fn map(&self, entry: &StatementEntry, account_id: Uuid) -> CanonicalTransaction {
        let resolved = self.resolve_date(entry);
        let import_id = import_id(resolved, entry.amount, entry.entry_type, &entry.payee);

        // The entry type carries the sign; the amount is a magnitude
        let milliunits = to_milliunits(entry.amount.abs());
        let amount = match entry.entry_type {
            EntryType::Debit => milliunits.saturating_neg(),
            EntryType::Credit => milliunits,
        };

        CanonicalTransaction {
            account_id,
            date: resolved.min(self.today()),
            amount,
            payee_name: Some(entry.payee.clone()),
            category_id: None,
            memo: Some(memo(entry).to_string()),
            cleared: ClearedStatus::Cleared,
            approved: true,
            flag_color: None,
            import_id: Some(import_id),
        }
    }

    pub fn map_all(&self, entries: &[StatementEntry], account_id: Uuid) -> Vec<CanonicalTransaction> {
        entries.iter().map(|e| self.map(e, account_id)).collect()
    }

    /// Map one line into the ledger-service shape
    ///
    /// Debits flow from the account to a payee-named expense account,
    /// credits from a payee-named revenue account into it.
    pub fn map_split(&self, entry: &StatementEntry, account_id: &str) -> LedgerSplit {
        let resolved = self.resolve_date(entry);
        let external_id = import_id(resolved, entry.amount, entry.entry_type, &entry.payee);

        let mut split = LedgerSplit {
            split_type: SplitType::Deposit,
            date: resolved.min(self.today()),
            amount: entry.amount.abs().normalize().to_string(),
            description: memo(entry).to_string(),
            source_id: None,
            source_name: None,
            destination_id: None,
            destination_name: None,
            reconciled: None,
            external_id: Some(external_id),
        };

        match entry.entry_type {
            EntryType::Debit => {
                split.split_type = SplitType::Withdrawal;
                split.source_id = Some(account_id.to_string());
                split.destination_name = Some(entry.payee.clone());
            }
            EntryType::Credit => {
                split.source_name = Some(entry.payee.clone());
                split.destination_id = Some(account_id.to_string());
            }
        }

        split
    }

    pub fn map_all_splits(&self, entries: &[StatementEntry], account_id: &str) -> Vec<LedgerSplit> {
        entries.iter().map(|e| self.map_split(e, account_id)).collect()
    }
}

/// Description when the portal gave one, payee otherwise
fn memo(entry: &StatementEntry) -> &str {
    if entry.description.trim().is_empty() {
        &entry.payee
    } else {
        &entry.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn wib(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn acme_credit() -> StatementEntry {
        StatementEntry::new(
            Some(date(2021, 3, 1)),
            Decimal::new(50000, 0),
            EntryType::Credit,
            "ACME",
            "",
        )
    }

    fn pending_coffee() -> StatementEntry {
        StatementEntry::new(None, Decimal::new(20000, 0), EntryType::Debit, "Shop", "coffee")
    }

    #[test]
    fn test_credit_maps_to_positive_milliunits() {
        let mapper = TransactionMapper::new(wib(2021, 3, 3, 9));
        let tx = mapper.map(&acme_credit(), Uuid::nil());

        assert_eq!(tx.amount, 50_000_000);
        assert_eq!(tx.date, date(2021, 3, 1));
        assert_eq!(tx.memo.as_deref(), Some("ACME"));
        assert_eq!(tx.payee_name.as_deref(), Some("ACME"));
        assert_eq!(tx.cleared, ClearedStatus::Cleared);
        assert!(tx.approved);
        assert!(tx.category_id.is_none());
        assert!(tx.flag_color.is_none());
    }

    #[test]
    fn test_pending_debit_uses_clearance_date() {
        let mapper = TransactionMapper::new(wib(2021, 3, 3, 9));
        let tx = mapper.map(&pending_coffee(), Uuid::nil());

        assert_eq!(tx.amount, -20_000_000);
        assert_eq!(tx.date, date(2021, 3, 3));
        assert_eq!(tx.memo.as_deref(), Some("coffee"));
    }

    #[test]
    fn test_future_clearance_date_is_clamped_but_keyed_unclamped() {
        // Friday 23:00: predicted clearance is Monday
        let mapper = TransactionMapper::new(wib(2021, 3, 5, 23));
        let tx = mapper.map(&pending_coffee(), Uuid::nil());

        assert_eq!(tx.date, date(2021, 3, 5));
        let monday_key = import_id(date(2021, 3, 8), Decimal::new(20000, 0), EntryType::Debit, "Shop");
        assert_eq!(tx.import_id.as_deref(), Some(monday_key.as_str()));
    }

    #[test]
    fn test_posted_future_date_is_clamped() {
        let mapper = TransactionMapper::new(wib(2021, 3, 3, 9));
        let mut entry = acme_credit();
        entry.date = Some(date(2021, 3, 10));

        assert_eq!(mapper.map(&entry, Uuid::nil()).date, date(2021, 3, 3));
    }

    #[test]
    fn test_description_does_not_affect_import_id() {
        let mapper = TransactionMapper::new(wib(2021, 3, 3, 9));
        let mut a = acme_credit();
        let mut b = acme_credit();
        a.description = "TRSF E-BANKING CR 0103/FTSCY".to_string();
        b.description = "TRSF E-BANKING".to_string();

        let ta = mapper.map(&a, Uuid::nil());
        let tb = mapper.map(&b, Uuid::nil());
        assert_eq!(ta.import_id, tb.import_id);
        assert_ne!(ta.memo, tb.memo);
    }

    #[test]
    fn test_sign_law_holds_for_all_entries() {
        let mapper = TransactionMapper::new(wib(2021, 3, 3, 9));
        let amounts = [Decimal::ZERO, Decimal::new(1, 3), Decimal::new(999, 2), Decimal::new(123456789, 0)];

        for amount in amounts {
            let credit = StatementEntry::new(None, amount, EntryType::Credit, "x", "");
            let debit = StatementEntry::new(None, amount, EntryType::Debit, "x", "");
            assert!(mapper.map(&credit, Uuid::nil()).amount >= 0);
            assert!(mapper.map(&debit, Uuid::nil()).amount <= 0);
        }
    }

    #[test]
    fn test_signed_amount_follows_entry_type() {
        let mapper = TransactionMapper::new(wib(2021, 3, 3, 9));
        let credit = StatementEntry::new(None, Decimal::new(-5000, 0), EntryType::Credit, "x", "");
        let debit = StatementEntry::new(None, Decimal::new(-5000, 0), EntryType::Debit, "x", "");

        assert_eq!(mapper.map(&credit, Uuid::nil()).amount, 5_000_000);
        assert_eq!(mapper.map(&debit, Uuid::nil()).amount, -5_000_000);
        assert_eq!(mapper.map_split(&credit, "7").amount, "5000");
    }

    #[test]
    fn test_huge_debit_saturates_instead_of_overflowing() {
        let mapper = TransactionMapper::new(wib(2021, 3, 3, 9));
        let debit = StatementEntry::new(None, Decimal::MAX, EntryType::Debit, "x", "");
        let credit = StatementEntry::new(None, Decimal::MIN, EntryType::Credit, "x", "");

        assert_eq!(mapper.map(&debit, Uuid::nil()).amount, -i64::MAX);
        assert_eq!(mapper.map(&credit, Uuid::nil()).amount, i64::MAX);
    }

    #[test]
    fn test_sub_milliunit_amounts_truncate() {
        let mapper = TransactionMapper::new(wib(2021, 3, 3, 9));
        let entry = StatementEntry::new(None, Decimal::new(12345, 4), EntryType::Debit, "x", "");
        assert_eq!(mapper.map(&entry, Uuid::nil()).amount, -1234);
    }

    #[test]
    fn test_debit_split_direction() {
        let mapper = TransactionMapper::new(wib(2021, 3, 3, 9));
        let split = mapper.map_split(&pending_coffee(), "7");

        assert_eq!(split.split_type, SplitType::Withdrawal);
        assert_eq!(split.amount, "20000");
        assert_eq!(split.source_id.as_deref(), Some("7"));
        assert_eq!(split.destination_name.as_deref(), Some("Shop"));
        assert_eq!(split.description, "coffee");
        assert_eq!(split.date, date(2021, 3, 3));
    }

    #[test]
    fn test_credit_split_direction() {
        let mapper = TransactionMapper::new(wib(2021, 3, 3, 9));
        let split = mapper.map_split(&acme_credit(), "7");

        assert_eq!(split.split_type, SplitType::Deposit);
        assert_eq!(split.source_name.as_deref(), Some("ACME"));
        assert_eq!(split.destination_id.as_deref(), Some("7"));
        assert_eq!(split.description, "ACME");
        assert!(split.external_id.is_some());
    }
}
