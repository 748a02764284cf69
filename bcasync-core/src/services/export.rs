//! CSV export of mapped transactions

use std::io::Write;

use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::CanonicalTransaction;

#[derive(Serialize)]
struct CsvRow<'a> {
    account_id: String,
    date: String,
    amount: i64,
    payee_name: &'a str,
    memo: &'a str,
    cleared: &'a str,
    approved: bool,
    import_id: &'a str,
}

impl<'a> From<&'a CanonicalTransaction> for CsvRow<'a> {
    fn from(tx: &'a CanonicalTransaction) -> Self {
        // Nil account means "not bound to a ledger account"
        let account_id = if tx.account_id.is_nil() {
            String::new()
        } else {
            tx.account_id.to_string()
        };

        Self {
            account_id,
            date: tx.date.format("%Y-%m-%d").to_string(),
            amount: tx.amount,
            payee_name: tx.payee_name.as_deref().unwrap_or(""),
            memo: tx.memo.as_deref().unwrap_or(""),
            cleared: tx.cleared.as_str(),
            approved: tx.approved,
            import_id: tx.import_id.as_deref().unwrap_or(""),
        }
    }
}

/// Column order of the exported file
pub const CSV_HEADER: [&str; 8] = [
    "account_id",
    "date",
    "amount",
    "payee_name",
    "memo",
    "cleared",
    "approved",
    "import_id",
];

/// Write transactions as CSV with a header row
///
/// The header is written even when there are no transactions.
pub fn write_csv<W: Write>(writer: W, transactions: &[CanonicalTransaction]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    for tx in transactions {
        csv_writer.serialize(CsvRow::from(tx))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Render transactions as a CSV string
pub fn to_csv_string(transactions: &[CanonicalTransaction]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, transactions)?;
    String::from_utf8(buffer).map_err(|e| crate::domain::result::Error::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::domain::ClearedStatus;

    fn tx(account_id: Uuid, memo: &str) -> CanonicalTransaction {
        CanonicalTransaction {
            account_id,
            date: NaiveDate::from_ymd_opt(2021, 3, 3).unwrap(),
            amount: -20_000_000,
            payee_name: Some("Shop".to_string()),
            category_id: None,
            memo: Some(memo.to_string()),
            cleared: ClearedStatus::Cleared,
            approved: true,
            flag_color: None,
            import_id: Some("v1_abc".to_string()),
        }
    }

    #[test]
    fn test_csv_header_and_placeholder_account() {
        let csv = to_csv_string(&[tx(Uuid::nil(), "coffee")]).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("account_id,date,amount,payee_name,memo,cleared,approved,import_id")
        );
        assert_eq!(lines.next(), Some(",2021-03-03,-20000000,Shop,coffee,cleared,true,v1_abc"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_quotes_delimiters() {
        let csv = to_csv_string(&[tx(Uuid::nil(), "coffee, large")]).unwrap();
        assert!(csv.contains("\"coffee, large\""));
    }

    #[test]
    fn test_csv_keeps_real_account_id() {
        let id = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        let csv = to_csv_string(&[tx(id, "coffee")]).unwrap();
        assert!(csv.contains("11111111-1111-1111-1111-111111111111,2021-03-03"));
    }

    #[test]
    fn test_csv_empty_input_keeps_header() {
        let csv = to_csv_string(&[]).unwrap();
        assert_eq!(csv, format!("{}\n", CSV_HEADER.join(",")));
    }
}
