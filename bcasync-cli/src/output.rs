//! Output formatting utilities

use bcasync_core::domain::SplitType;
use bcasync_core::{CanonicalTransaction, LedgerSplit};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use rust_decimal::Decimal;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Table of mapped transactions, amounts in currency units
pub fn transactions_table(transactions: &[CanonicalTransaction]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Date", "Payee", "Memo", "Amount", "Import ID"]);
    for tx in transactions {
        table.add_row(vec![
            Cell::new(tx.date),
            Cell::new(tx.payee_name.as_deref().unwrap_or("")),
            Cell::new(tx.memo.as_deref().unwrap_or("")),
            Cell::new(format_amount(tx.amount_units())).set_alignment(CellAlignment::Right),
            Cell::new(tx.import_id.as_deref().unwrap_or("")),
        ]);
    }
    table
}

/// Table of ledger splits; amounts are positive, the type gives direction
pub fn splits_table(splits: &[LedgerSplit]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Date", "Type", "Counterparty", "Description", "Amount"]);
    for split in splits {
        let counterparty = match split.split_type {
            SplitType::Deposit => split.source_name.as_deref(),
            _ => split.destination_name.as_deref(),
        };
        let amount = split
            .amount
            .parse::<Decimal>()
            .map(format_amount)
            .unwrap_or_else(|_| split.amount.clone());
        table.add_row(vec![
            Cell::new(split.date),
            Cell::new(split_type_label(split.split_type)),
            Cell::new(counterparty.unwrap_or("")),
            Cell::new(&split.description),
            Cell::new(amount).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn split_type_label(split_type: SplitType) -> &'static str {
    match split_type {
        SplitType::Withdrawal => "withdrawal",
        SplitType::Deposit => "deposit",
        SplitType::Reconciliation => "reconciliation",
    }
}

/// Format an amount with thousands separators, e.g. `-1,234,567.5`
pub fn format_amount(amount: Decimal) -> String {
    let text = amount.normalize().abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::new(3_000_000, 3)), "3,000");
        assert_eq!(format_amount(Decimal::new(-20_000_000, 3)), "-20,000");
        assert_eq!(format_amount(Decimal::new(12345675, 1)), "1,234,567.5");
        assert_eq!(format_amount(Decimal::new(999, 0)), "999");
        assert_eq!(format_amount(Decimal::ZERO), "0");
    }

    #[test]
    fn test_splits_table_shows_counterparty() {
        let split = LedgerSplit {
            split_type: SplitType::Withdrawal,
            date: "2021-03-03".parse().unwrap(),
            amount: "20000".to_string(),
            description: "coffee".to_string(),
            source_id: Some(String::new()),
            source_name: None,
            destination_id: None,
            destination_name: Some("Shop".to_string()),
            reconciled: None,
            external_id: None,
        };

        let rendered = splits_table(&[split]).to_string();
        assert!(rendered.contains("withdrawal"));
        assert!(rendered.contains("Shop"));
        assert!(rendered.contains("20,000"));
    }
}
