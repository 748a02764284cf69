//! Canonical transaction domain model
//!
//! Two target shapes exist: [`CanonicalTransaction`] for the budgeting
//! service (signed milliunits, import id) and [`LedgerSplit`] for the
//! double-entry ledger service (positive decimal amount, direction given by
//! source and destination accounts).

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minor units per currency unit in the budgeting service
pub const MILLIUNITS_PER_UNIT: i64 = 1000;

/// Payee used for balance adjustment entries
pub const ADJUSTMENT_PAYEE: &str = "Automated Balance Adjustment";

/// Convert a currency amount to milliunits, truncating toward zero
///
/// Amounts outside the `i64` milliunit range saturate; the bank never
/// reports anything close to that.
pub fn to_milliunits(amount: Decimal) -> i64 {
    let saturated = if amount.is_sign_negative() { i64::MIN } else { i64::MAX };
    amount
        .checked_mul(Decimal::from(MILLIUNITS_PER_UNIT))
        .and_then(|scaled| scaled.trunc().to_i64())
        .unwrap_or(saturated)
}

/// Clearing state of a budgeting-service transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearedStatus {
    Cleared,
    Uncleared,
    Reconciled,
}

impl ClearedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearedStatus::Cleared => "cleared",
            ClearedStatus::Uncleared => "uncleared",
            ClearedStatus::Reconciled => "reconciled",
        }
    }
}

/// A transaction in the budgeting service's payload shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    /// Target account; nil when mapped for a file export
    pub account_id: Uuid,
    pub date: NaiveDate,
    /// Signed milliunits, positive = inflow
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub cleared: ClearedStatus,
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_color: Option<String>,
    /// Dedup key; absent for adjustment entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_id: Option<String>,
}

impl CanonicalTransaction {
    /// Build the balance adjustment entry posted by the reconciler
    pub fn adjustment(account_id: Uuid, category_id: Uuid, date: NaiveDate, amount: i64) -> Self {
        Self {
            account_id,
            date,
            amount,
            payee_name: Some(ADJUSTMENT_PAYEE.to_string()),
            category_id: Some(category_id),
            memo: None,
            cleared: ClearedStatus::Reconciled,
            approved: true,
            flag_color: None,
            import_id: None,
        }
    }

    /// Amount in currency units
    pub fn amount_units(&self) -> Decimal {
        Decimal::new(self.amount, 3)
    }
}

/// Kind of a ledger-service split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    Withdrawal,
    Deposit,
    Reconciliation,
}

/// A transaction split in the ledger service's payload shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSplit {
    #[serde(rename = "type")]
    pub split_type: SplitType,
    pub date: NaiveDate,
    /// Always positive, direction comes from source/destination
    pub amount: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}
