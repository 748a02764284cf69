//! Bank statement domain model

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::Error;

/// Direction of a statement line, as seen from the bank account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Money leaving the account (`DB`)
    Debit,
    /// Money entering the account (`CR`)
    Credit,
}

impl EntryType {
    /// The portal's two-letter code
    pub fn code(&self) -> &'static str {
        match self {
            EntryType::Debit => "DB",
            EntryType::Credit => "CR",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for EntryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DB" => Ok(EntryType::Debit),
            "CR" => Ok(EntryType::Credit),
            other => Err(Error::validation(format!(
                "unknown statement entry type {:?}",
                other
            ))),
        }
    }
}

/// One line of a bank account statement
///
/// There is no identity field: two fetches of the same line are only
/// recognizable through [`crate::services::import_id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementEntry {
    /// Posting date, `None` while the transaction is pending
    pub date: Option<NaiveDate>,
    /// Non-negative magnitude in the account currency
    pub amount: Decimal,
    pub entry_type: EntryType,
    pub payee: String,
    /// Free text; truncated or reworded between fetches by the portal
    pub description: String,
}

impl StatementEntry {
    pub fn new(
        date: Option<NaiveDate>,
        amount: Decimal,
        entry_type: EntryType,
        payee: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date,
            amount,
            entry_type,
            payee: payee.into(),
            description: description.into(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.date.is_none()
    }
}

/// Authoritative balance reported by the bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankBalance {
    pub account_number: String,
    pub balance: Decimal,
}
