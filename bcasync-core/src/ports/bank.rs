//! Banking provider port
//!
//! Defines the interface for reading statements and balances from the bank
//! portal.

use chrono::NaiveDate;

use crate::domain::result::Result;
use crate::domain::{BankBalance, StatementEntry};

/// An authenticated portal session
///
/// Holds the cookie header the portal handed out at login. Sessions are
/// single-use: one login, one logout per sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankSession {
    pub cookies: String,
}

impl BankSession {
    pub fn new(cookies: impl Into<String>) -> Self {
        Self {
            cookies: cookies.into(),
        }
    }
}

/// Banking provider trait
///
/// The SyncService drives a provider strictly in sequence: `login`, then any
/// number of reads, then `logout`.
pub trait BankingProvider: Send + Sync {
    /// Provider name (e.g., "klikbca")
    fn name(&self) -> &str;

    /// Log into the portal
    ///
    /// # Arguments
    /// * `client_ip` - Public IP of this machine; the portal records it with the login
    fn login(&self, username: &str, password: &str, client_ip: &str) -> Result<BankSession>;

    /// Fetch statement lines between two dates (inclusive)
    fn fetch_statement(
        &self,
        session: &BankSession,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<StatementEntry>>;

    /// Fetch the current account balance
    fn fetch_balance(&self, session: &BankSession) -> Result<BankBalance>;

    /// End the session
    fn logout(&self, session: &BankSession) -> Result<()>;
}
