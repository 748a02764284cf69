//! YNAB API client
//!
//! Implements the BudgetLedger port against the YNAB v1 REST API. Every
//! response is wrapped in a `data` envelope; errors carry an
//! `{"error": {"id", "name", "detail"}}` body.
//!
//! API Documentation: https://api.ynab.com

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{BudgetAccount, CanonicalTransaction, CategoryGroup};
use crate::ports::{BudgetLedger, CreateTransactionsResponse};

/// Default production API URL
pub const YNAB_PRODUCTION_URL: &str = "https://api.ynab.com/v1";

/// Environment variable to override the YNAB API base URL
pub const YNAB_BASE_URL_ENV: &str = "BCASYNC_YNAB_URL";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct AccountsData {
    accounts: Vec<BudgetAccount>,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    account: BudgetAccount,
}

#[derive(Debug, Deserialize)]
struct CategoriesData {
    category_groups: Vec<CategoryGroup>,
}

#[derive(Debug, Deserialize)]
struct SaveTransactionsData {
    #[serde(default)]
    transaction_ids: Vec<String>,
    #[serde(default)]
    duplicate_import_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SaveTransactionData {
    transaction: SavedTransaction,
}

#[derive(Debug, Deserialize)]
struct SavedTransaction {
    id: String,
}

#[derive(Serialize)]
struct BulkBody<'a> {
    transactions: &'a [CanonicalTransaction],
}

#[derive(Serialize)]
struct SingleBody<'a> {
    transaction: &'a CanonicalTransaction,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    detail: String,
}

/// YNAB API client
#[derive(Debug)]
pub struct YnabClient {
    client: Client,
    token: String,
    base_url: String,
}

impl YnabClient {
    /// Create a client for the production API, or `$BCASYNC_YNAB_URL` if set
    pub fn new(token: &str) -> Result<Self> {
        let base_url =
            std::env::var(YNAB_BASE_URL_ENV).unwrap_or_else(|_| YNAB_PRODUCTION_URL.to_string());
        Self::new_with_base_url(token, &base_url)
    }

    pub fn new_with_base_url(token: &str, base_url: &str) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::missing_credential("YNAB token"));
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            token: token.trim().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.bearer_auth(&self.token).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(Error::ledger(status.as_u16(), error_detail(&body)));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }
}

/// Pull the human-readable part out of a YNAB error body
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error }) if !error.detail.is_empty() => {
            format!("{} ({} {})", error.detail, error.id, error.name)
        }
        _ => body.to_string(),
    }
}

impl BudgetLedger for YnabClient {
    fn list_accounts(&self, budget_id: &str) -> Result<Vec<BudgetAccount>> {
        debug!(budget_id, "listing ynab accounts");
        let data: AccountsData = self.send(
            self.client
                .get(self.url(&format!("/budgets/{}/accounts", budget_id))),
        )?;
        Ok(data.accounts)
    }

    fn get_account(&self, budget_id: &str, account_id: Uuid) -> Result<BudgetAccount> {
        debug!(budget_id, %account_id, "fetching ynab account");
        let data: AccountData = self.send(
            self.client
                .get(self.url(&format!("/budgets/{}/accounts/{}", budget_id, account_id))),
        )?;
        Ok(data.account)
    }

    fn list_categories(&self, budget_id: &str) -> Result<Vec<CategoryGroup>> {
        debug!(budget_id, "listing ynab categories");
        let data: CategoriesData = self.send(
            self.client
                .get(self.url(&format!("/budgets/{}/categories", budget_id))),
        )?;
        Ok(data.category_groups)
    }

    fn create_transactions(
        &self,
        budget_id: &str,
        transactions: &[CanonicalTransaction],
    ) -> Result<CreateTransactionsResponse> {
        debug!(budget_id, count = transactions.len(), "creating ynab transactions");
        let data: SaveTransactionsData = self.send(
            self.client
                .post(self.url(&format!("/budgets/{}/transactions", budget_id)))
                .json(&BulkBody { transactions }),
        )?;
        Ok(CreateTransactionsResponse {
            transaction_ids: data.transaction_ids,
            duplicate_import_ids: data.duplicate_import_ids,
        })
    }

    fn create_transaction(&self, budget_id: &str, transaction: &CanonicalTransaction) -> Result<String> {
        debug!(budget_id, "creating ynab transaction");
        let data: SaveTransactionData = self.send(
            self.client
                .post(self.url(&format!("/budgets/{}/transactions", budget_id)))
                .json(&SingleBody { transaction }),
        )?;
        Ok(data.transaction.id)
    }
}
