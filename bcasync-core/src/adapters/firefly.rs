//! Firefly III API client
//!
//! Implements the SplitLedger port against a self-hosted Firefly III
//! instance (`<url>/api/v1`, personal access token).

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::{LedgerAccount, LedgerSplit};
use crate::ports::SplitLedger;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct AccountResource {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    attributes: AccountAttributes,
}

#[derive(Debug, Deserialize)]
struct AccountAttributes {
    name: String,
    #[serde(rename = "type", default)]
    account_type: String,
    #[serde(default, deserialize_with = "deserialize_balance")]
    current_balance: Decimal,
}

impl From<AccountResource> for LedgerAccount {
    fn from(resource: AccountResource) -> Self {
        LedgerAccount {
            id: resource.id,
            name: resource.attributes.name,
            account_type: resource.attributes.account_type,
            current_balance: resource.attributes.current_balance,
        }
    }
}

#[derive(Serialize)]
struct StoreBody<'a> {
    transactions: [&'a LedgerSplit; 1],
}

/// IDs come back as strings, older versions sent numbers
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::String(s) => Ok(s),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}

/// Balance as a decimal string, a number, or null for no balance
fn deserialize_balance<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => Ok(Decimal::ZERO),
        JsonValue::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        JsonValue::String(s) => s
            .parse::<Decimal>()
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        _ => Err(D::Error::custom("expected number or string for balance")),
    }
}

/// Firefly III API client
#[derive(Debug)]
pub struct FireflyClient {
    client: Client,
    token: String,
    api_url: String,
}

impl FireflyClient {
    /// `url` is the instance root, e.g. `https://firefly.example.com`
    pub fn new(url: &str, token: &str) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::missing_credential("Firefly token"));
        }
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::Config(format!("invalid Firefly URL {:?}: {}", url, e)))?;

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            token: token.trim().to_string(),
            api_url: format!("{}/api/v1", parsed.as_str().trim_end_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn send(&self, request: RequestBuilder, context: &str) -> Result<String> {
        let response = request
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let body = if context.is_empty() {
                body
            } else {
                format!("{} (request: {})", body, context)
            };
            return Err(Error::ledger(status.as_u16(), body));
        }
        Ok(body)
    }

    fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request, "")?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }
}

impl SplitLedger for FireflyClient {
    fn search_accounts(&self, name: &str, account_type: Option<&str>) -> Result<Vec<LedgerAccount>> {
        debug!(name, ?account_type, "searching firefly accounts");
        let mut query = vec![("field", "name"), ("query", name)];
        if let Some(account_type) = account_type {
            query.push(("type", account_type));
        }

        let found: Vec<AccountResource> =
            self.fetch(self.client.get(self.url("/search/accounts")).query(&query))?;
        Ok(found.into_iter().map(LedgerAccount::from).collect())
    }

    fn get_account(&self, id: &str) -> Result<LedgerAccount> {
        debug!(id, "fetching firefly account");
        let resource: AccountResource =
            self.fetch(self.client.get(self.url(&format!("/accounts/{}", id))))?;
        Ok(resource.into())
    }

    fn store_transaction(&self, split: &LedgerSplit) -> Result<()> {
        let body = StoreBody {
            transactions: [split],
        };
        let request_json = serde_json::to_string(&body)?;
        debug!(split_type = ?split.split_type, date = %split.date, "storing firefly transaction");

        self.send(
            self.client
                .post(self.url("/transactions"))
                .header("Content-Type", "application/json")
                .body(request_json.clone()),
            &request_json,
        )?;
        Ok(())
    }
}
