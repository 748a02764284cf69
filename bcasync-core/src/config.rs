//! Configuration management
//!
//! A run is driven by one [`Config`] value, built once at startup by the CLI
//! from flags, environment and the stored credentials file:
//! ```json
//! {
//!   "bcaUser": "...",
//!   "bcaPassword": "...",
//!   "ynabToken": "..."
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapters::klikbca::KLIKBCA_BASE_URL_ENV;
use crate::adapters::ynab::YNAB_BASE_URL_ENV;
use crate::domain::result::{Error, Result};

/// Environment variable overriding the credentials directory
pub const CONFIG_DIR_ENV: &str = "BCASYNC_CONFIG_DIR";

/// Credentials file name inside the config directory
pub const CREDENTIALS_FILE: &str = "credentials";

pub const DEFAULT_ACCOUNT_NAME: &str = "BCA";
pub const DEFAULT_BUDGET_ID: &str = "last-used";
pub const DEFAULT_ADJUST_CATEGORY: &str = "Inflows";

/// Statement lookback in days
pub const DEFAULT_DAYS: i64 = 27;

/// The portal refuses statement ranges longer than this
pub const MAX_DAYS: i64 = 31;

/// The bank's local zone (WIB)
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Login secrets, each optional until resolved
///
/// Blank values are treated as unset.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "bcaUser", default, skip_serializing_if = "Option::is_none")]
    pub bank_username: Option<String>,
    #[serde(rename = "bcaPassword", default, skip_serializing_if = "Option::is_none")]
    pub bank_password: Option<String>,
    #[serde(rename = "ynabToken", default, skip_serializing_if = "Option::is_none")]
    pub ynab_token: Option<String>,
    #[serde(rename = "fireflyToken", default, skip_serializing_if = "Option::is_none")]
    pub firefly_token: Option<String>,
}

// Secrets never reach logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("bank_username", &self.bank_username)
            .field("bank_password", &mask(&self.bank_password))
            .field("ynab_token", &mask(&self.ynab_token))
            .field("firefly_token", &mask(&self.firefly_token))
            .finish()
    }
}

/// One credential slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    BankUsername,
    BankPassword,
    YnabToken,
    FireflyToken,
}

impl CredentialField {
    /// Human label, used in prompts and missing-credential errors
    pub fn label(&self) -> &'static str {
        match self {
            CredentialField::BankUsername => "BCA username",
            CredentialField::BankPassword => "BCA password",
            CredentialField::YnabToken => "YNAB token",
            CredentialField::FireflyToken => "Firefly token",
        }
    }

    pub fn is_secret(&self) -> bool {
        !matches!(self, CredentialField::BankUsername)
    }

    /// Fields a sink needs before a run can start
    pub fn required_for(sink: &Sink) -> &'static [CredentialField] {
        match sink {
            Sink::Ynab => &[
                CredentialField::BankUsername,
                CredentialField::BankPassword,
                CredentialField::YnabToken,
            ],
            Sink::Firefly { .. } => &[
                CredentialField::BankUsername,
                CredentialField::BankPassword,
                CredentialField::FireflyToken,
            ],
            Sink::Csv => &[CredentialField::BankUsername, CredentialField::BankPassword],
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Credentials {
    pub fn get(&self, field: CredentialField) -> Option<&str> {
        match field {
            CredentialField::BankUsername => present(&self.bank_username),
            CredentialField::BankPassword => present(&self.bank_password),
            CredentialField::YnabToken => present(&self.ynab_token),
            CredentialField::FireflyToken => present(&self.firefly_token),
        }
    }

    pub fn set(&mut self, field: CredentialField, value: impl Into<String>) {
        let value = Some(value.into());
        match field {
            CredentialField::BankUsername => self.bank_username = value,
            CredentialField::BankPassword => self.bank_password = value,
            CredentialField::YnabToken => self.ynab_token = value,
            CredentialField::FireflyToken => self.firefly_token = value,
        }
    }

    /// Fill unset fields from `fallback`, keeping the ones already set
    pub fn merge(mut self, fallback: &Credentials) -> Self {
        for field in [
            CredentialField::BankUsername,
            CredentialField::BankPassword,
            CredentialField::YnabToken,
            CredentialField::FireflyToken,
        ] {
            if self.get(field).is_none() {
                if let Some(value) = fallback.get(field) {
                    self.set(field, value);
                }
            }
        }
        self
    }

    /// Fields `sink` needs that are still unset
    pub fn missing(&self, sink: &Sink) -> Vec<CredentialField> {
        CredentialField::required_for(sink)
            .iter()
            .copied()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// Value of a field, or `MissingCredential` naming it
    pub fn require(&self, field: CredentialField) -> Result<&str> {
        self.get(field)
            .ok_or_else(|| Error::missing_credential(field.label()))
    }

    pub fn is_empty(&self) -> bool {
        self == &Credentials::default()
    }
}

/// Where mapped transactions go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Ynab,
    Firefly { url: String },
    Csv,
}

impl Sink {
    pub fn name(&self) -> &'static str {
        match self {
            Sink::Ynab => "ynab",
            Sink::Firefly { .. } => "firefly",
            Sink::Csv => "csv",
        }
    }
}

/// Settings for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Ledger account to import into, matched by exact name
    pub account_name: String,
    /// Budget ID or alias
    pub budget_id: String,
    pub days: i64,
    /// Post a balance adjustment after import
    pub adjust: bool,
    pub adjust_category: String,
    pub utc_offset_hours: i32,
    pub sink: Sink,
    pub ynab_url: Option<String>,
    pub klikbca_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            account_name: DEFAULT_ACCOUNT_NAME.to_string(),
            budget_id: DEFAULT_BUDGET_ID.to_string(),
            days: DEFAULT_DAYS,
            adjust: true,
            adjust_category: DEFAULT_ADJUST_CATEGORY.to_string(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            sink: Sink::Ynab,
            ynab_url: None,
            klikbca_url: None,
        }
    }
}

impl Config {
    /// Defaults plus service URL overrides from the environment
    ///
    /// The URL overrides exist for pointing the adapters at test servers.
    pub fn from_env() -> Self {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            ynab_url: env(YNAB_BASE_URL_ENV),
            klikbca_url: env(KLIKBCA_BASE_URL_ENV),
            ..Self::default()
        }
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        utc_offset_from_hours(self.utc_offset_hours)
    }

    /// Current time in the bank's zone
    pub fn now(&self) -> Result<DateTime<FixedOffset>> {
        Ok(Utc::now().with_timezone(&self.utc_offset()?))
    }

    /// Check settings that don't depend on credentials
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_DAYS).contains(&self.days) {
            return Err(Error::Config(format!(
                "days must be between 1 and {}, got {}",
                MAX_DAYS, self.days
            )));
        }
        if self.account_name.trim().is_empty() {
            return Err(Error::Config("account name must not be empty".to_string()));
        }
        if self.budget_id.trim().is_empty() {
            return Err(Error::Config("budget must not be empty".to_string()));
        }
        if self.adjust && self.adjust_category.trim().is_empty() {
            return Err(Error::Config("adjustment category must not be empty".to_string()));
        }
        self.utc_offset()?;

        if let Sink::Firefly { url } = &self.sink {
            url::Url::parse(url)
                .map_err(|e| Error::Config(format!("invalid Firefly URL {:?}: {}", url, e)))?;
        }
        Ok(())
    }
}

/// Fixed offset for a whole-hour UTC shift
pub fn utc_offset_from_hours(hours: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(hours * 3600)
        .ok_or_else(|| Error::Config(format!("invalid UTC offset: {} hours", hours)))
}

/// Credentials persisted as JSON in the per-user config directory
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$BCASYNC_CONFIG_DIR`, else `<user config dir>/bcasync`
    pub fn default_location() -> Result<Self> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            if !dir.trim().is_empty() {
                return Ok(Self::new(dir));
            }
        }
        let base = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not determine the user config directory".to_string()))?;
        Ok(Self::new(base.join("bcasync")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Stored credentials; empty when nothing was saved yet
    pub fn load(&self) -> Result<Credentials> {
        let path = self.path();
        if !path.exists() {
            return Ok(Credentials::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let credentials = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "loaded stored credentials");
        Ok(credentials)
    }

    pub fn save(&self, credentials: &Credentials) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path();
        let content = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        debug!(path = %path.display(), "saved credentials");
        Ok(())
    }

    /// Remove the stored file, reporting whether there was one
    pub fn delete(&self) -> Result<bool> {
        let path = self.path();
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        Ok(true)
    }
}
