//! CLI command implementations

pub mod credentials;
pub mod export;
pub mod sync;

use std::net::IpAddr;

use anyhow::{Context, Result};
use bcasync_core::adapters::klikbca::KlikBcaClient;
use bcasync_core::adapters::public_ip::public_ip;
use bcasync_core::config::{Config, CredentialField, CredentialStore, Credentials, Sink};
use bcasync_core::services::LogEvent;
use bcasync_core::Error;
use dialoguer::{Input, Password};

use crate::output;
use crate::GlobalArgs;

/// Log an event for a command
pub fn log_event(event: LogEvent) {
    event.emit();
}

/// Credentials given as flags or environment variables
fn flag_credentials(global: &GlobalArgs) -> Credentials {
    Credentials {
        bank_username: global.username.clone(),
        bank_password: global.password.clone(),
        ynab_token: global.token.clone(),
        firefly_token: global.firefly_token.clone(),
    }
}

/// Build the run configuration for `sink`, resolving credentials
///
/// Order: flags and environment, then the stored file (unless `--reset` or
/// `--non-interactive`), then prompts (unless `--non-interactive`).
pub fn build_config(global: &GlobalArgs, sink: Sink, adjust: bool) -> Result<Config> {
    let mut config = Config {
        account_name: global.account.clone(),
        budget_id: global.budget.clone(),
        days: global.days,
        adjust,
        sink,
        ..Config::from_env()
    };
    config.validate()?;

    let store = CredentialStore::default_location()?;
    config.credentials = resolve_credentials(global, &store, &config.sink)?;
    Ok(config)
}

fn resolve_credentials(global: &GlobalArgs, store: &CredentialStore, sink: &Sink) -> Result<Credentials> {
    let mut credentials = flag_credentials(global);

    if !global.reset && !global.non_interactive {
        let stored = store
            .load()
            .with_context(|| format!("failed to read {}. try --reset", store.path().display()))?;
        credentials = credentials.merge(&stored);
    }

    let missing = credentials.missing(sink);
    if missing.is_empty() {
        return Ok(credentials);
    }

    if global.non_interactive {
        let labels: Vec<&str> = missing.iter().map(|f| f.label()).collect();
        return Err(Error::missing_credential(labels.join(", ")).into());
    }

    for field in missing {
        let value = prompt(field)?;
        credentials.set(field, value);
    }

    if !global.no_store {
        store.save(&credentials).context("failed to save credentials")?;
        output::info(&format!("Credentials saved to {}", store.path().display()));
    }
    Ok(credentials)
}

fn prompt(field: CredentialField) -> Result<String> {
    let prompt = format!("Enter {}", field.label());
    let value = if field.is_secret() {
        Password::new().with_prompt(prompt).interact()?
    } else {
        Input::<String>::new().with_prompt(prompt).interact_text()?
    };
    Ok(value.trim().to_string())
}

/// Portal client, pointed at `$BCASYNC_KLIKBCA_URL` when set
pub fn bank_client(config: &Config) -> Result<KlikBcaClient> {
    let client = match &config.klikbca_url {
        Some(url) => KlikBcaClient::new_with_base_url(url)?,
        None => KlikBcaClient::new()?,
    };
    Ok(client)
}

/// The public IP the portal expects at login
pub fn client_ip() -> Result<IpAddr> {
    public_ip().context("failed to get public ip")
}
