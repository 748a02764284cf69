//! Public IP lookup
//!
//! The bank portal wants the client's public address with the login form.

use std::net::IpAddr;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::domain::result::{Error, Result};

/// Plain-text "what is my IP" endpoint
pub const IPIFY_URL: &str = "https://api.ipify.org?format=text";

/// Look up this machine's public IP via ipify
pub fn public_ip() -> Result<IpAddr> {
    public_ip_from(IPIFY_URL)
}

/// Look up the public IP from a plain-text endpoint
pub fn public_ip_from(url: &str) -> Result<IpAddr> {
    let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
    let response = client.get(url).send()?;
    let status = response.status();
    let body = response.text()?;

    if !status.is_success() {
        return Err(Error::Transport(format!(
            "ip lookup failed with HTTP {}",
            status.as_u16()
        )));
    }

    let ip = body
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| Error::Validation(format!("ip lookup returned {:?}", body.trim())))?;
    debug!(%ip, "resolved public ip");
    Ok(ip)
}
