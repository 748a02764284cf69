//! KlikBCA mobile portal client
//!
//! Implements the BankingProvider port by driving the HTML forms of the
//! mobile internet banking site. There is no API: sessions are cookies and
//! data is scraped from the returned pages.
//!
//! Statement rows look like
//! ```html
//! <tr><td>05/03</td><td>TRSF E-BANKING CR<br>0503/FTSCY/WS95031<br>ACME<br>50,000.00</td><td>CR</td></tr>
//! ```
//! where the detail cell holds description lines, then the payee, then the
//! amount. Pending rows carry `PEND` instead of a date.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{COOKIE, REFERER, SET_COOKIE};
use reqwest::redirect::Policy;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{BankBalance, EntryType, StatementEntry};
use crate::ports::{BankSession, BankingProvider};

/// Default production portal URL
pub const KLIKBCA_PRODUCTION_URL: &str = "https://m.klikbca.com";

/// Environment variable to override the portal base URL
pub const KLIKBCA_BASE_URL_ENV: &str = "BCASYNC_KLIKBCA_URL";

const USER_AGENT: &str =
    "Mozilla/5.0 (Linux; Android 10; Mobile) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0 Mobile Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<tr[^>]*>\s*<td[^>]*>\s*(PEND|\d{1,2}/\d{1,2})\s*</td>\s*<td[^>]*>(.*?)</td>\s*<td[^>]*>\s*(DB|CR)\s*</td>\s*</tr>",
    )
    .expect("statement row regex")
});

static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

static ERR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var\s+err\s*=\s*'([^']*)'").expect("portal error regex"));

// Cells may wrap their text in formatting tags such as `<font>` or `<b>`
static BALANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let cell = |capture: &str| format!(r"<td[^>]*>(?:\s*<[^>]+>)*\s*{}\s*(?:<[^>]+>\s*)*</td>", capture);
    Regex::new(&format!(
        r"(?is){}\s*{}\s*{}",
        cell(r"(\d{6,})"),
        cell(r"([A-Z]{3})"),
        cell(r"(-?[\d,]+(?:\.\d+)?)"),
    ))
    .expect("balance row regex")
});

/// KlikBCA portal client
#[derive(Debug)]
pub struct KlikBcaClient {
    client: Client,
    base_url: String,
}

impl KlikBcaClient {
    /// Create a client for the production portal, or `$BCASYNC_KLIKBCA_URL` if set
    pub fn new() -> Result<Self> {
        let base_url = std::env::var(KLIKBCA_BASE_URL_ENV)
            .unwrap_or_else(|_| KLIKBCA_PRODUCTION_URL.to_string());
        Self::new_with_base_url(&base_url)
    }

    pub fn new_with_base_url(base_url: &str) -> Result<Self> {
        // Session cookies arrive on the login response itself
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send()?;
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            Ok(response)
        } else {
            Err(Error::bank(format!("portal answered HTTP {}", status.as_u16())))
        }
    }

    /// Send with the session cookie and return the page, failing on portal alerts
    fn page(&self, session: &BankSession, request: RequestBuilder) -> Result<String> {
        let body = self.send(request.header(COOKIE, &session.cookies))?.text()?;
        check_portal_error(&body)?;
        Ok(body)
    }
}

impl BankingProvider for KlikBcaClient {
    fn name(&self) -> &str {
        "klikbca"
    }

    fn login(&self, username: &str, password: &str, client_ip: &str) -> Result<BankSession> {
        debug!("logging into klikbca");
        let form = [
            ("value(user_id)", username),
            ("value(pswd)", password),
            ("value(Submit)", "LOGIN"),
            ("value(actions)", "login"),
            ("value(user_ip)", client_ip),
            ("user_ip", client_ip),
            ("value(mobile)", "true"),
            ("mobile", "true"),
        ];

        let response = self.send(
            self.client
                .post(self.url("authentication.do"))
                .header(REFERER, self.url("login.jsp"))
                .form(&form),
        )?;
        let cookies = session_cookies(&response);
        let body = response.text()?;
        check_portal_error(&body)?;

        if cookies.is_empty() {
            return Err(Error::bank("login returned no session"));
        }
        Ok(BankSession::new(cookies))
    }

    fn fetch_statement(
        &self,
        session: &BankSession,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<StatementEntry>> {
        debug!(%start_date, %end_date, "fetching klikbca statement");

        // The portal wants the statement form opened before it accepts a view
        self.page(
            session,
            self.client
                .post(self.url("accountstmt.do?value(actions)=acct_stmt"))
                .header(REFERER, self.url("authentication.do")),
        )?;

        let day = |d: NaiveDate| format!("{:02}", d.day());
        let month = |d: NaiveDate| d.month().to_string();
        let year = |d: NaiveDate| d.year().to_string();
        let form = [
            ("r1", "1".to_string()),
            ("value(D1)", "0".to_string()),
            ("value(startDt)", day(start_date)),
            ("value(startMt)", month(start_date)),
            ("value(startYr)", year(start_date)),
            ("value(endDt)", day(end_date)),
            ("value(endMt)", month(end_date)),
            ("value(endYr)", year(end_date)),
        ];

        let body = self.page(
            session,
            self.client
                .post(self.url("accountstmt.do?value(actions)=acctstmtview"))
                .header(REFERER, self.url("accountstmt.do?value(actions)=acct_stmt"))
                .form(&form),
        )?;

        let entries = parse_statement(&body, end_date)?;
        debug!(count = entries.len(), "parsed statement rows");
        Ok(entries)
    }

    fn fetch_balance(&self, session: &BankSession) -> Result<BankBalance> {
        debug!("fetching klikbca balance");
        let body = self.page(
            session,
            self.client
                .post(self.url("balanceinquiry.do"))
                .header(REFERER, self.url("accountstmt.do?value(actions)=menu")),
        )?;
        parse_balance(&body)
    }

    fn logout(&self, session: &BankSession) -> Result<()> {
        debug!("logging out of klikbca");
        self.send(
            self.client
                .get(self.url("authentication.do?value(actions)=logout"))
                .header(COOKIE, &session.cookies)
                .header(REFERER, self.url("authentication.do?value(actions)=menu")),
        )?;
        Ok(())
    }
}

/// `name=value` pairs from every Set-Cookie header, joined for a Cookie header
fn session_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Turn a portal `var err='...'` alert into an error
pub fn check_portal_error(body: &str) -> Result<()> {
    match ERR_RE.captures(body).map(|c| c[1].trim().to_string()) {
        Some(message) if !message.is_empty() => Err(Error::bank(message)),
        _ => Ok(()),
    }
}

/// Parse statement rows out of an account statement page
///
/// `dd/mm` dates get the year of `end_date`, or the year before when that
/// would land after `end_date` (a window spanning New Year).
pub fn parse_statement(body: &str, end_date: NaiveDate) -> Result<Vec<StatementEntry>> {
    ROW_RE
        .captures_iter(body)
        .map(|caps| {
            let date = parse_row_date(&caps[1], end_date)?;
            let entry_type: EntryType = caps[3].parse()?;

            let mut lines: Vec<String> = BR_RE
                .split(&caps[2])
                .map(clean_text)
                .filter(|l| !l.is_empty())
                .collect();

            let amount_text = lines
                .pop()
                .ok_or_else(|| Error::bank("statement row without amount"))?;
            let amount = parse_amount(&amount_text)?;
            let payee = lines.pop().unwrap_or_default();
            let description = lines.join(" ");

            Ok(StatementEntry::new(date, amount, entry_type, payee, description))
        })
        .collect()
}

fn parse_row_date(cell: &str, end_date: NaiveDate) -> Result<Option<NaiveDate>> {
    let cell = cell.trim();
    if cell.eq_ignore_ascii_case("PEND") {
        return Ok(None);
    }

    let invalid = || Error::bank(format!("unexpected statement date {:?}", cell));
    let (day, month) = cell.split_once('/').ok_or_else(invalid)?;
    let day: u32 = day.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;

    let date = NaiveDate::from_ymd_opt(end_date.year(), month, day)
        .filter(|d| *d <= end_date)
        .or_else(|| NaiveDate::from_ymd_opt(end_date.year() - 1, month, day))
        .ok_or_else(invalid)?;
    Ok(Some(date))
}

/// Parse a statement amount such as `1,234,567.89`
///
/// Statement amounts are magnitudes; the DB/CR column carries the direction,
/// so a signed amount is rejected.
pub fn parse_amount(text: &str) -> Result<Decimal> {
    let amount = parse_decimal(text)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::bank(format!("negative statement amount {:?}", text)));
    }
    Ok(amount)
}

fn parse_decimal(text: &str) -> Result<Decimal> {
    text.trim()
        .replace(',', "")
        .parse::<Decimal>()
        .map_err(|_| Error::bank(format!("unexpected amount {:?}", text)))
}

/// Parse the first account row of a balance inquiry page
pub fn parse_balance(body: &str) -> Result<BankBalance> {
    let caps = BALANCE_RE.captures(body).ok_or_else(|| {
        warn!("balance page did not contain an account row");
        Error::bank("balance not found on balance inquiry page")
    })?;

    Ok(BankBalance {
        account_number: caps[1].to_string(),
        // Overdrawn accounts report a negative balance
        balance: parse_decimal(&caps[3])?,
    })
}

fn clean_text(raw: &str) -> String {
    TAG_RE
        .replace_all(raw, "")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
