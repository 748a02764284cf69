//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - KlikBCA mobile portal scraper for BankingProvider
//! - YNAB HTTP client for BudgetLedger
//! - Firefly III HTTP client for SplitLedger
//! - ipify lookup for the client IP the portal wants at login

pub mod firefly;
pub mod klikbca;
pub mod public_ip;
pub mod ynab;

#[cfg(test)]
pub mod mock_server;
