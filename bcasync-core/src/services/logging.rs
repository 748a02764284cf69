//! Logging service - structured events through `tracing`
//!
//! Diagnostics go to stderr so stdout stays clean for `--json` and CSV
//! output. No user data (credentials, amounts, payees, descriptions) is
//! ever logged.

use serde::Serialize;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding a full filter directive, e.g. `bcasync_core=debug`
pub const LOG_ENV: &str = "BCASYNC_LOG";

/// Default filter for a `-v` count
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the stderr subscriber
///
/// `BCASYNC_LOG` wins over `verbosity` when set. Calling this twice is a
/// no-op rather than an error.
pub fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter_layer = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))?;
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1);

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
    Ok(())
}

/// A log event to be recorded
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogEvent {
    /// Create a new log event with just an event name
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Default::default()
        }
    }

    /// Set the command context
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the sink the run targets
    pub fn with_sink(mut self, sink: impl Into<String>) -> Self {
        self.sink = Some(sink.into());
        self
    }

    /// Set error information
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Record a failed run, keeping only the outermost context
    ///
    /// Inner causes may quote payees, amounts or whole request bodies, which
    /// stay in the error shown to the user but never reach the log.
    pub fn with_failure(self, error: &anyhow::Error) -> Self {
        self.with_error(error.to_string())
    }

    /// Emit through tracing: `warn` when carrying an error, `info` otherwise
    pub fn emit(&self) {
        let command = self.command.as_deref().unwrap_or("");
        let sink = self.sink.as_deref().unwrap_or("");
        match &self.error_message {
            Some(error) => tracing::warn!(
                event = %self.event,
                command,
                sink,
                error = %error,
                "command event"
            ),
            None => tracing::info!(event = %self.event, command, sink, "command event"),
        }
    }
}
