use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::export::ExportKind;

/// Runtime settings, read from `PILATESDESK_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub tenant: String,
    pub metrics_port: Option<u16>,
    pub reminder_period: Duration,
    pub export: Option<ExportKind>,
    /// Email and password for the demo directory; when set, the session picks the tenant.
    pub login: Option<(String, String)>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("PILATESDESK_DATA_DIR").unwrap_or_else(|| "./data".into());
        let tenant = lookup("PILATESDESK_TENANT").unwrap_or_else(|| "demo".into());
        let metrics_port = lookup("PILATESDESK_METRICS_PORT").and_then(|s| s.parse().ok());
        let reminder_secs: u64 = lookup("PILATESDESK_REMINDER_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(3600);
        let export = lookup("PILATESDESK_EXPORT").and_then(|s| {
            let kind = ExportKind::parse(&s);
            if kind.is_none() {
                warn!("ignoring unknown PILATESDESK_EXPORT value {s:?}");
            }
            kind
        });

        let login = lookup("PILATESDESK_EMAIL").zip(lookup("PILATESDESK_PASSWORD"));

        Self {
            data_dir: PathBuf::from(data_dir),
            tenant,
            metrics_port,
            reminder_period: Duration::from_secs(reminder_secs),
            export,
            login,
        }
    }
}
