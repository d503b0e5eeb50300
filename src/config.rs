use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Connectivity monitor tick interval in seconds.
    pub monitor_interval_secs: u64,
    /// Heartbeat staleness window in seconds. A device whose last heartbeat
    /// is older than this is reported offline.
    pub offline_after_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            monitor_interval_secs: optional("MONITOR_INTERVAL_SECS", "60")
                .parse()
                .context("MONITOR_INTERVAL_SECS must be a positive integer")?,
            offline_after_secs: optional("OFFLINE_AFTER_SECS", "300")
                .parse()
                .context("OFFLINE_AFTER_SECS must be a positive integer")?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_falls_back_to_default() {
        assert_eq!(optional("GREENHOUSE_TEST_UNSET_VAR", "8080"), "8080");
    }

    #[test]
    fn required_missing_var_errors() {
        let err = required("GREENHOUSE_TEST_UNSET_VAR").unwrap_err();
        assert!(err.to_string().contains("GREENHOUSE_TEST_UNSET_VAR"));
    }
}
