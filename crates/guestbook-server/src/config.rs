use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Which row store backs the guestbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Sheets,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StoreKind::Sqlite),
            "sheets" => Ok(StoreKind::Sheets),
            "memory" => Ok(StoreKind::Memory),
            other => bail!("GUESTBOOK_STORE must be sqlite, sheets or memory (got '{}')", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreKind,
    pub db_path: PathBuf,
    pub sheet_id: Option<String>,
    pub sheet_range: String,
    pub credentials: Option<PathBuf>,
    pub app_url: String,
    pub holiday_file: Option<PathBuf>,
    /// Sessions unseen for this long are dropped.
    pub session_idle: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let port = get("GUESTBOOK_PORT").unwrap_or_else(|| "3000".into());
        let port: u16 = port
            .parse()
            .with_context(|| format!("GUESTBOOK_PORT is not a port number: '{}'", port))?;

        let idle = get("GUESTBOOK_SESSION_IDLE_SECS").unwrap_or_else(|| "3600".into());
        let idle: u64 = idle
            .parse()
            .with_context(|| format!("GUESTBOOK_SESSION_IDLE_SECS is not a number of seconds: '{}'", idle))?;
        if idle == 0 {
            bail!("GUESTBOOK_SESSION_IDLE_SECS must be at least 1");
        }

        let store = match get("GUESTBOOK_STORE") {
            Some(kind) => kind.parse()?,
            None => StoreKind::Sqlite,
        };

        let config = Self {
            host: get("GUESTBOOK_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            store,
            db_path: get("GUESTBOOK_DB_PATH").unwrap_or_else(|| "guestbook.db".into()).into(),
            sheet_id: get("GUESTBOOK_SHEET_ID"),
            sheet_range: get("GUESTBOOK_SHEET_RANGE").unwrap_or_else(|| "Sheet1".into()),
            credentials: get("GUESTBOOK_CREDENTIALS").map(PathBuf::from),
            app_url: get("GUESTBOOK_APP_URL").unwrap_or_else(|| "http://localhost:3000/".into()),
            holiday_file: get("GUESTBOOK_HOLIDAY_FILE").map(PathBuf::from),
            session_idle: Duration::from_secs(idle),
        };

        if config.store == StoreKind::Sheets {
            if config.sheet_id.is_none() {
                bail!("GUESTBOOK_STORE=sheets needs GUESTBOOK_SHEET_ID");
            }
            if config.credentials.is_none() {
                bail!("GUESTBOOK_STORE=sheets needs GUESTBOOK_CREDENTIALS (service account key file)");
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.db_path, PathBuf::from("guestbook.db"));
        assert_eq!(config.sheet_range, "Sheet1");
        assert_eq!(config.app_url, "http://localhost:3000/");
        assert!(config.holiday_file.is_none());
        assert_eq!(config.session_idle, Duration::from_secs(3600));
    }

    #[test]
    fn session_idle_is_configurable() {
        let config = config(&[("GUESTBOOK_SESSION_IDLE_SECS", "600")]).unwrap();
        assert_eq!(config.session_idle, Duration::from_secs(600));
    }

    #[test]
    fn sheets_store_needs_id_and_credentials() {
        assert!(config(&[("GUESTBOOK_STORE", "sheets")]).is_err());
        assert!(config(&[("GUESTBOOK_STORE", "sheets"), ("GUESTBOOK_SHEET_ID", "abc")]).is_err());
        let config = config(&[
            ("GUESTBOOK_STORE", "Sheets"),
            ("GUESTBOOK_SHEET_ID", "abc"),
            ("GUESTBOOK_CREDENTIALS", "/etc/guestbook/key.json"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreKind::Sheets);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(config(&[("GUESTBOOK_PORT", "eighty")]).is_err());
        assert!(config(&[("GUESTBOOK_STORE", "postgres")]).is_err());
        assert!(config(&[("GUESTBOOK_SESSION_IDLE_SECS", "0")]).is_err());
        assert!(config(&[("GUESTBOOK_SESSION_IDLE_SECS", "soon")]).is_err());
    }
}
