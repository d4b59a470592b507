use dotenv::dotenv;
use std::env;
use std::path::{Path, PathBuf};

use crate::services::gap_fill::BarClock;

/// Candidate locations probed when `DATABASE_PATH` does not exist.
const FALLBACK_DB_PATHS: &[&str] = &["./taq_data.duckdb", "taq_data.duckdb", "../taq_data.duckdb"];

/// Where the bar table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    LocalFile(PathBuf),
    /// Cloud-hosted DuckDB; the extension reads `motherduck_token` itself.
    MotherDuck { database: String },
}

/// What a chart route answers when the store or the pipeline fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedMode {
    /// Serve the fixed sample dataset tagged `degraded: true`.
    SampleFallback,
    /// Serve `{"s":"error","message":..}`.
    ErrorStatus,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub server_port: u16,
    pub data_source: DataSource,
    pub bar_table: String,
    pub bar_clock: BarClock,
    pub degraded_mode: DegradedMode,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv().ok(); // loads `.env` file automatically
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key/value source (the process env in prod).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let server_port = get("SERVER_PORT")
            .or_else(|| get("PORT"))
            .unwrap_or_else(|| "8000".into())
            .parse::<u16>()
            .map_err(|_| "SERVER_PORT must be a valid u16")?;

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".into());

        let use_motherduck = get("USE_MOTHERDUCK")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let data_source = if use_motherduck {
            DataSource::MotherDuck {
                database: get("DATABASE_NAME").unwrap_or_else(|| "marketflow".into()),
            }
        } else {
            let configured = get("DATABASE_PATH").unwrap_or_else(|| "../taq_data.duckdb".into());
            DataSource::LocalFile(resolve_db_path(Path::new(&configured)))
        };

        let bar_table = get("TAQ_TABLE").unwrap_or_else(|| "taq_1min".into());
        if !is_valid_table_name(&bar_table) {
            return Err(format!("TAQ_TABLE '{bar_table}' is not a plain table name").into());
        }

        let bar_clock = match get("BAR_CLOCK").map(|v| v.to_lowercase()).as_deref() {
            None | Some("local") => BarClock::Local,
            Some("utc") => BarClock::Utc,
            Some(other) => return Err(format!("BAR_CLOCK must be 'local' or 'utc', got '{other}'").into()),
        };

        let degraded_mode = match get("DEGRADED_MODE").map(|v| v.to_lowercase()).as_deref() {
            None | Some("sample") => DegradedMode::SampleFallback,
            Some("error") => DegradedMode::ErrorStatus,
            Some(other) => {
                return Err(format!("DEGRADED_MODE must be 'sample' or 'error', got '{other}'").into())
            }
        };

        Ok(Self {
            bind_addr,
            server_port,
            data_source,
            bar_table,
            bar_clock,
            degraded_mode,
        })
    }

    pub fn serves_sample_on_failure(&self) -> bool {
        self.degraded_mode == DegradedMode::SampleFallback
    }
}

fn resolve_db_path(configured: &Path) -> PathBuf {
    if configured.exists() {
        return configured.to_path_buf();
    }
    FALLBACK_DB_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .unwrap_or_else(|| configured.to_path_buf())
}

/// The table name is spliced into SQL, so only identifiers are accepted.
fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, Box<dyn std::error::Error>> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_on_empty_env() {
        let s = settings_from(&[]).unwrap();
        assert_eq!(s.server_port, 8000);
        assert_eq!(s.bind_addr, "0.0.0.0");
        assert_eq!(s.bar_table, "taq_1min");
        assert_eq!(s.bar_clock, BarClock::Local);
        assert!(s.serves_sample_on_failure());
        assert!(matches!(s.data_source, DataSource::LocalFile(_)));
    }

    #[test]
    fn port_falls_back_to_platform_var() {
        let s = settings_from(&[("PORT", "9100")]).unwrap();
        assert_eq!(s.server_port, 9100);

        let s = settings_from(&[("PORT", "9100"), ("SERVER_PORT", "9200")]).unwrap();
        assert_eq!(s.server_port, 9200);
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(settings_from(&[("SERVER_PORT", "eighty")]).is_err());
    }

    #[test]
    fn motherduck_uses_database_name() {
        let s = settings_from(&[("USE_MOTHERDUCK", "true"), ("DATABASE_NAME", "flowdb")]).unwrap();
        assert_eq!(
            s.data_source,
            DataSource::MotherDuck {
                database: "flowdb".into()
            }
        );
    }

    #[test]
    fn missing_local_file_keeps_configured_path() {
        let s = settings_from(&[("DATABASE_PATH", "/nowhere/bars.duckdb")]).unwrap();
        // none of the fallbacks exist in the test sandbox either
        if let DataSource::LocalFile(p) = s.data_source {
            assert!(p.ends_with("bars.duckdb") || p.ends_with("taq_data.duckdb"));
        } else {
            panic!("expected a local file source");
        }
    }

    #[test]
    fn table_name_must_be_identifier() {
        assert!(settings_from(&[("TAQ_TABLE", "taq_1min; DROP TABLE x")]).is_err());
        let s = settings_from(&[("TAQ_TABLE", "main.taq_1min")]).unwrap();
        assert_eq!(s.bar_table, "main.taq_1min");
    }

    #[test]
    fn clock_and_degraded_mode_parse() {
        let s = settings_from(&[("BAR_CLOCK", "UTC"), ("DEGRADED_MODE", "error")]).unwrap();
        assert_eq!(s.bar_clock, BarClock::Utc);
        assert_eq!(s.degraded_mode, DegradedMode::ErrorStatus);
        assert!(!s.serves_sample_on_failure());

        assert!(settings_from(&[("BAR_CLOCK", "exchange")]).is_err());
        assert!(settings_from(&[("DEGRADED_MODE", "silent")]).is_err());
    }
}
