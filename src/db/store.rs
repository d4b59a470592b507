// src/db/store.rs

use std::sync::Mutex;

use duckdb::{params, AccessMode, Config, Connection};

use crate::config::settings::{DataSource, Settings};
use crate::db::models::RawBarRow;
use crate::db::queries;
use crate::utils::errors::StoreError;

/// Upper bound on `/api/symbols` matches.
pub const SYMBOL_SEARCH_LIMIT: usize = 20;

/// Which bars a request wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarQuery {
    pub ticker: String,
    pub date: Option<i64>,
}

impl BarQuery {
    pub fn new(symbol: &str, date: Option<i64>) -> Self {
        Self {
            ticker: symbol.trim().to_uppercase(),
            date,
        }
    }
}

/// Read side of the bar store. Calls block; routes run them on the
/// blocking pool.
pub trait BarSource: Send + Sync {
    /// Bars sorted by (date, time_bar_start); never re-sorted downstream.
    fn fetch_bars(&self, query: &BarQuery) -> Result<Vec<RawBarRow>, StoreError>;

    fn search_symbols(&self, fragment: &str, limit: usize) -> Result<Vec<String>, StoreError>;

    fn trading_dates(&self, ticker: &str) -> Result<Vec<i64>, StoreError>;
}

/// DuckDB-backed store. Each call gets its own connection cloned from the
/// root, so requests never share a statement.
pub struct DuckStore {
    root: Mutex<Connection>,
    table: String,
}

impl DuckStore {
    pub fn open(settings: &Settings) -> Result<Self, StoreError> {
        let conn = match &settings.data_source {
            DataSource::LocalFile(path) => {
                if !path.exists() {
                    return Err(StoreError::Unavailable(format!(
                        "database file {} not found",
                        path.display()
                    )));
                }
                let cfg = Config::default().access_mode(AccessMode::ReadOnly)?;
                Connection::open_with_flags(path, cfg)?
            }
            DataSource::MotherDuck { database } => Connection::open(format!("md:{database}"))?,
        };
        log::info!("bar store opened: {:?} table={}", settings.data_source, settings.bar_table);
        Ok(Self::with_connection(conn, &settings.bar_table))
    }

    /// Wrap an already-open connection (in-memory databases in tests).
    pub fn with_connection(conn: Connection, table: &str) -> Self {
        Self {
            root: Mutex::new(conn),
            table: table.to_string(),
        }
    }

    fn session(&self) -> Result<Connection, StoreError> {
        let root = self.root.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(root.try_clone()?)
    }
}

impl BarSource for DuckStore {
    fn fetch_bars(&self, query: &BarQuery) -> Result<Vec<RawBarRow>, StoreError> {
        let conn = self.session()?;
        let mut stmt = conn.prepare(&queries::bars_sql(&self.table, query.date.is_some()))?;

        let rows = match query.date {
            Some(date) => stmt
                .query_map(params![query.ticker, date], queries::bar_from_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map(params![query.ticker], queries::bar_from_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        log::debug!("fetched {} bars for {} date={:?}", rows.len(), query.ticker, query.date);
        Ok(rows)
    }

    fn search_symbols(&self, fragment: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let conn = self.session()?;
        let mut stmt = conn.prepare(&queries::symbols_sql(&self.table))?;
        let pattern = format!("%{}%", fragment.trim());
        let tickers = stmt
            .query_map(params![pattern, limit as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tickers)
    }

    fn trading_dates(&self, ticker: &str) -> Result<Vec<i64>, StoreError> {
        let conn = self.session()?;
        let mut stmt = conn.prepare(&queries::dates_sql(&self.table))?;
        let dates = stmt
            .query_map(params![ticker.trim().to_uppercase()], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dates)
    }
}

/// Stand-in when the store could not be opened at start-up; every call
/// reports why opening failed, so chart routes degrade.
pub struct UnavailableSource {
    reason: String,
}

impl UnavailableSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> Result<T, StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}

impl BarSource for UnavailableSource {
    fn fetch_bars(&self, _: &BarQuery) -> Result<Vec<RawBarRow>, StoreError> {
        self.fail()
    }

    fn search_symbols(&self, _: &str, _: usize) -> Result<Vec<String>, StoreError> {
        self.fail()
    }

    fn trading_dates(&self, _: &str) -> Result<Vec<i64>, StoreError> {
        self.fail()
    }
}
