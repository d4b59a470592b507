// src/utils/errors.rs

/// Failures reaching or reading the bar store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("duckdb: {0}")]
    Duck(#[from] duckdb::Error),
    #[error("bar source unavailable: {0}")]
    Unavailable(String),
    #[error("store connection lock poisoned")]
    Poisoned,
    #[error("blocking pool: {0}")]
    Blocking(String),
}

/// Rows the derivation pipeline cannot turn into bars.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("row {row}: {field} missing with no earlier value to carry forward")]
    MissingKey { row: usize, field: &'static str },
    #[error("row {row}: {date} is not a valid YYYYMMDD date")]
    BadDate { row: usize, date: i64 },
    #[error("row {row}: cannot read time-of-day '{raw}'")]
    BadClock { row: usize, raw: String },
    #[error("row {row}: {date} {time} does not exist on the local clock")]
    SkippedLocalTime { row: usize, date: i64, time: String },
}

/// Everything that can go wrong behind a chart route.
#[derive(thiserror::Error, Debug)]
pub enum ChartError {
    #[error("source unavailable: {0}")]
    Source(#[from] StoreError),
    #[error("transform failed: {0}")]
    Transform(#[from] PipelineError),
}

impl ChartError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ChartError::Source(_) => "source",
            ChartError::Transform(_) => "transform",
        }
    }
}
