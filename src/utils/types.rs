use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(msg.into()),
            data: None,
        }
    }
}

/// Status marker `s` of every chart payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartStatus {
    Ok,
    NoData,
    Error,
}

/// Column-oriented chart payload: `t` plus one array per column of `C`,
/// all index-aligned.
#[derive(Debug, Serialize)]
pub struct ChartResponse<C> {
    pub s: ChartStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set when the arrays are the placeholder sample, not real data.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<Vec<i64>>,
    #[serde(flatten)]
    pub columns: Option<C>,
}

impl<C> ChartResponse<C> {
    pub fn ok(t: Vec<i64>, columns: C) -> Self {
        Self {
            s: ChartStatus::Ok,
            message: None,
            degraded: false,
            t: Some(t),
            columns: Some(columns),
        }
    }

    pub fn degraded(t: Vec<i64>, columns: C, cause: impl Into<String>) -> Self {
        Self {
            message: Some(cause.into()),
            degraded: true,
            ..Self::ok(t, columns)
        }
    }

    pub fn no_data() -> Self {
        Self {
            s: ChartStatus::NoData,
            message: None,
            degraded: false,
            t: None,
            columns: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            s: ChartStatus::Error,
            message: Some(msg.into()),
            ..Self::no_data()
        }
    }
}
