//! Gap handling and timestamp normalisation shared by every chart view.
//!
//! Order is fixed: forward-fill, then zero-fill. Rows are never dropped or
//! interpolated. NaN counts as missing.

use chrono::{Local, NaiveDate, NaiveTime, TimeZone};

use crate::db::models::{BarTime, RawBar, RawBarRow};
use crate::utils::errors::PipelineError;

/// Which clock a bar's naive `date + time_bar_start` is read on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarClock {
    /// The server's zone.
    Local,
    Utc,
}

fn is_missing(v: Option<f64>) -> bool {
    v.map_or(true, f64::is_nan)
}

/// Forward-fill every field, then zero-fill the measurements still missing.
/// Keys (`date`, `time_bar_start`) are carried forward but never invented.
pub fn gap_fill(mut rows: Vec<RawBarRow>) -> Vec<RawBarRow> {
    for i in 1..rows.len() {
        let (done, rest) = rows.split_at_mut(i);
        let prev = &done[i - 1];
        let cur = &mut rest[0];

        if cur.date.is_none() {
            cur.date = prev.date;
        }
        if cur.time_bar_start.is_none() {
            cur.time_bar_start = prev.time_bar_start.clone();
        }
        for (slot, earlier) in cur.numeric_fields_mut().into_iter().zip(prev.numeric_fields()) {
            if is_missing(*slot) && !is_missing(earlier) {
                *slot = earlier;
            }
        }
    }

    for row in &mut rows {
        for slot in row.numeric_fields_mut() {
            if is_missing(*slot) {
                *slot = Some(0.0);
            }
        }
    }
    rows
}

/// `YYYYMMDD` + minute of day → Unix seconds on `clock`.
pub fn epoch_seconds(date: i64, time: NaiveTime, clock: BarClock, row: usize) -> Result<i64, PipelineError> {
    let day = calendar_day(date).ok_or(PipelineError::BadDate { row, date })?;
    let naive = day.and_time(time);
    match clock {
        BarClock::Utc => Ok(naive.and_utc().timestamp()),
        BarClock::Local => Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp())
            .ok_or_else(|| PipelineError::SkippedLocalTime {
                row,
                date,
                time: time.format("%H:%M").to_string(),
            }),
    }
}

fn calendar_day(date: i64) -> Option<NaiveDate> {
    if !(10_000_101..=99_991_231).contains(&date) {
        return None;
    }
    let year = (date / 10_000) as i32;
    let month = ((date % 10_000) / 100) as u32;
    let day = (date % 100) as u32;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Turn filled rows into bars. Fails on the first row whose keys are absent
/// or unreadable.
pub fn normalize(rows: Vec<RawBarRow>, clock: BarClock) -> Result<Vec<RawBar>, PipelineError> {
    rows.into_iter()
        .enumerate()
        .map(|(row, r)| {
            let date = r.date.ok_or(PipelineError::MissingKey { row, field: "date" })?;
            let raw_time = r
                .time_bar_start
                .as_ref()
                .ok_or(PipelineError::MissingKey { row, field: "time_bar_start" })?;
            let time = raw_time.minute_of_day().ok_or_else(|| PipelineError::BadClock {
                row,
                raw: match raw_time {
                    BarTime::Text(s) => s.clone(),
                    BarTime::Clock(t) => t.to_string(),
                },
            })?;
            let ts = epoch_seconds(date, time, clock, row)?;
            Ok(RawBar::from_filled(r, date, time, ts))
        })
        .collect()
}

/// The one entry point the views use.
pub fn prepare(rows: Vec<RawBarRow>, clock: BarClock) -> Result<Vec<RawBar>, PipelineError> {
    normalize(gap_fill(rows), clock)
}
