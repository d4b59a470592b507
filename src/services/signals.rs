//! Order-flow signal derivation.
//!
//! Per bar, four sub-scores in [-100, 100]:
//! * delta – aggressive buy vs sell volume (ask side vs bid side)
//! * tick  – uptick vs downtick volume, repeats included
//! * book  – average resting bid vs ask size
//! * mid   – relative volume-weighted distance of trades from the mid
//!
//! then a fixed-weight blend, a running sum over the requested bars and the
//! bar-to-bar change of that sum.

use serde::Deserialize;

use crate::db::models::RawBar;

pub const SCORE_LIMIT: f64 = 100.0;

pub const DELTA_WEIGHT: f64 = 0.40;
pub const TICK_WEIGHT: f64 = 0.25;
pub const BOOK_WEIGHT: f64 = 0.20;
pub const MID_WEIGHT: f64 = 0.15;

/// Where running sums restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CumulativeReset {
    /// One sum over the whole requested range.
    #[default]
    Continuous,
    /// Restart at the first bar of every trading date.
    Daily,
}

/// `n / d`, or 0 when `d == 0`. Volumes and sizes are non-negative, so a
/// zero denominator always comes with a zero numerator and this agrees with
/// dividing by 1 instead.
#[inline]
pub fn safe_div(n: f64, d: f64) -> f64 {
    if d == 0.0 {
        0.0
    } else {
        n / d
    }
}

/// Clamp to [-100, 100]; NaN reads as 0.
#[inline]
pub fn clip(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(-SCORE_LIMIT, SCORE_LIMIT)
    }
}

/// Volumes on each side of the book for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSides {
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub uptick_total: f64,
    pub downtick_total: f64,
}

impl FlowSides {
    pub fn of(bar: &RawBar) -> Self {
        Self {
            buy_volume: bar.trade_at_ask + bar.trade_at_mid_ask,
            sell_volume: bar.trade_at_bid + bar.trade_at_bid_mid,
            uptick_total: bar.uptick_volume + bar.repeat_uptick_volume,
            downtick_total: bar.downtick_volume + bar.repeat_downtick_volume,
        }
    }

    pub fn delta(&self) -> f64 {
        self.buy_volume - self.sell_volume
    }

    pub fn tick_delta(&self) -> f64 {
        self.uptick_total - self.downtick_total
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarScores {
    pub delta_score: f64,
    pub tick_score: f64,
    pub book_score: f64,
    pub mid_score: f64,
    pub combined_signal: f64,
}

pub fn score_bar(bar: &RawBar) -> BarScores {
    let sides = FlowSides::of(bar);

    let total_volume = sides.buy_volume + sides.sell_volume;
    let delta_score = clip(100.0 * safe_div(sides.delta(), total_volume));

    let total_tick = sides.uptick_total + sides.downtick_total;
    let tick_score = clip(100.0 * safe_div(sides.tick_delta(), total_tick));

    let bid_size_avg = (bar.open_bid_size + bar.close_bid_size) / 2.0;
    let ask_size_avg = (bar.open_ask_size + bar.close_ask_size) / 2.0;
    let total_size = bid_size_avg + ask_size_avg;
    let book_score = clip(100.0 * safe_div(bid_size_avg - ask_size_avg, total_size));

    let mid_score = clip(100.0 * bar.trade_to_mid_vol_weight_relative);

    BarScores {
        delta_score,
        tick_score,
        book_score,
        mid_score,
        combined_signal: combine(delta_score, tick_score, book_score, mid_score),
    }
}

pub fn combine(delta: f64, tick: f64, book: f64, mid: f64) -> f64 {
    clip(DELTA_WEIGHT * delta + TICK_WEIGHT * tick + BOOK_WEIGHT * book + MID_WEIGHT * mid)
}

/// One step of a running sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Running {
    pub cumulative: f64,
    /// `cumulative[i] - cumulative[i-1]`; 0 on the first bar of a segment.
    pub momentum: f64,
}

/// Left-to-right running sum of `values`, restarting wherever
/// `restarts(i)` is true (index 0 always starts a segment).
pub fn running_totals<F>(values: &[f64], restarts: F) -> Vec<Running>
where
    F: Fn(usize) -> bool,
{
    let mut out = Vec::with_capacity(values.len());
    let mut cumulative = 0.0;
    let mut prev: Option<f64> = None;

    for (i, &v) in values.iter().enumerate() {
        if i == 0 || restarts(i) {
            cumulative = 0.0;
            prev = None;
        }
        cumulative += v;
        let momentum = prev.map_or(0.0, |p| cumulative - p);
        prev = Some(cumulative);
        out.push(Running { cumulative, momentum });
    }
    out
}

/// True where `bars[i]` opens a new running-sum segment under `reset`.
pub fn segment_starts(bars: &[RawBar], reset: CumulativeReset) -> impl Fn(usize) -> bool + '_ {
    move |i| match reset {
        CumulativeReset::Continuous => i == 0,
        CumulativeReset::Daily => i == 0 || bars[i].date != bars[i - 1].date,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedSignalRow {
    pub delta_score: f64,
    pub tick_score: f64,
    pub book_score: f64,
    pub mid_score: f64,
    pub combined_signal: f64,
    pub cumulative_signal: f64,
    pub signal_strength: f64,
    pub momentum: f64,
}

pub fn derive_signals(bars: &[RawBar], reset: CumulativeReset) -> Vec<DerivedSignalRow> {
    let scores: Vec<BarScores> = bars.iter().map(score_bar).collect();
    let combined: Vec<f64> = scores.iter().map(|s| s.combined_signal).collect();
    let running = running_totals(&combined, segment_starts(bars, reset));

    scores
        .iter()
        .zip(running)
        .map(|(s, r)| DerivedSignalRow {
            delta_score: s.delta_score,
            tick_score: s.tick_score,
            book_score: s.book_score,
            mid_score: s.mid_score,
            combined_signal: s.combined_signal,
            cumulative_signal: r.cumulative,
            signal_strength: s.combined_signal.abs(),
            momentum: r.momentum,
        })
        .collect()
}

/// Raw-unit flow deltas and their running sums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowDeltaRow {
    pub delta: f64,
    pub cumulative_delta: f64,
    pub tick_delta: f64,
    pub cumulative_tick_delta: f64,
    /// Bar volume when upticks beat downticks, else 0.
    pub accumulation_volume: f64,
    /// Bar volume when downticks beat upticks, else 0.
    pub distribution_volume: f64,
}

pub fn derive_flow_delta(bars: &[RawBar], reset: CumulativeReset) -> Vec<FlowDeltaRow> {
    let sides: Vec<FlowSides> = bars.iter().map(FlowSides::of).collect();
    let deltas: Vec<f64> = sides.iter().map(FlowSides::delta).collect();
    let tick_deltas: Vec<f64> = sides.iter().map(FlowSides::tick_delta).collect();
    let cum_delta = running_totals(&deltas, segment_starts(bars, reset));
    let cum_tick = running_totals(&tick_deltas, segment_starts(bars, reset));

    bars.iter()
        .enumerate()
        .map(|(i, bar)| FlowDeltaRow {
            delta: deltas[i],
            cumulative_delta: cum_delta[i].cumulative,
            tick_delta: tick_deltas[i],
            cumulative_tick_delta: cum_tick[i].cumulative,
            accumulation_volume: if bar.uptick_volume > bar.downtick_volume { bar.volume } else { 0.0 },
            distribution_volume: if bar.uptick_volume < bar.downtick_volume { bar.volume } else { 0.0 },
        })
        .collect()
}
