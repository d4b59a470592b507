//! Column assemblers behind the chart routes.
//!
//! Every view goes through [`gap_fill::prepare`] and differs only in which
//! columns it lifts out of the bars.

use serde::Serialize;

use crate::db::models::{RawBar, RawBarRow};
use crate::services::gap_fill::{self, BarClock};
use crate::services::signals::{derive_flow_delta, derive_signals, CumulativeReset};
use crate::utils::errors::PipelineError;

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewOptions {
    pub reset: CumulativeReset,
}

/// A chart that can be built from a gap-filled bar sequence.
pub trait ChartView {
    /// Route segment and metrics label.
    const NAME: &'static str;
    type Columns: Serialize + Send + 'static;

    fn columns(bars: &[RawBar], opts: &ViewOptions) -> Self::Columns;
}

/// `t` plus the view's columns, all the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart<C> {
    pub t: Vec<i64>,
    pub columns: C,
}

/// Rows in, chart out. `Ok(None)` means there were no rows.
pub fn render<V: ChartView>(
    rows: Vec<RawBarRow>,
    clock: BarClock,
    opts: &ViewOptions,
) -> Result<Option<Chart<V::Columns>>, PipelineError> {
    if rows.is_empty() {
        return Ok(None);
    }
    let bars = gap_fill::prepare(rows, clock)?;
    Ok(Some(Chart {
        t: bars.iter().map(|b| b.ts).collect(),
        columns: V::columns(&bars, opts),
    }))
}

fn col(bars: &[RawBar], f: impl Fn(&RawBar) -> f64) -> Vec<f64> {
    bars.iter().map(f).collect()
}

// ─── OHLCV ───────────────────────────────────────────────────────────────

pub struct History;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcColumns {
    pub o: Vec<f64>,
    pub h: Vec<f64>,
    pub l: Vec<f64>,
    pub c: Vec<f64>,
    pub v: Vec<f64>,
}

impl ChartView for History {
    const NAME: &'static str = "history";
    type Columns = OhlcColumns;

    fn columns(bars: &[RawBar], _: &ViewOptions) -> OhlcColumns {
        OhlcColumns {
            o: col(bars, |b| b.first_trade_price),
            h: col(bars, |b| b.high_trade_price),
            l: col(bars, |b| b.low_trade_price),
            c: col(bars, |b| b.last_trade_price),
            v: col(bars, |b| b.volume),
        }
    }
}

// ─── Spread ──────────────────────────────────────────────────────────────

pub struct Spread;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadColumns {
    pub min_spread: Vec<f64>,
    pub max_spread: Vec<f64>,
}

impl ChartView for Spread {
    const NAME: &'static str = "spread";
    type Columns = SpreadColumns;

    fn columns(bars: &[RawBar], _: &ViewOptions) -> SpreadColumns {
        SpreadColumns {
            min_spread: col(bars, |b| b.min_spread),
            max_spread: col(bars, |b| b.max_spread),
        }
    }
}

// ─── VWAP overlay ────────────────────────────────────────────────────────

pub struct Indicators;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorColumns {
    pub vwap: Vec<f64>,
    pub trade_at_bid: Vec<f64>,
    pub trade_at_ask: Vec<f64>,
    pub total_trades: Vec<f64>,
}

impl ChartView for Indicators {
    const NAME: &'static str = "indicators";
    type Columns = IndicatorColumns;

    fn columns(bars: &[RawBar], _: &ViewOptions) -> IndicatorColumns {
        IndicatorColumns {
            vwap: col(bars, |b| b.volume_weight_price),
            trade_at_bid: col(bars, |b| b.trade_at_bid),
            trade_at_ask: col(bars, |b| b.trade_at_ask),
            total_trades: col(bars, |b| b.total_trades),
        }
    }
}

// ─── Volume / tick test ──────────────────────────────────────────────────

pub struct Volume;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeColumns {
    pub volume: Vec<f64>,
    pub total_trades: Vec<f64>,
    pub uptick_volume: Vec<f64>,
    pub downtick_volume: Vec<f64>,
    pub repeat_uptick: Vec<f64>,
    pub repeat_downtick: Vec<f64>,
    pub unknown_tick: Vec<f64>,
}

impl ChartView for Volume {
    const NAME: &'static str = "volume";
    type Columns = VolumeColumns;

    fn columns(bars: &[RawBar], _: &ViewOptions) -> VolumeColumns {
        VolumeColumns {
            volume: col(bars, |b| b.volume),
            total_trades: col(bars, |b| b.total_trades),
            uptick_volume: col(bars, |b| b.uptick_volume),
            downtick_volume: col(bars, |b| b.downtick_volume),
            repeat_uptick: col(bars, |b| b.repeat_uptick_volume),
            repeat_downtick: col(bars, |b| b.repeat_downtick_volume),
            unknown_tick: col(bars, |b| b.unknown_tick_volume),
        }
    }
}

// ─── Quote liquidity ─────────────────────────────────────────────────────

pub struct Liquidity;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidityColumns {
    pub open_bid_size: Vec<f64>,
    pub open_ask_size: Vec<f64>,
    pub close_bid_size: Vec<f64>,
    pub close_ask_size: Vec<f64>,
    pub nbbo_quote_count: Vec<f64>,
    pub time_weight_bid: Vec<f64>,
    pub time_weight_ask: Vec<f64>,
}

impl ChartView for Liquidity {
    const NAME: &'static str = "liquidity";
    type Columns = LiquidityColumns;

    fn columns(bars: &[RawBar], _: &ViewOptions) -> LiquidityColumns {
        LiquidityColumns {
            open_bid_size: col(bars, |b| b.open_bid_size),
            open_ask_size: col(bars, |b| b.open_ask_size),
            close_bid_size: col(bars, |b| b.close_bid_size),
            close_ask_size: col(bars, |b| b.close_ask_size),
            nbbo_quote_count: col(bars, |b| b.nbbo_quote_count),
            time_weight_bid: col(bars, |b| b.time_weight_bid),
            time_weight_ask: col(bars, |b| b.time_weight_ask),
        }
    }
}

// ─── Trade classification ────────────────────────────────────────────────

pub struct Flow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowColumns {
    pub trade_at_bid: Vec<f64>,
    pub trade_at_bid_mid: Vec<f64>,
    pub trade_at_mid: Vec<f64>,
    pub trade_at_mid_ask: Vec<f64>,
    pub trade_at_ask: Vec<f64>,
    pub trade_at_cross: Vec<f64>,
    pub trade_to_mid_weight: Vec<f64>,
    pub trade_to_mid_relative: Vec<f64>,
}

impl ChartView for Flow {
    const NAME: &'static str = "flow";
    type Columns = FlowColumns;

    fn columns(bars: &[RawBar], _: &ViewOptions) -> FlowColumns {
        FlowColumns {
            trade_at_bid: col(bars, |b| b.trade_at_bid),
            trade_at_bid_mid: col(bars, |b| b.trade_at_bid_mid),
            trade_at_mid: col(bars, |b| b.trade_at_mid),
            trade_at_mid_ask: col(bars, |b| b.trade_at_mid_ask),
            trade_at_ask: col(bars, |b| b.trade_at_ask),
            trade_at_cross: col(bars, |b| b.trade_at_cross_or_locked),
            trade_to_mid_weight: col(bars, |b| b.trade_to_mid_vol_weight),
            trade_to_mid_relative: col(bars, |b| b.trade_to_mid_vol_weight_relative),
        }
    }
}

// ─── Derived signals ─────────────────────────────────────────────────────

pub struct Signals;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalColumns {
    pub delta_score: Vec<f64>,
    pub tick_score: Vec<f64>,
    pub book_score: Vec<f64>,
    pub mid_score: Vec<f64>,
    pub combined_signal: Vec<f64>,
    pub cumulative_signal: Vec<f64>,
    pub signal_strength: Vec<f64>,
    pub momentum: Vec<f64>,
}

impl ChartView for Signals {
    const NAME: &'static str = "signals";
    type Columns = SignalColumns;

    fn columns(bars: &[RawBar], opts: &ViewOptions) -> SignalColumns {
        let mut out = SignalColumns::default();
        for r in derive_signals(bars, opts.reset) {
            out.delta_score.push(r.delta_score);
            out.tick_score.push(r.tick_score);
            out.book_score.push(r.book_score);
            out.mid_score.push(r.mid_score);
            out.combined_signal.push(r.combined_signal);
            out.cumulative_signal.push(r.cumulative_signal);
            out.signal_strength.push(r.signal_strength);
            out.momentum.push(r.momentum);
        }
        out
    }
}

// ─── Delta / accumulation ────────────────────────────────────────────────

pub struct Delta;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeltaColumns {
    pub delta: Vec<f64>,
    pub cumulative_delta: Vec<f64>,
    pub tick_delta: Vec<f64>,
    pub cumulative_tick_delta: Vec<f64>,
    pub accumulation_volume: Vec<f64>,
    pub distribution_volume: Vec<f64>,
}

impl ChartView for Delta {
    const NAME: &'static str = "delta";
    type Columns = DeltaColumns;

    fn columns(bars: &[RawBar], opts: &ViewOptions) -> DeltaColumns {
        let mut out = DeltaColumns::default();
        for r in derive_flow_delta(bars, opts.reset) {
            out.delta.push(r.delta);
            out.cumulative_delta.push(r.cumulative_delta);
            out.tick_delta.push(r.tick_delta);
            out.cumulative_tick_delta.push(r.cumulative_tick_delta);
            out.accumulation_volume.push(r.accumulation_volume);
            out.distribution_volume.push(r.distribution_volume);
        }
        out
    }
}
