//! Fixed placeholder session served when the store or the pipeline fails
//! and the service runs with `DEGRADED_MODE=sample`.

use once_cell::sync::Lazy;

use crate::db::models::{BarTime, RawBarRow};

pub const SAMPLE_TICKER: &str = "SAMPLE";
pub const SAMPLE_DATE: i64 = 20200128;
const SAMPLE_BARS: usize = 30;

static SAMPLE_ROWS: Lazy<Vec<RawBarRow>> = Lazy::new(build);

/// Thirty one-minute bars from 09:30, deterministic.
pub fn sample_rows() -> Vec<RawBarRow> {
    SAMPLE_ROWS.clone()
}

fn build() -> Vec<RawBarRow> {
    (0..SAMPLE_BARS)
        .map(|i| {
            let k = i as f64;
            let wave = ((i % 7) as f64 - 3.0) * 0.04;
            let last = 317.50 + k * 0.02 + wave;
            let minute = 30 + i;
            RawBarRow {
                ticker: SAMPLE_TICKER.into(),
                date: Some(SAMPLE_DATE),
                time_bar_start: Some(BarTime::Text(format!("{:02}:{:02}", 9 + minute / 60, minute % 60))),

                first_trade_price: Some(last - 0.03),
                high_trade_price: Some(last + 0.06),
                low_trade_price: Some(last - 0.07),
                last_trade_price: Some(last),
                volume_weight_price: Some(last - 0.01),
                min_spread: Some(0.01),
                max_spread: Some(0.02 + (i % 3) as f64 * 0.01),

                trade_at_bid: Some(1_200.0 + ((i * 37) % 400) as f64),
                trade_at_bid_mid: Some(300.0 + ((i * 11) % 90) as f64),
                trade_at_mid: Some(150.0),
                trade_at_mid_ask: Some(320.0 + ((i * 13) % 80) as f64),
                trade_at_ask: Some(1_250.0 + ((i * 53) % 450) as f64),
                trade_at_cross_or_locked: Some(10.0),

                uptick_volume: Some(900.0 + ((i * 29) % 300) as f64),
                downtick_volume: Some(880.0 + ((i * 31) % 320) as f64),
                repeat_uptick_volume: Some(400.0 + ((i * 7) % 60) as f64),
                repeat_downtick_volume: Some(410.0 + ((i * 5) % 70) as f64),
                unknown_tick_volume: Some(0.0),

                open_bid_size: Some(300.0 + ((i * 17) % 200) as f64),
                open_ask_size: Some(280.0 + ((i * 19) % 210) as f64),
                close_bid_size: Some(310.0 + ((i * 23) % 190) as f64),
                close_ask_size: Some(290.0 + ((i * 3) % 220) as f64),
                nbbo_quote_count: Some(600.0 + ((i * 41) % 150) as f64),
                time_weight_bid: Some(last - 0.01),
                time_weight_ask: Some(last + 0.01),

                trade_to_mid_vol_weight: Some(wave / 4.0),
                trade_to_mid_vol_weight_relative: Some(wave * 2.5),

                volume: Some(4_000.0 + ((i * 97) % 1_500) as f64),
                total_trades: Some(45.0 + ((i * 3) % 20) as f64),
            }
        })
        .collect()
}
