use chrono::{NaiveTime, Timelike};

/// Number of measured (non-key) columns on a bar.
pub const NUMERIC_FIELDS: usize = 29;

/// `TimeBarStart` as it comes out of the store: a real time-of-day or the
/// `"HH:MM"` text some loads were written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarTime {
    Clock(NaiveTime),
    Text(String),
}

impl BarTime {
    /// Minute-resolution clock time, seconds dropped.
    pub fn minute_of_day(&self) -> Option<NaiveTime> {
        let t = match self {
            BarTime::Clock(t) => *t,
            BarTime::Text(s) => parse_clock(s.trim())?,
        };
        NaiveTime::from_hms_opt(t.hour(), t.minute(), 0)
    }
}

fn parse_clock(s: &str) -> Option<NaiveTime> {
    ["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

/// One minute bar as read from the store. Every measurement may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBarRow {
    pub ticker: String,
    pub date: Option<i64>,
    pub time_bar_start: Option<BarTime>,

    // prices
    pub first_trade_price: Option<f64>,
    pub high_trade_price: Option<f64>,
    pub low_trade_price: Option<f64>,
    pub last_trade_price: Option<f64>,
    pub volume_weight_price: Option<f64>,
    pub min_spread: Option<f64>,
    pub max_spread: Option<f64>,

    // trade classification
    pub trade_at_bid: Option<f64>,
    pub trade_at_bid_mid: Option<f64>,
    pub trade_at_mid: Option<f64>,
    pub trade_at_mid_ask: Option<f64>,
    pub trade_at_ask: Option<f64>,
    pub trade_at_cross_or_locked: Option<f64>,

    // tick test
    pub uptick_volume: Option<f64>,
    pub downtick_volume: Option<f64>,
    pub repeat_uptick_volume: Option<f64>,
    pub repeat_downtick_volume: Option<f64>,
    pub unknown_tick_volume: Option<f64>,

    // quotes
    pub open_bid_size: Option<f64>,
    pub open_ask_size: Option<f64>,
    pub close_bid_size: Option<f64>,
    pub close_ask_size: Option<f64>,
    pub nbbo_quote_count: Option<f64>,
    pub time_weight_bid: Option<f64>,
    pub time_weight_ask: Option<f64>,

    pub trade_to_mid_vol_weight: Option<f64>,
    pub trade_to_mid_vol_weight_relative: Option<f64>,

    pub volume: Option<f64>,
    pub total_trades: Option<f64>,
}

impl RawBarRow {
    pub fn numeric_fields(&self) -> [Option<f64>; NUMERIC_FIELDS] {
        [
            self.first_trade_price,
            self.high_trade_price,
            self.low_trade_price,
            self.last_trade_price,
            self.volume_weight_price,
            self.min_spread,
            self.max_spread,
            self.trade_at_bid,
            self.trade_at_bid_mid,
            self.trade_at_mid,
            self.trade_at_mid_ask,
            self.trade_at_ask,
            self.trade_at_cross_or_locked,
            self.uptick_volume,
            self.downtick_volume,
            self.repeat_uptick_volume,
            self.repeat_downtick_volume,
            self.unknown_tick_volume,
            self.open_bid_size,
            self.open_ask_size,
            self.close_bid_size,
            self.close_ask_size,
            self.nbbo_quote_count,
            self.time_weight_bid,
            self.time_weight_ask,
            self.trade_to_mid_vol_weight,
            self.trade_to_mid_vol_weight_relative,
            self.volume,
            self.total_trades,
        ]
    }

    /// Same order as [`RawBarRow::numeric_fields`].
    pub fn numeric_fields_mut(&mut self) -> [&mut Option<f64>; NUMERIC_FIELDS] {
        [
            &mut self.first_trade_price,
            &mut self.high_trade_price,
            &mut self.low_trade_price,
            &mut self.last_trade_price,
            &mut self.volume_weight_price,
            &mut self.min_spread,
            &mut self.max_spread,
            &mut self.trade_at_bid,
            &mut self.trade_at_bid_mid,
            &mut self.trade_at_mid,
            &mut self.trade_at_mid_ask,
            &mut self.trade_at_ask,
            &mut self.trade_at_cross_or_locked,
            &mut self.uptick_volume,
            &mut self.downtick_volume,
            &mut self.repeat_uptick_volume,
            &mut self.repeat_downtick_volume,
            &mut self.unknown_tick_volume,
            &mut self.open_bid_size,
            &mut self.open_ask_size,
            &mut self.close_bid_size,
            &mut self.close_ask_size,
            &mut self.nbbo_quote_count,
            &mut self.time_weight_bid,
            &mut self.time_weight_ask,
            &mut self.trade_to_mid_vol_weight,
            &mut self.trade_to_mid_vol_weight_relative,
            &mut self.volume,
            &mut self.total_trades,
        ]
    }
}

/// A gap-filled bar with its absolute start instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBar {
    pub ticker: String,
    pub date: i64,
    pub time_bar_start: NaiveTime,
    /// Unix epoch seconds.
    pub ts: i64,

    pub first_trade_price: f64,
    pub high_trade_price: f64,
    pub low_trade_price: f64,
    pub last_trade_price: f64,
    pub volume_weight_price: f64,
    pub min_spread: f64,
    pub max_spread: f64,

    pub trade_at_bid: f64,
    pub trade_at_bid_mid: f64,
    pub trade_at_mid: f64,
    pub trade_at_mid_ask: f64,
    pub trade_at_ask: f64,
    pub trade_at_cross_or_locked: f64,

    pub uptick_volume: f64,
    pub downtick_volume: f64,
    pub repeat_uptick_volume: f64,
    pub repeat_downtick_volume: f64,
    pub unknown_tick_volume: f64,

    pub open_bid_size: f64,
    pub open_ask_size: f64,
    pub close_bid_size: f64,
    pub close_ask_size: f64,
    pub nbbo_quote_count: f64,
    pub time_weight_bid: f64,
    pub time_weight_ask: f64,

    pub trade_to_mid_vol_weight: f64,
    pub trade_to_mid_vol_weight_relative: f64,

    pub volume: f64,
    pub total_trades: f64,
}

impl RawBar {
    /// Unwraps a filled row; missing measurements read as zero.
    pub(crate) fn from_filled(row: RawBarRow, date: i64, time_bar_start: NaiveTime, ts: i64) -> Self {
        let z = |v: Option<f64>| v.unwrap_or(0.0);
        Self {
            ticker: row.ticker,
            date,
            time_bar_start,
            ts,
            first_trade_price: z(row.first_trade_price),
            high_trade_price: z(row.high_trade_price),
            low_trade_price: z(row.low_trade_price),
            last_trade_price: z(row.last_trade_price),
            volume_weight_price: z(row.volume_weight_price),
            min_spread: z(row.min_spread),
            max_spread: z(row.max_spread),
            trade_at_bid: z(row.trade_at_bid),
            trade_at_bid_mid: z(row.trade_at_bid_mid),
            trade_at_mid: z(row.trade_at_mid),
            trade_at_mid_ask: z(row.trade_at_mid_ask),
            trade_at_ask: z(row.trade_at_ask),
            trade_at_cross_or_locked: z(row.trade_at_cross_or_locked),
            uptick_volume: z(row.uptick_volume),
            downtick_volume: z(row.downtick_volume),
            repeat_uptick_volume: z(row.repeat_uptick_volume),
            repeat_downtick_volume: z(row.repeat_downtick_volume),
            unknown_tick_volume: z(row.unknown_tick_volume),
            open_bid_size: z(row.open_bid_size),
            open_ask_size: z(row.open_ask_size),
            close_bid_size: z(row.close_bid_size),
            close_ask_size: z(row.close_ask_size),
            nbbo_quote_count: z(row.nbbo_quote_count),
            time_weight_bid: z(row.time_weight_bid),
            time_weight_ask: z(row.time_weight_ask),
            trade_to_mid_vol_weight: z(row.trade_to_mid_vol_weight),
            trade_to_mid_vol_weight_relative: z(row.trade_to_mid_vol_weight_relative),
            volume: z(row.volume),
            total_trades: z(row.total_trades),
        }
    }
}
