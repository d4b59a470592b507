use duckdb::Row;

use crate::db::models::{BarTime, RawBarRow};

/// Select list of the bar query. Measurements are cast to DOUBLE and the
/// bar start to VARCHAR so TIME and text storage read the same way.
/// Column order is what [`bar_from_row`] indexes.
const BAR_COLUMNS: &str = r#"
    Ticker,
    CAST(Date AS BIGINT),
    CAST(TimeBarStart AS VARCHAR),
    CAST(FirstTradePrice AS DOUBLE),
    CAST(HighTradePrice AS DOUBLE),
    CAST(LowTradePrice AS DOUBLE),
    CAST(LastTradePrice AS DOUBLE),
    CAST(VolumeWeightPrice AS DOUBLE),
    CAST(MinSpread AS DOUBLE),
    CAST(MaxSpread AS DOUBLE),
    CAST(TradeAtBid AS DOUBLE),
    CAST(TradeAtBidMid AS DOUBLE),
    CAST(TradeAtMid AS DOUBLE),
    CAST(TradeAtMidAsk AS DOUBLE),
    CAST(TradeAtAsk AS DOUBLE),
    CAST(TradeAtCrossOrLocked AS DOUBLE),
    CAST(UptickVolume AS DOUBLE),
    CAST(DowntickVolume AS DOUBLE),
    CAST(RepeatUptickVolume AS DOUBLE),
    CAST(RepeatDowntickVolume AS DOUBLE),
    CAST(UnknownTickVolume AS DOUBLE),
    CAST(OpenBidSize AS DOUBLE),
    CAST(OpenAskSize AS DOUBLE),
    CAST(CloseBidSize AS DOUBLE),
    CAST(CloseAskSize AS DOUBLE),
    CAST(NBBOQuoteCount AS DOUBLE),
    CAST(TimeWeightBid AS DOUBLE),
    CAST(TimeWeightAsk AS DOUBLE),
    CAST(TradeToMidVolWeight AS DOUBLE),
    CAST(TradeToMidVolWeightRelative AS DOUBLE),
    CAST(Volume AS DOUBLE),
    CAST(TotalTrades AS DOUBLE)
"#;

// BARS
pub fn bars_sql(table: &str, with_date: bool) -> String {
    let date_filter = if with_date { "AND Date = ?" } else { "" };
    format!(
        "SELECT {BAR_COLUMNS} FROM {table} WHERE Ticker = ? {date_filter} ORDER BY Date, TimeBarStart"
    )
}

// SYMBOL SEARCH
pub fn symbols_sql(table: &str) -> String {
    format!(
        "SELECT DISTINCT Ticker FROM {table} WHERE UPPER(Ticker) LIKE UPPER(?) ORDER BY Ticker LIMIT ?"
    )
}

// TRADING DATES
pub fn dates_sql(table: &str) -> String {
    format!(
        "SELECT DISTINCT CAST(Date AS BIGINT) AS d FROM {table} WHERE Ticker = ? AND Date IS NOT NULL ORDER BY d"
    )
}

/// Explicit column → field mapping for [`BAR_COLUMNS`].
pub fn bar_from_row(row: &Row<'_>) -> duckdb::Result<RawBarRow> {
    let num = |i: usize| -> duckdb::Result<Option<f64>> {
        Ok(row.get::<_, Option<f64>>(i)?.filter(|v| !v.is_nan()))
    };

    Ok(RawBarRow {
        ticker: row.get(0)?,
        date: row.get(1)?,
        time_bar_start: row.get::<_, Option<String>>(2)?.map(BarTime::Text),

        first_trade_price: num(3)?,
        high_trade_price: num(4)?,
        low_trade_price: num(5)?,
        last_trade_price: num(6)?,
        volume_weight_price: num(7)?,
        min_spread: num(8)?,
        max_spread: num(9)?,

        trade_at_bid: num(10)?,
        trade_at_bid_mid: num(11)?,
        trade_at_mid: num(12)?,
        trade_at_mid_ask: num(13)?,
        trade_at_ask: num(14)?,
        trade_at_cross_or_locked: num(15)?,

        uptick_volume: num(16)?,
        downtick_volume: num(17)?,
        repeat_uptick_volume: num(18)?,
        repeat_downtick_volume: num(19)?,
        unknown_tick_volume: num(20)?,

        open_bid_size: num(21)?,
        open_ask_size: num(22)?,
        close_bid_size: num(23)?,
        close_ask_size: num(24)?,
        nbbo_quote_count: num(25)?,
        time_weight_bid: num(26)?,
        time_weight_ask: num(27)?,

        trade_to_mid_vol_weight: num(28)?,
        trade_to_mid_vol_weight_relative: num(29)?,

        volume: num(30)?,
        total_trades: num(31)?,
    })
}
