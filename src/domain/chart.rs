//! Daily close-price series for the token detail chart

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// One point of the line chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// UTC date, `YYYY-MM-DD`
    pub time: String,
    /// Close price
    pub value: f64,
}

/// Build a chart series from OHLCV rows `[timestamp, open, high, low, close, volume]`.
///
/// Rows are keyed by UTC date; a later row for the same date replaces an
/// earlier one. The result is in ascending date order. Malformed rows are
/// skipped.
pub fn ohlcv_to_chart(rows: &[Vec<f64>]) -> Vec<ChartPoint> {
    let mut by_date: BTreeMap<String, f64> = BTreeMap::new();

    for row in rows {
        let (Some(&ts), Some(&close)) = (row.first(), row.get(4)) else {
            continue;
        };
        let Some(time) = DateTime::from_timestamp(ts as i64, 0) else {
            continue;
        };
        by_date.insert(time.format("%Y-%m-%d").to_string(), close);
    }

    by_date
        .into_iter()
        .map(|(time, value)| ChartPoint { time, value })
        .collect()
}
