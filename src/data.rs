//! Price data access: the injectable provider capability and CSV loading.

use crate::error::{Error, Result};
use crate::types::Bar;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Source of historical price series.
///
/// The core never reaches for a global client; whoever calls it supplies
/// one of these. A provider may legitimately return an empty series —
/// callers surface that as a typed no-data condition.
pub trait PriceProvider {
    /// Fetch bars for `symbol` within `[start, end]`, ascending by
    /// timestamp with no duplicate timestamps.
    fn fetch(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<Vec<Bar>>;
}

/// In-memory provider backed by preloaded bar series. Used by tests and
/// by embedders that already hold their data.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    bars: HashMap<String, Vec<Bar>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a bar series, keeping it sorted by timestamp.
    pub fn insert(&mut self, symbol: impl Into<String>, mut bars: Vec<Bar>) {
        bars.sort_by_key(|b| b.timestamp);
        self.bars.insert(symbol.into(), bars);
    }
}

impl PriceProvider for MemoryProvider {
    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        Ok(self
            .bars
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.timestamp >= start && b.timestamp <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// CSV loading options.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    pub has_headers: bool,
    pub delimiter: u8,
    /// Explicit date format; when `None`, common formats are tried.
    pub date_format: Option<String>,
    /// Skip rows that fail to parse or validate instead of erroring.
    pub skip_invalid: bool,
    /// Reject bars with inconsistent OHLC values.
    pub validate_bars: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            has_headers: true,
            delimiter: b',',
            date_format: None,
            skip_invalid: true,
            validate_bars: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "Timestamp", alias = "timestamp")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

fn parse_datetime(s: &str, format: Option<&str>) -> Result<DateTime<Utc>> {
    if let Some(fmt) = format {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap()));
        }
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"];
    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    for fmt in &date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap()));
        }
    }

    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt);
        }
    }

    Err(Error::Data(format!("could not parse date: '{}'", s)))
}

/// Load OHLCV bars from a CSV file.
///
/// Rows are sorted by timestamp and duplicate timestamps dropped; an
/// empty result is [`Error::NoData`].
pub fn load_csv(path: impl AsRef<Path>, config: &CsvConfig) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    info!("loading price data from {}", path.display());

    let mut reader = ReaderBuilder::new()
        .has_headers(config.has_headers)
        .delimiter(config.delimiter)
        .flexible(true)
        .from_path(path)?;

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    let mut row_num = 0usize;

    for result in reader.deserialize() {
        row_num += 1;
        let row: CsvRow = match result {
            Ok(r) => r,
            Err(e) => {
                if config.skip_invalid {
                    debug!("skipping row {}: {}", row_num, e);
                    skipped += 1;
                    continue;
                }
                return Err(Error::Csv(e));
            }
        };

        let timestamp = match parse_datetime(&row.date, config.date_format.as_deref()) {
            Ok(ts) => ts,
            Err(e) => {
                if config.skip_invalid {
                    debug!("skipping row {}: {}", row_num, e);
                    skipped += 1;
                    continue;
                }
                return Err(e);
            }
        };

        let bar = Bar::new(timestamp, row.open, row.high, row.low, row.close, row.volume);
        if config.validate_bars && !bar.validate() {
            if config.skip_invalid {
                debug!("skipping row {}: inconsistent bar {:?}", row_num, bar);
                skipped += 1;
                continue;
            }
            return Err(Error::Data(format!(
                "invalid bar data at row {}: {:?}",
                row_num, bar
            )));
        }

        bars.push(bar);
    }

    if skipped > 0 {
        warn!("skipped {} invalid rows", skipped);
    }

    bars.sort_by_key(|b| b.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    if bars.len() < before {
        warn!("removed {} duplicate timestamps", before - bars.len());
    }

    if bars.is_empty() {
        return Err(Error::NoData);
    }

    info!(
        "loaded {} bars from {} to {}",
        bars.len(),
        bars[0].timestamp,
        bars[bars.len() - 1].timestamp
    );

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        let ts = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        Bar::new(ts, close, close + 1.0, close - 1.0, close, 1000.0)
    }

    #[test]
    fn test_memory_provider_range_filtering() {
        let mut provider = MemoryProvider::new();
        provider.insert("TEST", vec![bar(3, 102.0), bar(1, 100.0), bar(2, 101.0)]);

        let fetched = provider
            .fetch(
                "TEST",
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 2, 23, 59, 59).unwrap(),
            )
            .unwrap();

        // Sorted on insert, filtered to the range.
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].close, 100.0);
        assert_eq!(fetched[1].close, 101.0);
    }

    #[test]
    fn test_memory_provider_unknown_symbol_is_empty() {
        let provider = MemoryProvider::new();
        let fetched = provider
            .fetch(
                "NOPE",
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap(),
            )
            .unwrap();
        assert!(fetched.is_empty());
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-01-15", None).is_ok());
        assert!(parse_datetime("2024/01/15", None).is_ok());
        assert!(parse_datetime("2024-01-15 09:30:00", None).is_ok());
        assert!(parse_datetime("1705312200", None).is_ok());
        assert!(parse_datetime("not a date", None).is_err());
    }
}
