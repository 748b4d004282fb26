//! Bar data loading and resampling
//!
//! Reads OHLCV bars from CSV (`datetime,open,high,low,close,volume`) and
//! aggregates base bars into the bin size a strategy subscribes to.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use tracing::{info, warn};

use crate::{BinSize, Candle};

// =============================================================================
// CSV Data Loading
// =============================================================================

/// Load OHLCV bars from a CSV file, skipping rows that fail validation
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .context(format!("Failed to open CSV file: {}", path.display()))?;

    let mut candles = Vec::new();
    let mut skipped = 0usize;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read row {}", row_idx + 1))?;

        let dt_str = record.get(0).context("Missing datetime column")?;
        let datetime = parse_datetime(dt_str)
            .context(format!("Failed to parse datetime: {}", dt_str))?;

        let field = |idx: usize, name: &str| -> Result<f64> {
            record
                .get(idx)
                .context(format!("Missing {} column", name))?
                .trim()
                .parse::<f64>()
                .context(format!("Failed to parse {} at row {}", name, row_idx + 1))
        };

        let open = field(1, "open")?;
        let high = field(2, "high")?;
        let low = field(3, "low")?;
        let close = field(4, "close")?;
        let volume = field(5, "volume")?;

        match Candle::new(datetime, open, high, low, close, volume) {
            Ok(candle) => candles.push(candle),
            Err(e) => {
                warn!("Skipping invalid bar at row {}: {}", row_idx + 1, e);
                skipped += 1;
            }
        }
    }

    candles.sort_by_key(|c| c.datetime);

    info!(
        "Loaded {} bars from {} ({} skipped)",
        candles.len(),
        path.display(),
        skipped
    );

    Ok(candles)
}

/// RFC 3339, `%Y-%m-%d %H:%M:%S` (assumed UTC) or unix seconds
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    s.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        })
        .or_else(|| {
            s.parse::<i64>()
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        })
}

// =============================================================================
// Resampling
// =============================================================================

/// Aggregate bars into `bin_size` buckets aligned to the epoch
///
/// Open comes from the first bar in a bucket, close from the last, high and
/// low are the extremes, volume is summed. The bucket start becomes the bar
/// time. Input must be sorted by time; bars already at or above the bin size
/// pass through unchanged.
pub fn resample(candles: &[Candle], bin_size: BinSize) -> Vec<Candle> {
    let bin = bin_size.seconds();
    let mut out: Vec<Candle> = Vec::new();
    let mut current_bucket: Option<i64> = None;

    for candle in candles {
        let ts = candle.datetime.timestamp();
        let bucket = ts - ts.rem_euclid(bin);

        match (current_bucket, out.last_mut()) {
            (Some(b), Some(agg)) if b == bucket => {
                agg.high = agg.high.max(candle.high);
                agg.low = agg.low.min(candle.low);
                agg.close = candle.close;
                agg.volume += candle.volume;
            }
            _ => {
                let datetime = Utc
                    .timestamp_opt(bucket, 0)
                    .single()
                    .unwrap_or(candle.datetime);
                out.push(Candle {
                    datetime,
                    ..candle.clone()
                });
                current_bucket = Some(bucket);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::io::Write;

    fn minute_bars(count: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| {
                let base = 100.0 + i as f64;
                Candle::new_unchecked(
                    start + Duration::minutes(i as i64),
                    base,
                    base + 2.0,
                    base - 1.0,
                    base + 1.0,
                    10.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_resample_five_minutes() {
        let bars = resample(&minute_bars(12), BinSize::FiveMinutes);
        assert_eq!(bars.len(), 3);

        let first = &bars[0];
        assert_eq!(first.open, 100.0);
        assert_eq!(first.high, 106.0);
        assert_eq!(first.low, 99.0);
        assert_eq!(first.close, 105.0);
        assert_eq!(first.volume, 50.0);

        // partial trailing bucket
        assert_eq!(bars[2].open, 110.0);
        assert_eq!(bars[2].volume, 20.0);
    }

    #[test]
    fn test_resample_same_size_passthrough() {
        let src = minute_bars(4);
        let bars = resample(&src, BinSize::OneMinute);
        assert_eq!(bars.len(), 4);
        assert_eq!(bars[3].close, src[3].close);
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-01-01T00:00:00Z").is_some());
        assert!(parse_datetime("2024-01-01 12:30:00").is_some());
        assert!(parse_datetime("1704067200").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn test_load_csv_skips_invalid_rows() {
        let dir = std::env::temp_dir().join(format!("exchange_sim_data_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bars.csv");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "datetime,open,high,low,close,volume").unwrap();
        writeln!(file, "2024-01-01 00:00:00,100,110,95,105,1").unwrap();
        writeln!(file, "2024-01-01 00:01:00,100,90,95,92,1").unwrap();
        writeln!(file, "2024-01-01 00:02:00,105,108,101,107,2").unwrap();
        drop(file);

        let candles = load_csv(&path).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].close, 107.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_csv_sorts_by_time() {
        let dir = std::env::temp_dir().join(format!("exchange_sim_sort_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("shuffled.csv");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "datetime,open,high,low,close,volume").unwrap();
        writeln!(file, "2024-01-01 00:01:00,101,103,100,102,1").unwrap();
        writeln!(file, "2024-01-01 00:00:00,100,102,99,101,1").unwrap();
        writeln!(file, "2024-01-01 00:03:00,103,105,102,104,1").unwrap();
        writeln!(file, "2024-01-01 00:02:00,102,104,101,103,1").unwrap();
        drop(file);

        let candles = load_csv(&path).unwrap();
        let minutes: Vec<u32> = candles
            .iter()
            .map(|c| chrono::Timelike::minute(&c.datetime))
            .collect();
        assert_eq!(minutes, vec![0, 1, 2, 3]);

        let bars = resample(&candles, BinSize::FiveMinutes);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].close, 104.0);

        std::fs::remove_dir_all(&dir).ok();
    }
}
