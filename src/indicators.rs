//! Technical indicators powered by the `ta` crate
//!
//! Outputs are aligned with the input: `None` until the lookback window is
//! full.

use ta::indicators::{Maximum, Minimum, SimpleMovingAverage};
use ta::Next;

/// Run a `ta` indicator over `values`, masking the warm-up period
fn rolling<I>(values: &[f64], period: usize, mut indicator: I) -> Vec<Option<f64>>
where
    I: Next<f64, Output = f64>,
{
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let out = indicator.next(v);
            if i + 1 >= period {
                Some(out)
            } else {
                None
            }
        })
        .collect()
}

/// Simple Moving Average
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if values.is_empty() || period == 0 {
        return vec![];
    }
    match SimpleMovingAverage::new(period) {
        Ok(ind) => rolling(values, period, ind),
        Err(_) => vec![None; values.len()],
    }
}

/// Rolling highest value
pub fn highest(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if values.is_empty() || period == 0 {
        return vec![];
    }
    match Maximum::new(period) {
        Ok(ind) => rolling(values, period, ind),
        Err(_) => vec![None; values.len()],
    }
}

/// Rolling lowest value
pub fn lowest(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if values.is_empty() || period == 0 {
        return vec![];
    }
    match Minimum::new(period) {
        Ok(ind) => rolling(values, period, ind),
        Err(_) => vec![None; values.len()],
    }
}

/// Last defined value of an indicator series
pub fn last(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}
