//! SMA Crossover Configuration

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmaCrossConfig {
    /// Fast SMA period (default: 9)
    #[serde(default = "default_fast")]
    pub fast_period: usize,

    /// Slow SMA period (default: 16)
    #[serde(default = "default_slow")]
    pub slow_period: usize,

    /// Contracts per entry (default: 100)
    #[serde(default = "default_lot")]
    pub lot: f64,
}

fn default_fast() -> usize { 9 }
fn default_slow() -> usize { 16 }
fn default_lot() -> f64 { 100.0 }

impl SmaCrossConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.fast_period >= 1, "fast_period must be at least 1");
        ensure!(
            self.fast_period < self.slow_period,
            "fast_period ({}) must be below slow_period ({})",
            self.fast_period,
            self.slow_period
        );
        ensure!(self.lot > 0.0, "lot must be positive, got {}", self.lot);
        Ok(())
    }
}

impl Default for SmaCrossConfig {
    fn default() -> Self {
        Self {
            fast_period: default_fast(),
            slow_period: default_slow(),
            lot: default_lot(),
        }
    }
}
