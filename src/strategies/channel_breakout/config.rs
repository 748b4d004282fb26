//! Channel Breakout Configuration

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelBreakoutConfig {
    /// Channel lookback in bars (default: 18)
    #[serde(default = "default_length")]
    pub length: usize,

    /// Contracts per entry (default: 100)
    #[serde(default = "default_lot")]
    pub lot: f64,
}

fn default_length() -> usize { 18 }
fn default_lot() -> f64 { 100.0 }

impl ChannelBreakoutConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.length >= 2, "length must be at least 2, got {}", self.length);
        ensure!(self.lot > 0.0, "lot must be positive, got {}", self.lot);
        Ok(())
    }
}

impl Default for ChannelBreakoutConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            lot: default_lot(),
        }
    }
}
