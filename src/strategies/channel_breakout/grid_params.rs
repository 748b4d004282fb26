//! Grid search parameters for Channel Breakout Strategy

use crate::Config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridParams {
    pub lengths: Vec<usize>,
    pub lots: Vec<f64>,
}

impl GridParams {
    pub fn quick() -> Self {
        GridParams {
            lengths: vec![10, 18, 26],
            lots: vec![100.0],
        }
    }

    pub fn full() -> Self {
        GridParams {
            lengths: (6..=40).step_by(2).collect(),
            lots: vec![50.0, 100.0, 200.0],
        }
    }

    /// Generate all parameter combinations using itertools
    pub fn generate_configs(&self, base_config: &Config) -> Vec<Config> {
        use itertools::iproduct;

        iproduct!(&self.lengths, &self.lots)
            .map(|(length, lot)| {
                let mut config = base_config.clone();
                config.set_strategy_param("length", serde_json::json!(length));
                config.set_strategy_param("lot", serde_json::json!(lot));
                config
            })
            .collect()
    }
}
