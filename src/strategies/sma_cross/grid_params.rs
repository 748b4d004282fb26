//! Grid search parameters for SMA Crossover Strategy

use crate::Config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridParams {
    pub fast_periods: Vec<usize>,
    pub slow_periods: Vec<usize>,
}

impl GridParams {
    pub fn quick() -> Self {
        GridParams {
            fast_periods: vec![5, 9, 13],
            slow_periods: vec![16, 21, 34],
        }
    }

    pub fn full() -> Self {
        GridParams {
            fast_periods: (3..=20).collect(),
            slow_periods: (10..=60).step_by(2).collect(),
        }
    }

    /// Generate all valid parameter combinations using itertools
    pub fn generate_configs(&self, base_config: &Config) -> Vec<Config> {
        use itertools::iproduct;

        iproduct!(&self.fast_periods, &self.slow_periods)
            .filter(|(fast, slow)| fast < slow)
            .map(|(fast, slow)| {
                let mut config = base_config.clone();
                config.set_strategy_param("fast_period", serde_json::json!(fast));
                config.set_strategy_param("slow_period", serde_json::json!(slow));
                config
            })
            .collect()
    }
}
