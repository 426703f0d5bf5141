use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration, read once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadModelConfig {
    /// Page size used when a query does not request one.
    pub page_size: usize,
    /// Lifetime of materialized union/intersection sets (in seconds). Zero
    /// turns result caching off.
    pub temp_set_ttl_secs: u64,
}

impl ReadModelConfig {
    pub fn temp_set_ttl(&self) -> Duration {
        Duration::from_secs(self.temp_set_ttl_secs)
    }

    pub fn caches_results(&self) -> bool {
        self.temp_set_ttl_secs > 0
    }
}

impl Default for ReadModelConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            temp_set_ttl_secs: 5,
        }
    }
}
