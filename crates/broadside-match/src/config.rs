//! Match configuration.

use std::time::Duration;

use broadside_engine::PlacementConfig;

/// Settings shared by every session a [`Lobby`](crate::Lobby) creates.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// How long a player may sit on their turn before forfeiting.
    /// Default: 60 seconds.
    pub turn_timeout: Duration,

    /// Fleet placement retry budgets.
    pub placement: PlacementConfig,

    /// Fixed seed for fleet placement and mode tie-breaks. `None` seeds each
    /// session from the OS.
    pub seed: Option<u64>,

    /// Log lines attached to turn and result events. Default: 5.
    pub log_lines: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_secs(60),
            placement: PlacementConfig::default(),
            seed: None,
            log_lines: 5,
        }
    }
}
