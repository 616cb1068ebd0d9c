//! Tunable thresholds, gathered into one value so a host can run a test
//! network with smaller minimums instead of touching handler logic.

/// Defaults reproduce the constants fixed by the handlers in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub min_stake_root: u64,
    pub min_stake_partition: u64,
    pub min_stake_edge: u64,
    pub consensus_cap: usize,
    pub lock_period_secs: u64,
    pub slash_rate_pct: u64,
    pub min_verification_count: u32,
    pub duplicate_suppression_window_secs: u64,
    pub reputation_initial: i64,
    pub reputation_min: i64,
    pub reputation_max: i64,
    pub reputation_consensus_floor: i64,
    pub reputation_verify_credit: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            min_stake_root: 10_000,
            min_stake_partition: 5_000,
            min_stake_edge: 100,
            consensus_cap: 21,
            lock_period_secs: 604_800,
            slash_rate_pct: 100,
            min_verification_count: 3,
            duplicate_suppression_window_secs: 300,
            reputation_initial: 100,
            reputation_min: 0,
            reputation_max: 1000,
            reputation_consensus_floor: 80,
            reputation_verify_credit: 5,
        }
    }
}
