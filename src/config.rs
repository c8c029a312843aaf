//! Engine-wide tunables, grouped into a single params struct with sane
//! defaults rather than scattered constants — the convention the
//! `ptr_hash_patched` dependency uses for `PtrHashParams::default()`.

use crate::table;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Capacity of the flow pool. Defaults to
    /// `LARGE_FLOW_AREA_SIZE + BURSTY_FLOW_AREA_SIZE + MICRO_FLOW_AREA_SIZE`.
    pub pool_size: usize,
    /// Upper bound on how many pool slots a lifecycle sweep inspects.
    /// §9 Open Question: preserved as a config knob rather than a bare
    /// literal, since the source gives no rationale for the bound.
    pub lifecycle_scan_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_size: table::POOL_SIZE,
            lifecycle_scan_limit: crate::lifecycle::DEFAULT_SCAN_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_literals() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.pool_size, 51_500);
        assert_eq!(cfg.lifecycle_scan_limit, 1_000);
    }
}
