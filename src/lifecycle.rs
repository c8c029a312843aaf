//! Periodic promotion/demotion sweep over the flow pool (§4.7's lifecycle
//! rules). Runs every `INTERVAL_PACKETS` processed packets, bounded to the
//! first `scan_limit` pool slots.
//!
//! §9 Open Question: whether the 1000-slot bound is an intentional rate
//! limit or an oversight is unclear from the source; it is preserved here
//! as `EngineConfig::lifecycle_scan_limit` rather than hardcoded, so a
//! caller can widen or narrow it.

use crate::aging::AgingManager;
use crate::classifier::{self, MLModel};
use crate::flow::{FlowRecord, FlowType};

pub const INTERVAL_PACKETS: u64 = 100_000;
pub const DEFAULT_SCAN_LIMIT: usize = 1_000;

const PROMOTE_MIN_ML: f64 = 0.75;
const PROMOTE_MIN_SCORE: i32 = 700;
const PROMOTE_MIN_HITS: u64 = 8;

const DEMOTE_MAX_ML: f64 = 0.4;
const DEMOTE_MAX_IDLE_SECONDS: f64 = 300.0;
const DEMOTE_MIN_SCORE: i32 = 200;
const DEMOTE_PENALTY: i32 = 15;
const DEMOTE_FLOOR: i32 = 10;

const DYING_IDLE_SECONDS: f64 = 900.0;

/// Whether `total_processed` lands on the sweep cadence.
pub fn is_due(total_processed: u64) -> bool {
    total_processed > 0 && total_processed % INTERVAL_PACKETS == 0
}

/// Runs one sweep over `pool[..scan_limit.min(pool_index)]`, promoting
/// eligible `Normal` flows to `Promoted`, demoting stale `Promoted` flows
/// back to their `previous_type`, and zeroing the confidence of `Dying`
/// flows idle past `DYING_IDLE_SECONDS`.
pub fn run_sweep(
    pool: &mut [FlowRecord],
    pool_index: usize,
    scan_limit: usize,
    now: f64,
    ml: &mut MLModel,
    aging: &mut AgingManager,
) {
    let bound = scan_limit.min(pool_index);
    for record in pool.iter_mut().take(bound) {
        if record.flow_type == FlowType::Dying {
            if record.confidence > 0 && record.idle_seconds(now) > DYING_IDLE_SECONDS {
                record.confidence = 0;
            }
            continue;
        }

        let ml_score = ml.predict(classifier::extract_features(record, now));

        if record.flow_type == FlowType::Normal
            && ml_score > PROMOTE_MIN_ML
            && record.promotion_score > PROMOTE_MIN_SCORE
            && record.hits > PROMOTE_MIN_HITS
        {
            record.previous_type = record.flow_type;
            record.flow_type = FlowType::Promoted;
            aging.record_promotion();
            continue;
        }

        if record.flow_type == FlowType::Promoted {
            let idle = record.idle_seconds(now);
            let should_demote = ml_score < DEMOTE_MAX_ML
                || idle > DEMOTE_MAX_IDLE_SECONDS
                || record.promotion_score < DEMOTE_MIN_SCORE;
            if should_demote {
                record.flow_type = record.previous_type;
                record.confidence = (record.confidence - DEMOTE_PENALTY).max(DEMOTE_FLOOR);
                aging.record_demotion();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowKey;

    fn eligible_record() -> FlowRecord {
        let mut r = FlowRecord::new(FlowKey(1), 0.0);
        r.confidence = 90;
        r.hits = 50;
        r.packet_count = 50;
        r.promotion_score = 900;
        r.pattern.path_consistency = 1.0;
        r.pattern.burst_score = 0.0;
        for _ in 0..8 {
            r.pattern.push(crate::path::Path::UltraFast);
        }
        r
    }

    #[test]
    fn promotes_eligible_normal_flow() {
        let mut pool = vec![eligible_record()];
        let mut ml = MLModel::new();
        let mut aging = AgingManager::new();
        run_sweep(&mut pool, 1, DEFAULT_SCAN_LIMIT, 0.0, &mut ml, &mut aging);
        assert_eq!(pool[0].flow_type, FlowType::Promoted);
        assert_eq!(aging.promotions(), 1);
    }

    #[test]
    fn demotes_idle_promoted_flow_back_to_previous_type() {
        let mut r = eligible_record();
        r.flow_type = FlowType::Promoted;
        r.previous_type = FlowType::Normal;
        r.promotion_score = 50; // below DEMOTE_MIN_SCORE
        let mut pool = vec![r];
        let mut ml = MLModel::new();
        let mut aging = AgingManager::new();
        run_sweep(&mut pool, 1, DEFAULT_SCAN_LIMIT, 0.0, &mut ml, &mut aging);
        assert_eq!(pool[0].flow_type, FlowType::Normal);
        assert_eq!(aging.demotions(), 1);
    }

    #[test]
    fn sweep_bounded_by_scan_limit() {
        let mut pool: Vec<FlowRecord> = (0..10).map(|_| eligible_record()).collect();
        let mut ml = MLModel::new();
        let mut aging = AgingManager::new();
        run_sweep(&mut pool, 10, 3, 0.0, &mut ml, &mut aging);
        assert_eq!(aging.promotions(), 3);
    }

    #[test]
    fn dying_flow_zeroed_after_long_idle() {
        let mut r = FlowRecord::new(FlowKey(1), 0.0);
        r.mark_dying();
        r.confidence = 5;
        let mut pool = vec![r];
        let mut ml = MLModel::new();
        let mut aging = AgingManager::new();
        run_sweep(&mut pool, 1, DEFAULT_SCAN_LIMIT, 1000.0, &mut ml, &mut aging);
        assert_eq!(pool[0].confidence, 0);
    }
}
