//! Memory-pressure-aware per-strategy confidence decay (§4.10), plus the
//! burst detector and the cumulative promotion/demotion/age-out counters
//! reported at the end of a run.

use crate::burst::BurstDetector;
use crate::classifier::{self, MLModel};
use crate::flow::{AgingStrategy, FlowRecord, FlowType};

pub const CYCLE_INTERVAL_PACKETS: u64 = 25_000;
pub const CYCLE_MIN_INTERVAL_SECONDS: f64 = 30.0;
const DYING_CONFIDENCE_THRESHOLD: i32 = 10;

#[derive(Debug, Clone)]
pub struct AgingManager {
    last_cycle_at: Option<f64>,
    memory_utilization: f64,
    aging_pressure: f64,
    burst: BurstDetector,
    promotions: u64,
    demotions: u64,
    aged_out: u64,
}

impl Default for AgingManager {
    fn default() -> Self {
        Self {
            last_cycle_at: None,
            memory_utilization: 0.0,
            aging_pressure: 0.3,
            burst: BurstDetector::new(),
            promotions: 0,
            demotions: 0,
            aged_out: 0,
        }
    }
}

impl AgingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory_utilization(&self) -> f64 {
        self.memory_utilization
    }

    pub fn aging_pressure(&self) -> f64 {
        self.aging_pressure
    }

    pub fn burst_rate(&self) -> f64 {
        self.burst.current_rate()
    }

    pub fn burst_active(&self) -> bool {
        self.burst.burst_active()
    }

    pub fn promotions(&self) -> u64 {
        self.promotions
    }

    pub fn demotions(&self) -> u64 {
        self.demotions
    }

    pub fn aged_out(&self) -> u64 {
        self.aged_out
    }

    pub fn record_promotion(&mut self) {
        self.promotions += 1;
    }

    pub fn record_demotion(&mut self) {
        self.demotions += 1;
    }

    pub fn record_aged_out(&mut self) {
        self.aged_out += 1;
    }

    /// Feeds the burst detector; must be called once per packet with the
    /// wall-clock second of arrival.
    pub fn observe_arrival(&mut self, wall_second: u64) {
        self.burst.observe(wall_second);
    }

    /// Runs one aging cycle if `total_processed` lands on the 25000-packet
    /// cadence and at least 30 simulated seconds have passed since the
    /// last cycle. Returns whether a cycle ran.
    #[allow(clippy::too_many_arguments)]
    pub fn maybe_run_cycle(
        &mut self,
        total_processed: u64,
        now: f64,
        pool: &mut [FlowRecord],
        pool_index: usize,
        pool_size: usize,
        ml: &mut MLModel,
    ) -> bool {
        if total_processed == 0 || total_processed % CYCLE_INTERVAL_PACKETS != 0 {
            return false;
        }
        if let Some(last) = self.last_cycle_at {
            if now - last < CYCLE_MIN_INTERVAL_SECONDS {
                return false;
            }
        }
        self.last_cycle_at = Some(now);
        self.run_cycle(total_processed, now, pool, pool_index, pool_size, ml);
        true
    }

    fn run_cycle(
        &mut self,
        total_processed: u64,
        now: f64,
        pool: &mut [FlowRecord],
        pool_index: usize,
        pool_size: usize,
        ml: &mut MLModel,
    ) {
        self.memory_utilization = pool_index as f64 / pool_size as f64;
        self.aging_pressure = if self.memory_utilization > 0.85 {
            0.9
        } else if self.memory_utilization > 0.70 {
            0.6
        } else {
            0.3
        };

        if pool_index == 0 {
            return;
        }

        let touches = ((0.1 * pool_index as f64) as usize).max(0);
        for i in 0..touches {
            let idx = (total_processed as usize + i) % pool_index;
            let record = &mut pool[idx];
            if record.flow_type == FlowType::Dying {
                continue;
            }
            let idle = record.idle_seconds(now);
            let ml_score = ml.predict(classifier::extract_features(record, now));
            let aged_out_here = apply_strategy(record, idle, ml_score);
            record.clamp_confidence();
            if aged_out_here {
                self.record_aged_out();
            } else if record.confidence < DYING_CONFIDENCE_THRESHOLD {
                record.mark_dying();
                self.record_aged_out();
            }
        }
    }
}

/// Applies `record`'s aging strategy and returns whether this call is the
/// one that transitioned it into `Dying` — the `Aggressive` strategy has
/// its own below-15 threshold, stricter than the generic below-10 catch-all
/// in `run_cycle`, so the caller must count the age-out here rather than
/// rely on the generic check (which would never see it: a record already
/// carrying `flow_type == Dying` is skipped on every later cycle).
fn apply_strategy(record: &mut FlowRecord, idle: f64, ml_score: f64) -> bool {
    match record.aging.strategy {
        AgingStrategy::Linear => {
            if idle > 180.0 {
                record.confidence = (record.confidence - 3).max(0);
            }
            false
        }
        AgingStrategy::Exponential => {
            if idle > 60.0 {
                let factor = (1.0 - idle / 600.0).max(0.1);
                record.confidence = (record.confidence as f64 * factor) as i32;
            }
            false
        }
        AgingStrategy::Adaptive => {
            let factor = 1.0 - (idle / 1200.0) * (1.0 - 0.8 * ml_score);
            record.confidence = (record.confidence as f64 * factor) as i32;
            false
        }
        AgingStrategy::Aggressive => {
            if idle > 90.0 {
                record.confidence -= 8;
                if record.confidence < 15 {
                    record.mark_dying();
                    return true;
                }
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowKey;

    #[test]
    fn linear_decay_only_after_idle_threshold() {
        let mut r = FlowRecord::new(FlowKey(1), 0.0);
        r.aging.strategy = AgingStrategy::Linear;
        r.confidence = 50;
        apply_strategy(&mut r, 10.0, 0.5);
        assert_eq!(r.confidence, 50);
        apply_strategy(&mut r, 200.0, 0.5);
        assert_eq!(r.confidence, 47);
    }

    #[test]
    fn exponential_decay_bounded_by_point_one_factor() {
        let mut r = FlowRecord::new(FlowKey(1), 0.0);
        r.aging.strategy = AgingStrategy::Exponential;
        r.confidence = 100;
        apply_strategy(&mut r, 10_000.0, 0.5);
        assert!(r.confidence as f64 >= 100.0 * 0.1 - 1.0);
    }

    #[test]
    fn aggressive_marks_dying_below_fifteen() {
        let mut r = FlowRecord::new(FlowKey(1), 0.0);
        r.aging.strategy = AgingStrategy::Aggressive;
        r.confidence = 20;
        let aged_out = apply_strategy(&mut r, 100.0, 0.5);
        assert_eq!(r.confidence, 12);
        assert_eq!(r.flow_type, FlowType::Dying);
        assert!(aged_out);
    }

    #[test]
    fn aggressive_transition_to_dying_is_counted_even_above_generic_threshold() {
        // Confidence lands at 12 — below Aggressive's own 15 threshold
        // (so apply_strategy marks it Dying) but above the generic <10
        // catch-all in run_cycle, which would otherwise never see it once
        // the record is already Dying on every later cycle.
        let mut mgr = AgingManager::new();
        let mut ml = MLModel::new();
        let mut r = FlowRecord::new(FlowKey(1), 0.0);
        r.aging.strategy = AgingStrategy::Aggressive;
        r.confidence = 20;
        r.aging.last_touched_at = -100.0;
        let mut pool = vec![r];
        mgr.run_cycle(25_000, 0.0, &mut pool, 1, 10, &mut ml);
        assert_eq!(pool[0].flow_type, FlowType::Dying);
        assert_eq!(pool[0].confidence, 12);
        assert_eq!(mgr.aged_out(), 1);
    }

    #[test]
    fn cycle_respects_packet_cadence_and_clock_gate() {
        let mut mgr = AgingManager::new();
        let mut ml = MLModel::new();
        let mut pool = vec![FlowRecord::new(FlowKey(1), 0.0)];
        assert!(!mgr.maybe_run_cycle(1000, 100.0, &mut pool, 1, 10, &mut ml));
        assert!(mgr.maybe_run_cycle(25_000, 100.0, &mut pool, 1, 10, &mut ml));
        // too soon after the previous cycle
        assert!(!mgr.maybe_run_cycle(50_000, 110.0, &mut pool, 1, 10, &mut ml));
        assert!(mgr.maybe_run_cycle(50_000, 140.0, &mut pool, 1, 10, &mut ml));
    }
}
