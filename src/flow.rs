//! Flow identity and the per-flow record stored in the flow pool.

use crate::pattern::PatternTracker;

/// Opaque flow identity. The only operation the rest of the engine needs
/// from it is a 32-bit mix hash (see `hashing::FlowHash`); a fuller
/// implementation could widen this to a 5-tuple without touching any
/// other component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowKey(pub u32);

/// Per-flow lifecycle classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    Normal,
    Large,
    Bursty,
    Micro,
    Dying,
    Promoted,
    Suspected,
}

impl FlowType {
    pub const ALL: [FlowType; 7] = [
        FlowType::Normal,
        FlowType::Large,
        FlowType::Bursty,
        FlowType::Micro,
        FlowType::Dying,
        FlowType::Promoted,
        FlowType::Suspected,
    ];
}

/// A named rule reducing confidence as a function of idle time; each flow
/// carries its own (see `aging`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgingStrategy {
    Linear,
    Exponential,
    Adaptive,
    Aggressive,
}

/// Per-flow aging bookkeeping: creation time, last-access time, and the
/// strategy used to decay this flow's confidence.
#[derive(Debug, Clone, Copy)]
pub struct FlowAging {
    pub created_at: f64,
    pub last_touched_at: f64,
    pub strategy: AgingStrategy,
}

impl FlowAging {
    pub fn idle_seconds(&self, now: f64) -> f64 {
        (now - self.last_touched_at).max(0.0)
    }
}

/// One entry per observed flow key. Owned exclusively by the flow pool;
/// every other structure holds only a pool index back-reference.
#[derive(Debug, Clone)]
pub struct FlowRecord {
    pub key: FlowKey,
    pub confidence: i32,
    pub hits: u64,
    pub packet_count: u64,
    pub first_seen: f64,
    pub last_seen: f64,
    pub flow_type: FlowType,
    pub previous_type: FlowType,
    pub pattern: PatternTracker,
    pub aging: FlowAging,
    pub cache_hits: u64,
    pub promotion_score: i32,
}

impl FlowRecord {
    /// §4.6 initialisation for a flow admitted from the packet stream.
    pub fn new(key: FlowKey, now: f64) -> Self {
        Self {
            key,
            confidence: 35,
            hits: 1,
            packet_count: 1,
            first_seen: now,
            last_seen: now,
            flow_type: FlowType::Normal,
            previous_type: FlowType::Normal,
            pattern: PatternTracker::fresh(),
            aging: FlowAging {
                created_at: now,
                last_touched_at: now,
                strategy: AgingStrategy::Exponential,
            },
            cache_hits: 0,
            promotion_score: 100,
        }
    }

    /// §4.6 initialisation for a key pre-populated from the known-flow
    /// prelude, before any packet in the stream has been observed.
    pub fn prepopulated(key: FlowKey, now: f64) -> Self {
        Self {
            key,
            confidence: 75,
            hits: 12,
            packet_count: 15,
            first_seen: now,
            last_seen: now,
            flow_type: FlowType::Large,
            previous_type: FlowType::Large,
            pattern: PatternTracker::prepopulated(),
            aging: FlowAging {
                created_at: now,
                last_touched_at: now,
                strategy: AgingStrategy::Adaptive,
            },
            cache_hits: 0,
            promotion_score: 800,
        }
    }

    #[inline(always)]
    pub fn age_seconds(&self, now: f64) -> f64 {
        (now - self.first_seen).max(0.0)
    }

    #[inline(always)]
    pub fn idle_seconds(&self, now: f64) -> f64 {
        (now - self.last_seen).max(0.0)
    }

    #[inline(always)]
    pub fn clamp_confidence(&mut self) {
        self.confidence = self.confidence.clamp(0, 100);
    }

    #[inline(always)]
    pub fn clamp_promotion_score(&mut self) {
        self.promotion_score = self.promotion_score.clamp(0, 1000);
    }

    /// Applies a path-quality delta to `promotion_score`: +10 on fast-ish
    /// paths, -5 on slow paths, clamped to [0, 1000].
    pub fn apply_promotion_delta(&mut self, path: crate::path::Path) {
        if path.is_fast_ish() {
            self.promotion_score += 10;
        } else if path.is_slow_ish() {
            self.promotion_score -= 5;
        }
        self.clamp_promotion_score();
    }

    /// Transitions into `Dying`, remembering the prior type for eventual
    /// rollback.
    pub fn mark_dying(&mut self) {
        if self.flow_type != FlowType::Dying {
            self.previous_type = self.flow_type;
            self.flow_type = FlowType::Dying;
        }
    }

    /// §4.7 flow-type transitions, applied after counters are updated for
    /// the current packet. First match wins.
    pub fn apply_type_transitions(&mut self) {
        if self.packet_count > 800 && self.flow_type != FlowType::Large {
            self.previous_type = self.flow_type;
            self.flow_type = FlowType::Large;
            self.aging.strategy = AgingStrategy::Adaptive;
        } else if self.pattern.burst_score > 0.6
            && self.hits > 10
            && !matches!(self.flow_type, FlowType::Bursty | FlowType::Promoted)
        {
            self.previous_type = self.flow_type;
            self.flow_type = FlowType::Bursty;
            self.aging.strategy = AgingStrategy::Linear;
        } else if self.packet_count < 10 && self.hits < 5 {
            self.previous_type = self.flow_type;
            self.flow_type = FlowType::Micro;
            self.aging.strategy = AgingStrategy::Aggressive;
        } else if self.pattern.is_filled()
            && self.pattern.path_consistency < 0.3
            && self.hits > 8
            && self.flow_type != FlowType::Suspected
        {
            self.previous_type = self.flow_type;
            self.flow_type = FlowType::Suspected;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_flow_matches_initial_values() {
        let r = FlowRecord::new(FlowKey(1), 0.0);
        assert_eq!(r.confidence, 35);
        assert_eq!(r.hits, 1);
        assert_eq!(r.packet_count, 1);
        assert_eq!(r.flow_type, FlowType::Normal);
        assert_eq!(r.promotion_score, 100);
        assert_eq!(r.pattern.path_consistency, 1.0);
        assert_eq!(r.pattern.burst_score, 0.0);
    }

    #[test]
    fn prepopulated_flow_matches_initial_values() {
        let r = FlowRecord::prepopulated(FlowKey(7), 0.0);
        assert_eq!(r.confidence, 75);
        assert_eq!(r.hits, 12);
        assert_eq!(r.packet_count, 15);
        assert_eq!(r.flow_type, FlowType::Large);
        assert_eq!(r.promotion_score, 800);
        assert_eq!(r.pattern.consecutive_fast_paths, 5);
    }

    #[test]
    fn confidence_and_promotion_score_stay_in_bounds() {
        let mut r = FlowRecord::new(FlowKey(1), 0.0);
        r.confidence = 200;
        r.clamp_confidence();
        assert_eq!(r.confidence, 100);
        r.confidence = -50;
        r.clamp_confidence();
        assert_eq!(r.confidence, 0);

        r.promotion_score = 5000;
        r.clamp_promotion_score();
        assert_eq!(r.promotion_score, 1000);
    }

    #[test]
    fn first_seen_never_exceeds_last_seen() {
        let r = FlowRecord::new(FlowKey(1), 10.0);
        assert!(r.first_seen <= r.last_seen);
    }

    #[test]
    fn heavy_packet_count_transitions_to_large() {
        let mut r = FlowRecord::new(FlowKey(1), 0.0);
        r.packet_count = 801;
        r.apply_type_transitions();
        assert_eq!(r.flow_type, FlowType::Large);
        assert_eq!(r.aging.strategy, AgingStrategy::Adaptive);
    }

    #[test]
    fn sparse_young_flow_transitions_to_micro() {
        let mut r = FlowRecord::new(FlowKey(1), 0.0);
        r.packet_count = 3;
        r.hits = 2;
        r.apply_type_transitions();
        assert_eq!(r.flow_type, FlowType::Micro);
        assert_eq!(r.aging.strategy, AgingStrategy::Aggressive);
    }

    #[test]
    fn inconsistent_filled_pattern_marks_suspected() {
        let mut r = FlowRecord::new(FlowKey(1), 0.0);
        r.hits = 20;
        r.packet_count = 20;
        for p in [
            crate::path::Path::UltraFast,
            crate::path::Path::UltraFast,
            crate::path::Path::Fast,
            crate::path::Path::Fast,
            crate::path::Path::Accelerated,
            crate::path::Path::Accelerated,
            crate::path::Path::Slow,
            crate::path::Path::Slow,
        ] {
            r.pattern.push(p);
        }
        assert!(r.pattern.path_consistency < 0.3);
        assert!(r.pattern.burst_score <= 0.6);
        r.apply_type_transitions();
        assert_eq!(r.flow_type, FlowType::Suspected);
    }
}
