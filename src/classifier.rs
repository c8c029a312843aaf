//! On-line linear classifier with feature extraction, sigmoid scoring,
//! and learning-rate adaptation, plus its short-TTL prediction cache.

use crate::flow::{FlowRecord, FlowType};
use crate::hashing::mix;
use crate::path::Path;

pub const FEATURE_COUNT: usize = 8;

/// Cadence, in processed packets, at which `MLModel::adapt` is invoked.
pub const ADAPT_INTERVAL_PACKETS: u64 = 50_000;

const INITIAL_WEIGHTS: [f64; FEATURE_COUNT] = [0.35, 0.20, 0.15, 0.10, 0.08, 0.05, 0.04, 0.03];
const INITIAL_BIAS: f64 = 0.2;
const INITIAL_LEARNING_RATE: f64 = 0.002;
const MIN_LEARNING_RATE: f64 = 5e-4;
const MAX_LEARNING_RATE: f64 = 1e-2;

const FEATURE_MIN: [f64; FEATURE_COUNT] = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
const FEATURE_MAX: [f64; FEATURE_COUNT] = [100.0, 1000.0, 10000.0, 100.0, 100.0, 100.0, 100.0, 100.0];

impl FlowType {
    /// 0-based ordinal used as classifier feature #8 (scaled by 10).
    pub fn ordinal(&self) -> u32 {
        match self {
            FlowType::Normal => 0,
            FlowType::Large => 1,
            FlowType::Bursty => 2,
            FlowType::Micro => 3,
            FlowType::Dying => 4,
            FlowType::Promoted => 5,
            FlowType::Suspected => 6,
        }
    }
}

/// Extracts the 8-feature vector for `record` at time `now`, per §4.5.
/// Values are in their raw (pre-normalisation) units.
pub fn extract_features(record: &FlowRecord, now: f64) -> [f64; FEATURE_COUNT] {
    let age = record.age_seconds(now);
    let cache_ratio = if record.hits > 0 {
        100.0 * record.cache_hits as f64 / record.hits as f64
    } else {
        0.0
    };
    [
        record.confidence as f64,
        record.hits as f64,
        record.packet_count as f64,
        100.0 / (age + 1.0),
        100.0 * record.pattern.path_consistency,
        100.0 * record.pattern.burst_score,
        cache_ratio,
        10.0 * record.flow_type.ordinal() as f64,
    ]
}

#[inline(always)]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone)]
pub struct MLModel {
    weights: [f64; FEATURE_COUNT],
    bias: f64,
    learning_rate: f64,
    validation_correct: u64,
    validation_samples: u64,
    total_predictions: u64,
    last_accuracy: f64,
}

impl Default for MLModel {
    fn default() -> Self {
        Self {
            weights: INITIAL_WEIGHTS,
            bias: INITIAL_BIAS,
            learning_rate: INITIAL_LEARNING_RATE,
            validation_correct: 0,
            validation_samples: 0,
            total_predictions: 0,
            last_accuracy: 0.0,
        }
    }
}

impl MLModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn total_predictions(&self) -> u64 {
        self.total_predictions
    }

    pub fn validation_samples(&self) -> u64 {
        self.validation_samples
    }

    pub fn last_accuracy(&self) -> f64 {
        self.last_accuracy
    }

    /// `sigmoid(bias + sum(w_i * normalized_feature_i))`. Degenerate
    /// feature values are clamped into [0, 1] before the linear
    /// combination, so no NaN can reach the sigmoid.
    pub fn predict(&mut self, features: [f64; FEATURE_COUNT]) -> f64 {
        self.total_predictions += 1;
        self.score(features)
    }

    /// Same computation as `predict`, without incrementing
    /// `total_predictions` — used when the report re-scores the pool at
    /// the end of a run, which shouldn't be counted as pipeline traffic.
    pub fn score(&self, features: [f64; FEATURE_COUNT]) -> f64 {
        let mut acc = self.bias;
        for i in 0..FEATURE_COUNT {
            let span = (FEATURE_MAX[i] - FEATURE_MIN[i]).max(f64::EPSILON);
            let norm = ((features[i] - FEATURE_MIN[i]) / span).clamp(0.0, 1.0);
            acc += self.weights[i] * norm;
        }
        sigmoid(acc)
    }

    /// Records one validation sample for a packet with `hits >= 5`.
    pub fn record_validation(&mut self, predicted_fast: bool, actual_fast: bool) {
        self.validation_samples += 1;
        if predicted_fast == actual_fast {
            self.validation_correct += 1;
        }
    }

    /// Invoked every 50000 processed packets. Adapts the learning rate
    /// (never the weights) based on validation accuracy, then resets the
    /// validation counters.
    ///
    /// The "correct" signal compares the classifier's own prediction
    /// against the path the pipeline actually took, which itself depends
    /// on that prediction — a known circularity that biases reported
    /// accuracy upward. Preserved intentionally; not a bug to fix.
    pub fn adapt(&mut self) {
        if self.validation_samples == 0 {
            return;
        }
        let accuracy = self.validation_correct as f64 / self.validation_samples as f64;
        self.last_accuracy = accuracy;
        if accuracy > 0.85 {
            self.learning_rate *= 0.98;
        } else if accuracy < 0.70 {
            self.learning_rate *= 1.05;
        }
        self.learning_rate = self.learning_rate.clamp(MIN_LEARNING_RATE, MAX_LEARNING_RATE);
        self.validation_correct = 0;
        self.validation_samples = 0;
    }
}

/// One slot of the 1024-entry direct-mapped prediction cache.
#[derive(Debug, Clone, Copy)]
pub struct CacheSlot {
    pub key: u32,
    pub score: f64,
    pub suggested_path: Path,
    pub timestamp: f64,
    pub confidence_byte: u8,
}

pub const PREDICTION_CACHE_SIZE: usize = 1024;
const PREDICTION_CACHE_MASK: u32 = (PREDICTION_CACHE_SIZE - 1) as u32;
pub const FRESHNESS_SECONDS: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct PredictionCache {
    slots: Vec<Option<CacheSlot>>,
    hits: u64,
    lookups: u64,
}

impl Default for PredictionCache {
    fn default() -> Self {
        Self {
            slots: vec![None; PREDICTION_CACHE_SIZE],
            hits: 0,
            lookups: 0,
        }
    }
}

impl PredictionCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    fn slot_index(key: u32) -> usize {
        (mix(key) & PREDICTION_CACHE_MASK) as usize
    }

    /// Returns the cached slot for `key` if present and fresh at `now`.
    pub fn lookup(&mut self, key: u32, now: f64) -> Option<CacheSlot> {
        self.lookups += 1;
        let slot = self.slots[Self::slot_index(key)];
        match slot {
            Some(entry) if entry.key == key && now - entry.timestamp < FRESHNESS_SECONDS => {
                self.hits += 1;
                Some(entry)
            }
            _ => None,
        }
    }

    /// Writes a prediction for `key`, evicting any prior occupant.
    pub fn store(&mut self, key: u32, score: f64, suggested_path: Path, now: f64, confidence: i32) {
        let idx = Self::slot_index(key);
        self.slots[idx] = Some(CacheSlot {
            key,
            score,
            suggested_path,
            timestamp: now,
            confidence_byte: confidence.clamp(0, 255) as u8,
        });
    }

    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_stays_in_unit_interval() {
        let mut m = MLModel::new();
        let features = [1e9, -1e9, 50.0, 3.0, 200.0, -5.0, 10.0, 60.0];
        let score = m.predict(features);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn learning_rate_stays_bounded_after_many_adaptations() {
        let mut m = MLModel::new();
        for _ in 0..1000 {
            m.record_validation(true, false);
            m.adapt();
        }
        assert!(m.learning_rate() >= MIN_LEARNING_RATE);
        assert!(m.learning_rate() <= MAX_LEARNING_RATE);
    }

    #[test]
    fn prediction_cache_entry_expires_after_freshness_window() {
        let mut c = PredictionCache::new();
        c.store(5, 0.9, Path::UltraFast, 0.0, 90);
        assert!(c.lookup(5, 10.0).is_some());
        assert!(c.lookup(5, 31.0).is_none());
    }

    #[test]
    fn prediction_cache_miss_for_unwritten_key() {
        let mut c = PredictionCache::new();
        assert!(c.lookup(123, 0.0).is_none());
    }
}
