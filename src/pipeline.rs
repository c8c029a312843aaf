//! The per-packet hot loop: `arrive → sketch.update → lookup → (create |
//! update) → pattern transitions → path_select → execute(path) →
//! counters.update → maybe{aging, adapt_classifier, lifecycle}` (§2).
//!
//! Single-threaded and cooperative (§5): every structure here is owned
//! exclusively by `FlowPipeline`, there is no suspension within a packet,
//! and nothing in `process` returns `Result` — resource exhaustion,
//! classifier pathologies, and clock regressions are handled per the
//! policy in §7 rather than propagated.

use crate::aging::AgingManager;
use crate::classifier::{self, MLModel, PredictionCache};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::flow::{FlowKey, FlowRecord, FlowType};
use crate::lifecycle;
use crate::path::{self, Path};
use crate::sketch::CountMinSketch;
use crate::stats::Statistics;
use crate::table::{FlowTable, PoolIndex};

/// §4.7 burst-gated promotion thresholds, consulted inside the pipeline
/// (not inside path selection) whenever a burst is currently active.
const BURST_PROMOTE_ML: f64 = 0.75;
const BURST_PROMOTE_CONSECUTIVE: u32 = 3;
const BURST_PROMOTE_CONFIDENCE: i32 = 85;
const BURST_BUMP_ML: f64 = 0.55;
const BURST_BUMP_CONSECUTIVE: u32 = 2;
const BURST_BUMP_CONFIDENCE: i32 = 60;

/// Minimum `hits` for a packet to contribute a classifier validation
/// sample (§4.5).
const VALIDATION_MIN_HITS: u64 = 5;
/// Minimum `hits` for the prediction cache to be read from or written to
/// (§4.8).
const PREDICTION_CACHE_MIN_HITS: u64 = 2;

/// Outcome of processing a single packet, mostly useful for tests and
/// benchmarking rather than the statistics report (which reads off
/// `FlowPipeline::statistics` instead).
#[derive(Debug, Clone, Copy)]
pub struct PacketOutcome {
    pub path: Path,
    pub cost_units: u64,
    pub burst_active: bool,
    pub admitted: bool,
}

pub struct FlowPipeline<C: Clock = SystemClock> {
    config: EngineConfig,
    clock: C,
    table: FlowTable,
    sketch: CountMinSketch,
    model: MLModel,
    prediction_cache: PredictionCache,
    aging: AgingManager,
    stats: Statistics,
    total_processed: u64,
}

impl FlowPipeline<SystemClock> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> FlowPipeline<C> {
    pub fn with_clock(config: EngineConfig, clock: C) -> Self {
        Self {
            table: FlowTable::new(config.pool_size),
            config,
            clock,
            sketch: CountMinSketch::new(),
            model: MLModel::new(),
            prediction_cache: PredictionCache::new(),
            aging: AgingManager::new(),
            stats: Statistics::new(),
            total_processed: 0,
        }
    }

    /// Admits a known-flow key from the dataset prelude, before any
    /// packet from the stream is processed (§4.6 pre-populated init).
    /// Silently refused (and counted) if the pool is already full.
    pub fn load_known_flow(&mut self, key: FlowKey) {
        let now = self.clock.now_seconds();
        if self.table.insert(FlowRecord::prepopulated(key, now)).is_none() {
            self.stats.record_create_refusal();
        }
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn table(&self) -> &FlowTable {
        &self.table
    }

    pub fn model(&self) -> &MLModel {
        &self.model
    }

    pub fn prediction_cache(&self) -> &PredictionCache {
        &self.prediction_cache
    }

    pub fn aging(&self) -> &AgingManager {
        &self.aging
    }

    pub fn total_processed(&self) -> u64 {
        self.total_processed
    }

    /// Processes one packet end to end and returns its outcome.
    pub fn process(&mut self, key: FlowKey) -> PacketOutcome {
        let now = self.clock.now_seconds();
        self.total_processed += 1;

        self.aging.observe_arrival(now.max(0.0) as u64);
        self.sketch.update(key);

        let idx = match self.table.lookup_detailed(key) {
            Some((i, via_cache)) => {
                if via_cache {
                    self.table.get_mut(i).cache_hits += 1;
                }
                let record = self.table.get_mut(i);
                record.hits += 1;
                record.packet_count += 1;
                record.last_seen = now;
                record.aging.last_touched_at = now;
                record.apply_type_transitions();
                Some(i)
            }
            None => self.table.insert(FlowRecord::new(key, now)),
        };

        let admitted = idx.is_some();
        if idx.is_none() {
            self.stats.record_create_refusal();
        }

        let (path, prediction) = match idx {
            None => (path::select_for_new_flow(self.sketch.estimate(key)), None),
            Some(i) => self.select_path_for(i, key, now),
        };

        if let (Some(i), Some(score)) = (idx, prediction) {
            let hits = self.table.get(i).hits;
            if hits >= VALIDATION_MIN_HITS {
                let predicted_fast = score > 0.6;
                let actual_fast = matches!(path, Path::UltraFast | Path::Fast);
                self.model.record_validation(predicted_fast, actual_fast);
            }
        }

        let adaptive_ml = if matches!(path, Path::Adaptive) {
            idx.map(|i| self.live_ml_score(i, now)).unwrap_or(0.0)
        } else {
            0.0
        };
        let cost_units = path::execute(path, key.0, adaptive_ml);

        if let Some(i) = idx {
            let record = self.table.get_mut(i);
            record.pattern.push(path);
            record.apply_promotion_delta(path);
            self.maybe_apply_burst_promotion(i, now);
        }

        self.stats.record_path(path);
        self.maybe_run_periodic_tasks(now);

        PacketOutcome {
            path,
            cost_units,
            burst_active: self.aging.burst_active(),
            admitted,
        }
    }

    /// §4.8 decision tree for a key with a located-or-created flow record.
    /// Returns the chosen path plus the classifier score consulted while
    /// choosing it, if any (used for validation sampling).
    fn select_path_for(&mut self, idx: PoolIndex, key: FlowKey, now: f64) -> (Path, Option<f64>) {
        let hits = self.table.get(idx).hits;

        if hits > PREDICTION_CACHE_MIN_HITS {
            if let Some(cached) = self.prediction_cache.lookup(key.0, now) {
                return (path::select_from_cached_score(cached.score), Some(cached.score));
            }
        }

        if hits == 1 {
            return (Path::Accelerated, None);
        }

        let (confidence, consecutive, ml_score) = {
            let record = self.table.get(idx);
            let features = classifier::extract_features(record, now);
            (
                record.confidence,
                record.pattern.consecutive_fast_paths,
                self.model.predict(features),
            )
        };
        let chosen = path::select_live(confidence, ml_score, consecutive);

        if hits > PREDICTION_CACHE_MIN_HITS {
            self.prediction_cache.store(key.0, ml_score, chosen, now, confidence);
        }

        (chosen, Some(ml_score))
    }

    /// Re-consults the classifier for the `Path::Adaptive` cost body,
    /// which runs `Fast` above 0.75 and `Accelerated` otherwise (§4.8).
    fn live_ml_score(&mut self, idx: PoolIndex, now: f64) -> f64 {
        let features = classifier::extract_features(self.table.get(idx), now);
        self.model.predict(features)
    }

    /// §4.7's burst-gated promotion: consulted after every packet when a
    /// burst is currently active, independent of the path-selection tree.
    fn maybe_apply_burst_promotion(&mut self, idx: PoolIndex, now: f64) {
        if !self.aging.burst_active() {
            return;
        }
        let (ml_score, consecutive) = {
            let record = self.table.get(idx);
            let features = classifier::extract_features(record, now);
            (self.model.predict(features), record.pattern.consecutive_fast_paths)
        };

        let record = self.table.get_mut(idx);
        if ml_score >= BURST_PROMOTE_ML && consecutive >= BURST_PROMOTE_CONSECUTIVE {
            record.confidence = BURST_PROMOTE_CONFIDENCE;
            record.previous_type = record.flow_type;
            record.flow_type = FlowType::Promoted;
        } else if ml_score >= BURST_BUMP_ML && consecutive >= BURST_BUMP_CONSECUTIVE {
            record.confidence = BURST_BUMP_CONFIDENCE;
            record.previous_type = record.flow_type;
            record.flow_type = FlowType::Bursty;
        }
        record.clamp_confidence();
    }

    /// Assembles the end-of-run report (§6): configuration echo,
    /// throughput, per-path breakdown, cache/index rates, classifier
    /// state, aging/lifecycle state, and per-flow-type and
    /// pattern-analysis summaries scanned off the current pool.
    pub fn report(&self, known_count: usize, packet_count: usize, key_range: u32) -> crate::stats::Report {
        use crate::stats::{summarize_flow_types, summarize_patterns, PathBreakdown};

        let total = self.stats.total_packets().max(1);
        let elapsed = self.stats.elapsed_seconds().max(f64::EPSILON);

        let path_breakdown = Path::REPORT_ORDER
            .iter()
            .map(|&p| {
                let count = self.stats.path_count(p);
                PathBreakdown {
                    path: p,
                    count,
                    percent: 100.0 * count as f64 / total as f64,
                }
            })
            .collect();

        let now = self.clock.now_seconds();
        let live: Vec<&FlowRecord> = self.table.iter_live().collect();
        let ml_scores: Vec<f64> = live
            .iter()
            .map(|r| self.model.score(classifier::extract_features(r, now)))
            .collect();

        crate::stats::Report {
            known_count,
            packet_count,
            key_range,
            elapsed_seconds: elapsed,
            throughput_pps: total as f64 / elapsed,
            throughput_mpps: total as f64 / elapsed / 1_000_000.0,
            path_breakdown,
            fast_cache_hit_rate: self.table.fast_cache_hit_rate(),
            chain_collision_rate: self.table.chain_collision_rate(),
            validation_accuracy: self.model.last_accuracy(),
            validation_samples: self.model.validation_samples(),
            learning_rate: self.model.learning_rate(),
            total_predictions: self.model.total_predictions(),
            prediction_cache_hit_rate: self.prediction_cache.hit_rate(),
            memory_utilization: self.aging.memory_utilization(),
            aging_pressure: self.aging.aging_pressure(),
            promotions: self.aging.promotions(),
            demotions: self.aging.demotions(),
            aged_out: self.aging.aged_out(),
            burst_rate: self.aging.burst_rate(),
            flow_type_summary: summarize_flow_types(&live, &ml_scores),
            pattern_summary: summarize_patterns(&live),
        }
    }

    fn maybe_run_periodic_tasks(&mut self, now: f64) {
        let pool_index = self.table.pool_index();
        let pool_size = self.table.pool_size();

        self.aging.maybe_run_cycle(
            self.total_processed,
            now,
            self.table.pool_slots(),
            pool_index,
            pool_size,
            &mut self.model,
        );

        if self.total_processed % classifier::ADAPT_INTERVAL_PACKETS == 0 {
            self.model.adapt();
        }

        if lifecycle::is_due(self.total_processed) {
            lifecycle::run_sweep(
                self.table.pool_slots(),
                pool_index,
                self.config.lifecycle_scan_limit,
                now,
                &mut self.model,
                &mut self.aging,
            );
        }
    }
}
