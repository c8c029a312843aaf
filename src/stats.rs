//! Per-packet counters accumulated during a run, and the end-of-run
//! textual report assembled from them plus a final scan of the flow pool.

use crate::flow::{FlowType, FlowRecord};
use crate::path::Path;
use std::fmt;
use std::time::Instant;

const PATH_VARIANTS: usize = 6;

/// Running counters updated once per packet. Cheap enough (array index +
/// increment) to live on the hot path.
#[derive(Debug, Clone)]
pub struct Statistics {
    path_counts: [u64; PATH_VARIANTS],
    create_refusals: u64,
    run_started: Instant,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            path_counts: [0; PATH_VARIANTS],
            create_refusals: 0,
            run_started: Instant::now(),
        }
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn record_path(&mut self, path: Path) {
        let idx = Path::REPORT_ORDER
            .iter()
            .position(|p| *p == path)
            .expect("Path::REPORT_ORDER covers every variant");
        self.path_counts[idx] += 1;
    }

    pub fn record_create_refusal(&mut self) {
        self.create_refusals += 1;
    }

    pub fn path_count(&self, path: Path) -> u64 {
        let idx = Path::REPORT_ORDER
            .iter()
            .position(|p| *p == path)
            .expect("Path::REPORT_ORDER covers every variant");
        self.path_counts[idx]
    }

    pub fn total_packets(&self) -> u64 {
        self.path_counts.iter().sum()
    }

    pub fn create_refusals(&self) -> u64 {
        self.create_refusals
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.run_started.elapsed().as_secs_f64()
    }
}

/// Per-flow-type aggregate for the end-of-run report.
#[derive(Debug, Clone, Copy)]
pub struct FlowTypeSummary {
    pub flow_type: FlowType,
    pub count: usize,
    pub mean_confidence: f64,
    pub mean_ml_score: f64,
    pub mean_promotion_score: f64,
}

/// Aggregate pattern-tracker statistics across live flows.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternSummary {
    pub flows_with_patterns: usize,
    pub mean_consistency: f64,
    pub high_consistency_count: usize,
    pub mean_burst_score: f64,
}

/// One line of the per-path breakdown.
#[derive(Debug, Clone, Copy)]
pub struct PathBreakdown {
    pub path: Path,
    pub count: u64,
    pub percent: f64,
}

/// The full end-of-run report described in spec §6.
#[derive(Debug, Clone)]
pub struct Report {
    pub known_count: usize,
    pub packet_count: usize,
    pub key_range: u32,

    pub elapsed_seconds: f64,
    pub throughput_pps: f64,
    pub throughput_mpps: f64,

    pub path_breakdown: Vec<PathBreakdown>,

    pub fast_cache_hit_rate: f64,
    pub chain_collision_rate: f64,

    pub validation_accuracy: f64,
    pub validation_samples: u64,
    pub learning_rate: f64,
    pub total_predictions: u64,
    pub prediction_cache_hit_rate: f64,

    pub memory_utilization: f64,
    pub aging_pressure: f64,
    pub promotions: u64,
    pub demotions: u64,
    pub aged_out: u64,
    pub burst_rate: f64,

    pub flow_type_summary: Vec<FlowTypeSummary>,
    pub pattern_summary: PatternSummary,
}

/// Scans `records` once, producing the per-flow-type and pattern
/// summaries. `ml_scores` supplies a pre-computed classifier score per
/// record (same order/length as `records`) so the report need not call
/// back into the model during iteration.
pub fn summarize_flow_types(records: &[&FlowRecord], ml_scores: &[f64]) -> Vec<FlowTypeSummary> {
    FlowType::ALL
        .iter()
        .filter_map(|&ft| {
            let mut count = 0usize;
            let mut confidence_sum = 0f64;
            let mut ml_sum = 0f64;
            let mut promotion_sum = 0f64;
            for (record, score) in records.iter().zip(ml_scores.iter()) {
                if record.flow_type == ft {
                    count += 1;
                    confidence_sum += record.confidence as f64;
                    ml_sum += score;
                    promotion_sum += record.promotion_score as f64;
                }
            }
            if count == 0 {
                return None;
            }
            Some(FlowTypeSummary {
                flow_type: ft,
                count,
                mean_confidence: confidence_sum / count as f64,
                mean_ml_score: ml_sum / count as f64,
                mean_promotion_score: promotion_sum / count as f64,
            })
        })
        .collect()
}

pub fn summarize_patterns(records: &[&FlowRecord]) -> PatternSummary {
    let with_patterns: Vec<&&FlowRecord> = records
        .iter()
        .filter(|r| r.pattern.is_filled() || r.hits >= 4)
        .collect();
    let flows_with_patterns = with_patterns.len();
    if flows_with_patterns == 0 {
        return PatternSummary::default();
    }
    let consistency_sum: f64 = with_patterns.iter().map(|r| r.pattern.path_consistency).sum();
    let burst_sum: f64 = with_patterns.iter().map(|r| r.pattern.burst_score).sum();
    let high_consistency_count = with_patterns
        .iter()
        .filter(|r| r.pattern.path_consistency > 0.8)
        .count();
    PatternSummary {
        flows_with_patterns,
        mean_consistency: consistency_sum / flows_with_patterns as f64,
        high_consistency_count,
        mean_burst_score: burst_sum / flows_with_patterns as f64,
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Configuration ===")?;
        writeln!(
            f,
            "known flows: {}  packets: {}  key range: {}",
            self.known_count, self.packet_count, self.key_range
        )?;
        writeln!(f)?;

        writeln!(f, "=== Throughput ===")?;
        writeln!(f, "elapsed: {:.3}s", self.elapsed_seconds)?;
        writeln!(
            f,
            "throughput: {:.0} pkt/s ({:.3} Mpps)",
            self.throughput_pps, self.throughput_mpps
        )?;
        writeln!(f)?;

        writeln!(f, "=== Path Breakdown ===")?;
        for b in &self.path_breakdown {
            writeln!(f, "{:<12} {:>10}  ({:>5.1}%)", b.path.to_string(), b.count, b.percent)?;
        }
        writeln!(f)?;

        writeln!(f, "=== Cache & Index ===")?;
        writeln!(f, "fast-cache hit rate: {:.2}%", self.fast_cache_hit_rate * 100.0)?;
        writeln!(f, "hash-chain collision rate: {:.2}%", self.chain_collision_rate * 100.0)?;
        writeln!(f)?;

        writeln!(f, "=== Classifier ===")?;
        writeln!(
            f,
            "validation accuracy: {:.2}% ({} samples; note: this measures agreement with \
             the classifier's own routing decisions, not ground truth)",
            self.validation_accuracy * 100.0,
            self.validation_samples
        )?;
        writeln!(f, "learning rate: {:.6}", self.learning_rate)?;
        writeln!(f, "total predictions: {}", self.total_predictions)?;
        writeln!(f, "prediction-cache hit rate: {:.2}%", self.prediction_cache_hit_rate * 100.0)?;
        writeln!(f)?;

        writeln!(f, "=== Aging & Lifecycle ===")?;
        writeln!(f, "memory utilization: {:.2}%", self.memory_utilization * 100.0)?;
        writeln!(f, "aging pressure: {:.2}", self.aging_pressure)?;
        writeln!(
            f,
            "promotions: {}  demotions: {}  aged out: {}",
            self.promotions, self.demotions, self.aged_out
        )?;
        writeln!(f, "current burst rate: {:.2} pkt/s", self.burst_rate)?;
        writeln!(f)?;

        writeln!(f, "=== Flow Types ===")?;
        for s in &self.flow_type_summary {
            writeln!(
                f,
                "{:<10} count={:<8} mean_confidence={:.1} mean_ml_score={:.3} mean_promotion_score={:.1}",
                format!("{:?}", s.flow_type),
                s.count,
                s.mean_confidence,
                s.mean_ml_score,
                s.mean_promotion_score
            )?;
        }
        writeln!(f)?;

        writeln!(f, "=== Pattern Analysis ===")?;
        writeln!(
            f,
            "flows with patterns: {}  mean consistency: {:.3}  consistency>0.8: {}  mean burst score: {:.3}",
            self.pattern_summary.flows_with_patterns,
            self.pattern_summary.mean_consistency,
            self.pattern_summary.high_consistency_count,
            self.pattern_summary.mean_burst_score
        )
    }
}
