//! The processing paths a packet can be routed onto, in increasing cost
//! order, and the (stand-in) cost functions attached to each.

use std::fmt;

/// A per-packet processing path. Ordered by relative cost:
/// `UltraFast < Fast < Accelerated < Slow ~= DeepAnalysis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Path {
    UltraFast,
    Fast,
    Accelerated,
    Slow,
    Adaptive,
    DeepAnalysis,
}

impl Path {
    /// All concrete (non-Adaptive) paths, in the order the end-of-run
    /// report lists them.
    pub const REPORT_ORDER: [Path; 6] = [
        Path::UltraFast,
        Path::Fast,
        Path::Accelerated,
        Path::Slow,
        Path::Adaptive,
        Path::DeepAnalysis,
    ];

    #[inline(always)]
    pub fn is_fast_ish(&self) -> bool {
        matches!(self, Path::UltraFast | Path::Fast)
    }

    #[inline(always)]
    pub fn is_slow_ish(&self) -> bool {
        matches!(self, Path::Slow | Path::DeepAnalysis)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Path::UltraFast => "UltraFast",
            Path::Fast => "Fast",
            Path::Accelerated => "Accelerated",
            Path::Slow => "Slow",
            Path::Adaptive => "Adaptive",
            Path::DeepAnalysis => "DeepAnalysis",
        };
        f.write_str(s)
    }
}

/// Opaque cost bodies preserving the relative cost contract
/// `UltraFast < Fast < Accelerated < Slow ~= DeepAnalysis`. These are real
/// (if pointless) CPU work rather than sleeps, since the pipeline never
/// blocks on I/O.
#[inline(always)]
pub fn ultra_fast(_key: u32) -> u64 {
    0
}

#[inline(always)]
pub fn fast(key: u32) -> u64 {
    (key as u64).wrapping_mul(3)
}

#[inline(always)]
pub fn accelerated(key: u32) -> u64 {
    trial_divisions(key, (key as f64).sqrt().min(10.0) as u64)
}

#[inline(always)]
pub fn slow(key: u32) -> u64 {
    trial_divisions(key, (key as f64).sqrt() as u64)
}

#[inline(always)]
pub fn deep_analysis(key: u32) -> u64 {
    trial_divisions(key, (key as f64).sqrt() as u64)
}

#[inline(always)]
fn trial_divisions(key: u32, bound: u64) -> u64 {
    let k = key as u64;
    let mut divisors = 0u64;
    let mut i = 1u64;
    while i <= bound.max(1) {
        if k % i.max(1) == 0 {
            divisors += 1;
        }
        i += 1;
    }
    divisors
}

/// Executes the cost stand-in for `path` and returns the resulting cost
/// units, for statistics and benchmarking purposes only. `adaptive_ml`
/// is consulted only for `Path::Adaptive`, which re-consults the
/// classifier internally: above 0.75 it runs the `Fast` body, otherwise
/// the `Accelerated` body (§4.8).
pub fn execute(path: Path, key: u32, adaptive_ml: f64) -> u64 {
    match path {
        Path::UltraFast => ultra_fast(key),
        Path::Fast => fast(key),
        Path::Accelerated => accelerated(key),
        Path::Slow => slow(key),
        Path::Adaptive => {
            if adaptive_ml > 0.75 {
                fast(key)
            } else {
                accelerated(key)
            }
        }
        Path::DeepAnalysis => deep_analysis(key),
    }
}

/// §4.8 rule 1: a flow exists, has `hits > 2`, and has a fresh prediction
/// cache entry — bucket the cached score.
pub fn select_from_cached_score(cached_score: f64) -> Path {
    if cached_score > 0.8 {
        Path::UltraFast
    } else if cached_score > 0.6 {
        Path::Fast
    } else if cached_score > 0.4 {
        Path::Accelerated
    } else {
        Path::Adaptive
    }
}

/// §4.8 rule 2: no flow record exists for this key yet.
pub fn select_for_new_flow(sketch_count: u32) -> Path {
    if sketch_count > 8 {
        Path::Accelerated
    } else {
        Path::Slow
    }
}

/// §4.8 rule 4: an existing, non-cached flow past its first packet.
pub fn select_live(confidence: i32, ml_score: f64, consecutive_fast_paths: u32) -> Path {
    if confidence >= 85 && ml_score > 0.7 {
        Path::UltraFast
    } else if confidence >= 60 && ml_score > 0.5 {
        Path::Fast
    } else if ml_score > 0.6 || consecutive_fast_paths >= 3 {
        Path::Adaptive
    } else {
        Path::Accelerated
    }
}
