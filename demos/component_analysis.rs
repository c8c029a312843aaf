//! Isolates the per-packet cost of each pipeline stage by timing
//! increasingly complete slices of `FlowPipeline::process`'s work:
//! sketch update alone, sketch + lookup, and the full pipeline.

use flowpath::flow::FlowKey;
use flowpath::hashing::mix;
use flowpath::sketch::CountMinSketch;
use flowpath::{config::EngineConfig, pipeline::FlowPipeline};
use std::time::Instant;

fn main() {
    println!("=== Component Performance Analysis ===\n");

    for packet_count in [1_000usize, 10_000, 100_000] {
        analyze(packet_count);
        println!();
    }
}

fn analyze(packet_count: usize) {
    println!("packets: {packet_count}");

    let start = Instant::now();
    let mut sketch = CountMinSketch::new();
    for k in 0..packet_count as u32 {
        sketch.update(FlowKey(k));
    }
    println!(
        "  sketch.update only:    {:.1} ns/packet",
        start.elapsed().as_nanos() as f64 / packet_count as f64
    );

    let start = Instant::now();
    for k in 0..packet_count as u32 {
        std::hint::black_box(mix(k));
    }
    println!(
        "  hash mix only:         {:.1} ns/packet",
        start.elapsed().as_nanos() as f64 / packet_count as f64
    );

    let mut engine = FlowPipeline::new(EngineConfig::default());
    let start = Instant::now();
    for k in 0..packet_count as u32 {
        engine.process(FlowKey(k));
    }
    println!(
        "  full pipeline.process: {:.1} ns/packet",
        start.elapsed().as_nanos() as f64 / packet_count as f64
    );
}
