//! What gets cached and where: compares repeated lookups of the same key
//! (fast-cache-resident) against round-robin lookups across many keys
//! (which thrash the single-entry fast-cache slots).

use flowpath::config::EngineConfig;
use flowpath::flow::FlowKey;
use flowpath::pipeline::FlowPipeline;
use std::time::Instant;

fn main() {
    println!("CACHE ANALYSIS - fast cache vs hash-chain lookups");
    println!("==================================================");

    let num_keys = 4096u32;
    let iterations = 200_000u64;

    let mut engine = FlowPipeline::new(EngineConfig::default());
    for k in 0..num_keys {
        engine.process(FlowKey(k));
    }

    println!("\nTest 1: same key repeated ({iterations} packets)");
    let start = Instant::now();
    for _ in 0..iterations {
        engine.process(FlowKey(0));
    }
    let same_key = start.elapsed();
    println!(
        "  {:.1} ns/packet",
        same_key.as_nanos() as f64 / iterations as f64
    );

    println!("\nTest 2: round-robin across {num_keys} keys ({iterations} packets)");
    let start = Instant::now();
    for i in 0..iterations {
        engine.process(FlowKey((i % num_keys as u64) as u32));
    }
    let round_robin = start.elapsed();
    println!(
        "  {:.1} ns/packet",
        round_robin.as_nanos() as f64 / iterations as f64
    );

    println!(
        "\nfast-cache hit rate: {:.2}%",
        engine.table().fast_cache_hit_rate() * 100.0
    );
    println!(
        "hash-chain collision rate: {:.2}%",
        engine.table().chain_collision_rate() * 100.0
    );
}
