use flowpath::config::EngineConfig;
use flowpath::flow::FlowKey;
use flowpath::pipeline::FlowPipeline;

fn main() {
    println!("Flowpath Adaptive Classification Engine - Basic Usage");
    println!("=======================================================");

    let mut engine = FlowPipeline::new(EngineConfig::default());

    println!("\nPre-populating known flows:");
    for key in [7u32, 100, 4242] {
        engine.load_known_flow(FlowKey(key));
        println!("  admitted known flow {key}");
    }

    println!("\nReplaying a packet stream:");
    for key in [7u32, 7, 7, 100, 500, 500, 500, 500, 500] {
        let outcome = engine.process(FlowKey(key));
        println!(
            "  key={key:<6} path={:<12} cost_units={}",
            outcome.path.to_string(),
            outcome.cost_units
        );
    }

    println!("\nHammering a single key to watch it graduate paths:");
    for i in 0..50 {
        let outcome = engine.process(FlowKey(9000));
        if i % 10 == 0 {
            println!("  packet {i:>3}: path={}", outcome.path);
        }
    }

    let report = engine.report(3, 50 + 9, 20_000);
    println!("\n{report}");
}
