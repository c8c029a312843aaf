use clap::{error::ErrorKind, Parser};
use flowpath::cli::Cli;
use flowpath::config::EngineConfig;
use flowpath::input;
use flowpath::pipeline::FlowPipeline;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return ExitCode::SUCCESS;
            }
            _ => {
                eprint!("{err}");
                return ExitCode::FAILURE;
            }
        },
    };

    match run(&cli.path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path) -> Result<(), flowpath::FlowError> {
    log::debug!("loading dataset from {}", path.display());
    let dataset = input::load_dataset(path)?;

    let mut engine = FlowPipeline::new(EngineConfig::default());

    for key in &dataset.known {
        engine.load_known_flow(*key);
    }
    log::debug!("admitted {} pre-populated flows", dataset.known.len());

    for key in &dataset.packets {
        engine.process(*key);
    }

    let report = engine.report(dataset.known.len(), dataset.packets.len(), dataset.key_range);
    println!("{report}");

    Ok(())
}
