//! CLI surface (§6): zero or one positional argument — the dataset path,
//! defaulting to `dataset.txt` — plus `-h`/`--help` for free via `clap`.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "flowpath",
    about = "Adaptive flow classification and path-selection engine"
)]
pub struct Cli {
    /// Path to the input dataset (`KNOWN_COUNT NUM_PACKETS IP_RANGE` header,
    /// then `KNOWN_COUNT` known-flow keys, then `NUM_PACKETS` packet keys).
    #[arg(default_value = "dataset.txt")]
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_dataset_txt() {
        let cli = Cli::try_parse_from(["flowpath"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("dataset.txt"));
    }

    #[test]
    fn accepts_one_positional_path() {
        let cli = Cli::try_parse_from(["flowpath", "custom.txt"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("custom.txt"));
    }

    #[test]
    fn rejects_more_than_one_positional_argument() {
        let result = Cli::try_parse_from(["flowpath", "a.txt", "b.txt"]);
        assert!(result.is_err());
    }
}
