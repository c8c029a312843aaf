use thiserror::Error;

/// Errors surfaced while loading the input dataset. Nothing inside the
/// per-packet pipeline returns `Result` — resource exhaustion, classifier
/// pathologies, and clock regressions are handled silently per the error
/// policy documented on `FlowPipeline`.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("input file not found: {path}")]
    InputNotFound { path: String },

    #[error("{path}:{line}: malformed header, expected `KNOWN_COUNT NUM_PACKETS IP_RANGE`")]
    MalformedHeader { path: String, line: usize },

    #[error("{path}:{line}: expected a flow key, found invalid data")]
    MalformedKey { path: String, line: usize },

    #[error("{path}: stream ended early, expected {expected} more records, found {got}")]
    TruncatedStream {
        path: String,
        expected: usize,
        got: usize,
    },

    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
