//! Adaptive flow classification and path-selection engine.
//!
//! The engine classifies each incoming [`FlowKey`] into one of several
//! processing paths of increasing cost (see [`path::Path`]), learning
//! from observed traffic so that as many packets as possible stay on the
//! cheapest paths. The whole per-packet pipeline — flow lookup/creation,
//! counter and pattern updates, path selection, burst detection, and the
//! periodic aging/lifecycle sweeps — is driven through
//! [`pipeline::FlowPipeline::process`].
//!
//! ```
//! use flowpath::{config::EngineConfig, flow::FlowKey, pipeline::FlowPipeline};
//!
//! let mut engine = FlowPipeline::new(EngineConfig::default());
//! engine.load_known_flow(FlowKey(7));
//! let outcome = engine.process(FlowKey(7));
//! println!("routed to {}", outcome.path);
//! ```

pub mod aging;
pub mod burst;
pub mod classifier;
pub mod clock;
pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod hashing;
pub mod input;
pub mod lifecycle;
pub mod path;
pub mod pattern;
pub mod pipeline;
pub mod sketch;
pub mod stats;
pub mod table;

pub use config::EngineConfig;
pub use error::FlowError;
pub use flow::{FlowKey, FlowRecord, FlowType};
pub use path::Path;
pub use pipeline::{FlowPipeline, PacketOutcome};
pub use stats::Report;
