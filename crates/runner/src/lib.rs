//! flashroute runner
//!
//! Wires the quote client, proof pipeline and bundle submitter into a
//! single-shot cycle driven by [`PipelineConfig`].

pub mod config;
pub mod pipeline;
pub mod run;

pub use config::{Credentials, PipelineConfig};
pub use pipeline::{LivePipeline, Pipeline};
pub use run::{live_cycle, run, RunOptions};
