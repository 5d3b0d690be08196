//! Core models for the flashroute pipeline
//!
//! This crate defines the data structures passed between pipeline stages:
//! - Assets, the token catalog and the anchor set
//! - Ordered pairs, quotes and their log-weights
//! - The fixed-width routing array fed to the circuit
//! - Bundle submission outcomes and the records written to the run logs

mod asset;
mod outcome;
mod pair;
mod quote;
mod record;
mod routing;

pub use asset::*;
pub use outcome::*;
pub use pair::*;
pub use quote::*;
pub use record::*;
pub use routing::*;
