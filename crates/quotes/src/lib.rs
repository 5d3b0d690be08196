//! Price discovery for the flashroute pipeline
//!
//! Samples a candidate asset set, prices every ordered pair through a
//! rate-limited quote service and turns prices into log-weights. The same
//! client fetches swap call data, retrying rate-limit rejections with
//! exponential backoff.

use thiserror::Error;

mod client;
mod rate_limit;
mod sampler;
mod transport;
mod weigher;

pub use client::{QuoteClient, RetryPolicy, SwapData, SwapRequest};
pub use rate_limit::RateLimiter;
pub use sampler::{CandidateSampler, SamplerError, SAMPLE_SIZE};
pub use transport::{Endpoint, HttpTransport, QuoteTransport, TransportResponse};
pub use weigher::RouteWeigher;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Quote API error: {0}")]
    ApiError(String),
    #[error("Failed to parse quote response: {0}")]
    ParseError(String),
    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },
}
