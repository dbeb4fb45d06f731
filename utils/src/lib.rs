//! Shared utilities for the offset aggregator.

pub mod logging;
pub mod stats;

pub use logging::{init_logging, init_tracing, LogFormat, UnknownLogFormat};
pub use stats::StatsCounter;
