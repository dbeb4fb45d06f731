//! Orchestration core of the offset aggregator.
//!
//! A depositor pays with a curated token, native value, or a pool asset and,
//! in one atomic invocation, ends up with certificate assets retired on their
//! behalf. The pieces, leaves first:
//!
//! - [`ConversionPlanner`]: deterministic paths and verified quotes.
//! - swap, redeem and retire executors: single steps over a staged ledger.
//! - [`Workflow`]: the five composite workflows as one pipeline.
//! - [`OffsetAggregator`]: the caller-facing surface and the atomic runner.
//!
//! External collaborators are reached only through the
//! [`offset_services::Host`] port.

pub mod aggregator;
pub mod config;
mod context;
mod deposit;
pub mod error;
pub mod planner;
pub mod records;
mod redeem;
pub mod retire;
pub mod swap;
pub mod workflow;

pub use aggregator::{OffsetAggregator, STAT_COMMITTED, STAT_REVERTED, STAT_UNITS_RETIRED};
pub use config::{AggregatorConfig, ConfigError, RoutingConfig};
pub use error::EngineError;
pub use planner::{ConversionPlanner, Payment, Quote, Routing};
pub use records::{AuditEvent, AuditJournal, AuditRecord, RecordId};
pub use retire::Retirement;
pub use swap::{Funds, SwapOutcome};
pub use workflow::{Sizing, Workflow, WorkflowKind, WorkflowReceipt};
