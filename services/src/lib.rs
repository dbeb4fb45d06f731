//! Port traits for everything outside the orchestration core.
//!
//! The aggregator never talks to a concrete router, pool, or registry. It
//! depends only on these traits; production adapters and the deterministic
//! fakes in `offset-nullables` both implement them.
//!
//! All calls are synchronous: a call returns only with its definitive
//! outcome. Atomicity comes from [`ChainState`]: the caller takes a
//! checkpoint before a workflow and either releases it on success or
//! reverts every external effect back to it on failure.

pub mod chain;
pub mod custody;
pub mod error;
pub mod redemption;
pub mod retirement;
pub mod swap;

pub use chain::{ChainState, Checkpoint};
pub use custody::{Custody, Holder};
pub use error::ServiceError;
pub use redemption::{Redemption, RedemptionService};
pub use retirement::RetirementService;
pub use swap::{ExactInputOrder, ExactOutputOrder, Funding, SwapRouter};

/// Everything a workflow needs from its environment.
pub trait Host: ChainState + Custody + SwapRouter + RedemptionService + RetirementService {}

impl<T> Host for T where T: ChainState + Custody + SwapRouter + RedemptionService + RetirementService {}
