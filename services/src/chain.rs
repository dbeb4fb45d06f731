//! Execution-environment hooks: block time and all-or-nothing checkpoints.

use crate::error::ServiceError;
use offset_types::Timestamp;

/// Opaque handle to a point the environment can revert to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Checkpoint(pub u64);

/// The atomic-operation semantics of the environment.
///
/// Checkpoints nest: reverting to an outer checkpoint discards every inner
/// one taken after it.
pub trait ChainState {
    /// Time of the block the current operation executes in.
    fn block_time(&self) -> Timestamp;

    /// Mark the current external state.
    fn checkpoint(&mut self) -> Checkpoint;

    /// Undo every external effect made since `checkpoint`.
    fn revert_to(&mut self, checkpoint: Checkpoint) -> Result<(), ServiceError>;

    /// Keep every effect made since `checkpoint` and forget the mark.
    fn release(&mut self, checkpoint: Checkpoint) -> Result<(), ServiceError>;
}
