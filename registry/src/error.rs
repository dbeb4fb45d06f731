use offset_types::{AssetId, Capability};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("asset symbol {0} is already registered")]
    DuplicateSymbol(String),

    #[error("asset {id} is already registered as {existing}, cannot also be {requested}")]
    CapabilityConflict {
        id: AssetId,
        existing: Capability,
        requested: Capability,
    },

    #[error("asset symbol {0} not found")]
    NotFound(String),
}
