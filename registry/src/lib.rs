//! Eligibility registry: the curated allow-list.
//!
//! Maps symbolic names to asset identifiers, each tagged with exactly one
//! capability. The swappable and redeemable sets are disjoint by
//! construction: an identifier can appear under one capability only.
//!
//! Workflows never read the registry directly. They receive an
//! [`EligibilitySnapshot`], a frozen and versioned copy taken before the
//! workflow starts, so administrative edits cannot change eligibility
//! mid-operation.

pub mod error;
pub mod registry;
pub mod snapshot;

pub use error::RegistryError;
pub use registry::EligibilityRegistry;
pub use snapshot::EligibilitySnapshot;
