//! Retirement registry port.

use crate::error::ServiceError;
use offset_types::{Amount, AssetId};

/// Permanently consumes certificate assets held by custody.
///
/// Calls are not idempotent: each successful call retires `amount` again.
pub trait RetirementService {
    fn retire(&mut self, certificate: &AssetId, amount: Amount) -> Result<(), ServiceError>;
}
