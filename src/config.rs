use crate::error::{PaygateError, Result};
use std::time::Duration;

/// Expiry window for unpaid reservations.
pub const DEFAULT_EXPIRY_WINDOW: Duration = Duration::from_secs(120);

/// Fee configuration, in ledger units.
///
/// Set exactly once when the service is constructed and immutable
/// thereafter. A fee left unconfigured is not treated as zero: operations
/// that require it fail with `NotFound("fee not set")`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeConfig {
    pub add_resource_fee: Option<u64>,
    pub verify_fee: Option<u64>,
    pub add_task_fee: Option<u64>,
}

impl FeeConfig {
    /// Fee charged for creating a task via the reserve/claim flow.
    pub fn require_task_fee(&self) -> Result<u64> {
        self.add_task_fee
            .ok_or_else(|| PaygateError::not_found("fee not set"))
    }
}
