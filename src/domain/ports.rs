use super::identity::Identity;
use super::ledger::{Block, BlockRange};
use super::order::{Memo, PaymentOrder};
use super::task::{Task, TaskId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// The two payment-order maps: short-lived unpaid reservations (pending,
/// keyed by memo) and durable paid history (settled, keyed by payer).
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_pending(&self, order: PaymentOrder) -> Result<()>;

    /// Atomic remove-if-present. Both the claim path and the expiry path go
    /// through this call, so exactly one of two racing removals for the same
    /// memo observes the order.
    async fn remove_pending(&self, memo: Memo) -> Result<Option<PaymentOrder>>;

    async fn get_pending(&self, memo: Memo) -> Result<Option<PaymentOrder>>;

    /// Keyed by payer; overwrites any prior settled order for that payer,
    /// so only the most recent paid order persists.
    async fn insert_settled(&self, order: PaymentOrder) -> Result<()>;

    async fn get_settled(&self, payer: &Identity) -> Result<Option<PaymentOrder>>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn store(&self, task: Task) -> Result<()>;
    async fn get(&self, id: TaskId) -> Result<Option<Task>>;
    async fn remove(&self, id: TaskId) -> Result<Option<Task>>;
    async fn all_ids(&self) -> Result<Vec<TaskId>>;
}

/// Secondary lookup from owner identity to the ordered list of task ids
/// that identity owns. Kept consistent with the task store by convention
/// only; there is no cross-store transaction.
#[async_trait]
pub trait OwnerIndex: Send + Sync {
    /// Empty when the owner has no entry; never errors on unknown owners.
    async fn ids_for(&self, owner: &Identity) -> Result<Vec<TaskId>>;
    async fn store(&self, owner: Identity, ids: Vec<TaskId>) -> Result<()>;
    async fn owners(&self) -> Result<Vec<Identity>>;
}

/// Consumer-side view of the external ledger. The only suspension point in
/// the request flow is the query issued through this port.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn query_blocks(&self, range: BlockRange) -> Result<Vec<Block>>;
}

/// Current time, injectable so correlation tokens and timestamps are
/// deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// Shared trait objects. The expiry scheduler clones the order store into
// spawned timers, hence Arc rather than Box.
pub type OrderStoreArc = Arc<dyn OrderStore>;
pub type TaskStoreArc = Arc<dyn TaskStore>;
pub type OwnerIndexArc = Arc<dyn OwnerIndex>;
pub type LedgerClientArc = Arc<dyn LedgerClient>;
pub type ClockArc = Arc<dyn Clock>;
