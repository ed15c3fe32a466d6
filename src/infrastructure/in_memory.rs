use crate::domain::identity::{Address, Identity};
use crate::domain::ledger::{Block, BlockRange};
use crate::domain::order::{Memo, PaymentOrder};
use crate::domain::ports::{LedgerClient, OrderStore, OwnerIndex, TaskStore};
use crate::domain::task::{Task, TaskId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory order store.
///
/// Pending and settled are independent maps behind their own locks; the
/// write-locked `HashMap::remove` is the atomic remove-if-present primitive
/// the claim and expiry paths race through.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    pending: Arc<RwLock<HashMap<Memo, PaymentOrder>>>,
    settled: Arc<RwLock<HashMap<Identity, PaymentOrder>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert_pending(&self, order: PaymentOrder) -> Result<()> {
        let mut pending = self.pending.write().await;
        pending.insert(order.memo, order);
        Ok(())
    }

    async fn remove_pending(&self, memo: Memo) -> Result<Option<PaymentOrder>> {
        let mut pending = self.pending.write().await;
        Ok(pending.remove(&memo))
    }

    async fn get_pending(&self, memo: Memo) -> Result<Option<PaymentOrder>> {
        let pending = self.pending.read().await;
        Ok(pending.get(&memo).cloned())
    }

    async fn insert_settled(&self, order: PaymentOrder) -> Result<()> {
        let mut settled = self.settled.write().await;
        settled.insert(order.payer.clone(), order);
        Ok(())
    }

    async fn get_settled(&self, payer: &Identity) -> Result<Option<PaymentOrder>> {
        let settled = self.settled.read().await;
        Ok(settled.get(payer).cloned())
    }
}

/// Thread-safe in-memory task store.
#[derive(Default, Clone)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn store(&self, task: Task) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id, task);
        Ok(())
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).cloned())
    }

    async fn remove(&self, id: TaskId) -> Result<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.remove(&id))
    }

    async fn all_ids(&self) -> Result<Vec<TaskId>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.keys().copied().collect())
    }
}

/// Thread-safe in-memory owner index.
#[derive(Default, Clone)]
pub struct InMemoryOwnerIndex {
    entries: Arc<RwLock<HashMap<Identity, Vec<TaskId>>>>,
}

impl InMemoryOwnerIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OwnerIndex for InMemoryOwnerIndex {
    async fn ids_for(&self, owner: &Identity) -> Result<Vec<TaskId>> {
        let entries = self.entries.read().await;
        Ok(entries.get(owner).cloned().unwrap_or_default())
    }

    async fn store(&self, owner: Identity, ids: Vec<TaskId>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(owner, ids);
        Ok(())
    }

    async fn owners(&self) -> Result<Vec<Identity>> {
        let entries = self.entries.read().await;
        Ok(entries.keys().cloned().collect())
    }
}

/// Scriptable in-memory ledger for tests and the demo binary.
///
/// Blocks are keyed by height; `query_blocks` returns whatever part of the
/// requested window exists, in height order.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    blocks: Arc<RwLock<HashMap<u64, Block>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_block(&self, height: u64, block: Block) {
        let mut blocks = self.blocks.write().await;
        blocks.insert(height, block);
    }

    pub async fn push_transfer(
        &self,
        height: u64,
        from: Address,
        to: Address,
        amount: u64,
        memo: u64,
    ) {
        self.push_block(height, Block::transfer(from, to, amount, memo))
            .await;
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn query_blocks(&self, range: BlockRange) -> Result<Vec<Block>> {
        let blocks = self.blocks.read().await;
        let end = range.start.saturating_add(range.length);
        Ok((range.start..end)
            .filter_map(|height| blocks.get(&height).cloned())
            .collect())
    }
}
