use crate::application::correlation::CorrelationIdGenerator;
use crate::application::expiry::ExpiryScheduler;
use crate::application::verifier::LedgerVerifier;
use crate::config::{DEFAULT_EXPIRY_WINDOW, FeeConfig};
use crate::domain::identity::{Address, Identity};
use crate::domain::order::{Memo, PaymentOrder};
use crate::domain::ports::{ClockArc, LedgerClientArc, OrderStoreArc, OwnerIndexArc, TaskStoreArc};
use crate::domain::task::{Task, TaskDraft, TaskId, TaskPatch};
use crate::error::{PaygateError, Result};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

/// Read-only divergence report between the task store and the owner index.
/// Produced by [`TaskService::reconcile`]; nothing is repaired.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Ids listed in some owner's index entry but missing from the store.
    pub indexed_missing: Vec<TaskId>,
    /// Ids present in the store but not indexed under any owner.
    pub unindexed: Vec<TaskId>,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        self.indexed_missing.is_empty() && self.unindexed.is_empty()
    }
}

/// The main entry point for the payment-gated task service.
///
/// `TaskService` owns the storage ports and orchestrates the full flow:
/// reserve order -> (external payment) -> verify -> promote -> create task
/// -> update owner index. Each public operation is the unit of atomicity;
/// the only suspension point is the ledger query inside a claim.
pub struct TaskService {
    config: FeeConfig,
    orders: OrderStoreArc,
    tasks: TaskStoreArc,
    index: OwnerIndexArc,
    verifier: LedgerVerifier,
    correlation: CorrelationIdGenerator,
    expiry: ExpiryScheduler,
    clock: ClockArc,
}

impl TaskService {
    pub fn new(
        config: FeeConfig,
        orders: OrderStoreArc,
        tasks: TaskStoreArc,
        index: OwnerIndexArc,
        ledger: LedgerClientArc,
        clock: ClockArc,
        service_address: Address,
    ) -> Self {
        Self {
            verifier: LedgerVerifier::new(ledger, service_address),
            correlation: CorrelationIdGenerator::new(clock.clone()),
            expiry: ExpiryScheduler::new(orders.clone(), DEFAULT_EXPIRY_WINDOW),
            config,
            orders,
            tasks,
            index,
            clock,
        }
    }

    /// Overrides the expiry window for unpaid reservations.
    pub fn with_expiry_window(mut self, window: Duration) -> Self {
        self.expiry = ExpiryScheduler::new(self.orders.clone(), window);
        self
    }

    /// Reserves a payment order for the caller.
    ///
    /// The returned order carries the memo the payer must embed in their
    /// ledger transfer; it is also the key under which the order waits in
    /// the pending map until claimed or expired.
    pub async fn reserve_order(&self, caller: &Identity) -> Result<PaymentOrder> {
        let fee = self.config.require_task_fee()?;
        let memo = self.correlation.generate("task", caller);
        let order = PaymentOrder::reserve(caller.clone(), fee, memo);
        self.orders.insert_pending(order.clone()).await?;
        // Detached timer; a claim cancels nothing, it just wins the removal.
        let _ = self.expiry.schedule(memo);
        info!(%memo, payer = %caller, fee, "payment order reserved");
        Ok(order)
    }

    /// Presents proof of payment and, on success, creates the gated task.
    ///
    /// `payment_id` is carried for log correlation only; `memo` is the
    /// authoritative match key. Ordering rule: verification suspends, so two
    /// claims for the same memo can both pass it; promotion (removal from
    /// pending) therefore happens strictly before task creation, and only
    /// the claim that wins the removal creates a task.
    pub async fn claim_task(
        &self,
        caller: &Identity,
        draft: TaskDraft,
        payment_id: u64,
        block_height: u64,
        memo: Memo,
    ) -> Result<Task> {
        let fee = self.config.require_task_fee()?;
        debug!(payment_id, %memo, block_height, payer = %caller, "verifying claim");

        // Suspension point: other requests, including a competing claim for
        // this memo, may run to completion while the query is in flight.
        let paid = self
            .verifier
            .verify(caller, fee, block_height, memo)
            .await
            .map_err(|e| PaygateError::not_found(format!("payment unverifiable: {e}")))?;
        if !paid {
            return Err(PaygateError::not_found("payment unverifiable"));
        }

        let order = self.claim_and_promote(memo, block_height).await?;
        let task = self.create_task(order.payer, draft).await?;
        info!(%memo, task_id = %task.id, owner = %task.owner, "claim settled, task created");
        Ok(task)
    }

    /// Moves the order for `memo` from pending to settled.
    ///
    /// The removal is the single non-suspending step that decides races:
    /// a memo absent from pending (never issued, expired, or already
    /// claimed; indistinguishable by design) fails with NotFound.
    async fn claim_and_promote(&self, memo: Memo, block_height: u64) -> Result<PaymentOrder> {
        let Some(mut order) = self.orders.remove_pending(memo).await? else {
            return Err(PaygateError::not_found("order missing or expired"));
        };
        order.promote(block_height);
        self.orders.insert_settled(order.clone()).await?;
        Ok(order)
    }

    async fn create_task(&self, owner: Identity, draft: TaskDraft) -> Result<Task> {
        let task = Task::new(
            TaskId::generate(),
            draft.name,
            draft.description,
            draft.due_date,
            owner.clone(),
            self.clock.now(),
        );
        self.tasks.store(task.clone()).await?;

        // Second, independent write. A failure between the two leaves store
        // and index divergent; `reconcile` reports such divergence.
        let mut ids = self.index.ids_for(&owner).await?;
        if !ids.contains(&task.id) {
            ids.push(task.id);
        }
        self.index.store(owner, ids).await?;
        Ok(task)
    }

    /// Pending -> Completed; requires ownership, terminal.
    pub async fn complete_task(&self, caller: &Identity, id: TaskId) -> Result<()> {
        let mut task = self.fetch_for_owner(caller, id).await?;
        task.complete();
        self.tasks.store(task).await
    }

    /// Applies the present fields of `patch`; absent fields leave the task
    /// unchanged. Requires ownership.
    pub async fn update_task(&self, caller: &Identity, id: TaskId, patch: TaskPatch) -> Result<()> {
        let mut task = self.fetch_for_owner(caller, id).await?;
        patch.apply(&mut task);
        self.tasks.store(task).await
    }

    /// Removes the task and its owner-index entry. Requires ownership.
    pub async fn delete_task(&self, caller: &Identity, id: TaskId) -> Result<()> {
        self.fetch_for_owner(caller, id).await?;
        self.tasks.remove(id).await?;

        let mut ids = self.index.ids_for(caller).await?;
        let before = ids.len();
        ids.retain(|existing| *existing != id);
        if ids.len() == before {
            // The store knew the task but the index did not: divergence
            // predating this call.
            return Err(PaygateError::not_found(format!(
                "task {id} missing from owner index"
            )));
        }
        self.index.store(caller.clone(), ids).await
    }

    /// Ids owned by the caller, in creation order; empty for unknown owners.
    pub async fn list_owned(&self, caller: &Identity) -> Result<Vec<TaskId>> {
        self.index.ids_for(caller).await
    }

    pub async fn get_owned(&self, caller: &Identity, id: TaskId) -> Result<Task> {
        let ids = self.index.ids_for(caller).await?;
        if !ids.contains(&id) {
            return Err(PaygateError::not_found(format!("task {id} not found")));
        }
        match self.tasks.get(id).await? {
            Some(task) => Ok(task),
            // Indexed but missing from the store: divergence.
            None => Err(PaygateError::not_found(format!(
                "task {id} indexed but missing"
            ))),
        }
    }

    /// Walks both maps and reports divergence without repairing anything.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let stored: HashSet<TaskId> = self.tasks.all_ids().await?.into_iter().collect();

        let mut indexed = HashSet::new();
        for owner in self.index.owners().await? {
            for id in self.index.ids_for(&owner).await? {
                indexed.insert(id);
                if !stored.contains(&id) {
                    report.indexed_missing.push(id);
                }
            }
        }
        for id in &stored {
            if !indexed.contains(id) {
                report.unindexed.push(*id);
            }
        }
        Ok(report)
    }

    async fn fetch_for_owner(&self, caller: &Identity, id: TaskId) -> Result<Task> {
        let Some(task) = self.tasks.get(id).await? else {
            return Err(PaygateError::not_found(format!("task {id} not found")));
        };
        // Unauthorized callers get the same error as a missing id, so
        // existence is never confirmed to non-owners.
        if task.owner != *caller {
            return Err(PaygateError::not_found(format!("task {id} not found")));
        }
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::Block;
    use crate::domain::order::OrderStatus;
    use crate::domain::ports::{FixedClock, OrderStore, TaskStore};
    use crate::infrastructure::in_memory::{
        InMemoryLedger, InMemoryOrderStore, InMemoryOwnerIndex, InMemoryTaskStore,
    };
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    struct Fixture {
        service: TaskService,
        ledger: InMemoryLedger,
        orders: Arc<InMemoryOrderStore>,
        tasks: Arc<InMemoryTaskStore>,
        index: Arc<InMemoryOwnerIndex>,
    }

    fn service_address() -> Address {
        Address::new("acct-paygate-service")
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryOrderStore::new());
        let tasks = Arc::new(InMemoryTaskStore::new());
        let index = Arc::new(InMemoryOwnerIndex::new());
        let ledger = InMemoryLedger::new();
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());

        let service = TaskService::new(
            FeeConfig {
                add_task_fee: Some(100),
                ..Default::default()
            },
            orders.clone(),
            tasks.clone(),
            index.clone(),
            Arc::new(ledger.clone()),
            Arc::new(clock),
            service_address(),
        );
        Fixture {
            service,
            ledger,
            orders,
            tasks,
            index,
        }
    }

    fn payload(name: &str) -> TaskDraft {
        TaskDraft {
            name: name.into(),
            description: String::new(),
            due_date: None,
        }
    }

    async fn pay(fx: &Fixture, payer: &Identity, amount: u64, block: u64, memo: Memo) {
        fx.ledger
            .push_block(
                block,
                Block::transfer(payer.address(), service_address(), amount, memo.0),
            )
            .await;
    }

    #[tokio::test]
    async fn test_reserved_memo_is_the_pending_key() {
        let fx = fixture();
        let alice = Identity::new("alice");

        let order = fx.service.reserve_order(&alice).await.unwrap();
        let stored = fx.orders.get_pending(order.memo).await.unwrap().unwrap();
        assert_eq!(stored, order);
        assert_eq!(stored.memo, stored.token);
    }

    #[tokio::test]
    async fn test_reserve_without_fee_configured_fails() {
        let fx = fixture();
        let service = TaskService::new(
            FeeConfig::default(),
            fx.orders.clone(),
            fx.tasks.clone(),
            fx.index.clone(),
            Arc::new(fx.ledger.clone()),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())),
            service_address(),
        );
        assert!(matches!(
            service.reserve_order(&Identity::new("alice")).await,
            Err(PaygateError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_successful_claim_promotes_and_creates_task() {
        let fx = fixture();
        let alice = Identity::new("alice");

        let order = fx.service.reserve_order(&alice).await.unwrap();
        pay(&fx, &alice, order.fee, 7, order.memo).await;

        let task = fx
            .service
            .claim_task(&alice, payload("write report"), 1, 7, order.memo)
            .await
            .unwrap();

        assert!(fx.orders.get_pending(order.memo).await.unwrap().is_none());
        let settled = fx.orders.get_settled(&alice).await.unwrap().unwrap();
        assert_eq!(settled.status, OrderStatus::Completed);
        assert_eq!(settled.paid_at_block, Some(7));

        assert_eq!(task.owner, alice);
        assert_eq!(fx.service.list_owned(&alice).await.unwrap(), vec![task.id]);
    }

    #[tokio::test]
    async fn test_second_claim_for_same_memo_fails_without_side_effects() {
        let fx = fixture();
        let alice = Identity::new("alice");

        let order = fx.service.reserve_order(&alice).await.unwrap();
        pay(&fx, &alice, order.fee, 7, order.memo).await;

        fx.service
            .claim_task(&alice, payload("first"), 1, 7, order.memo)
            .await
            .unwrap();
        let second = fx
            .service
            .claim_task(&alice, payload("second"), 2, 7, order.memo)
            .await;

        assert!(matches!(second, Err(PaygateError::NotFound(_))));
        // Single-winner semantics: exactly one task exists.
        assert_eq!(fx.service.list_owned(&alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_claim_with_unknown_memo_has_no_side_effects() {
        let fx = fixture();
        let alice = Identity::new("alice");
        pay(&fx, &alice, 100, 7, Memo(999)).await;

        // Payment exists on the ledger but no order was ever reserved.
        let result = fx
            .service
            .claim_task(&alice, payload("ghost"), 1, 7, Memo(999))
            .await;
        assert!(matches!(result, Err(PaygateError::NotFound(_))));
        assert!(fx.service.list_owned(&alice).await.unwrap().is_empty());
        assert!(fx.tasks.all_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unverifiable_payment_leaves_order_pending() {
        let fx = fixture();
        let alice = Identity::new("alice");

        let order = fx.service.reserve_order(&alice).await.unwrap();
        // No transfer on the ledger at all.
        let result = fx
            .service
            .claim_task(&alice, payload("unpaid"), 1, 7, order.memo)
            .await;

        assert!(matches!(result, Err(PaygateError::NotFound(_))));
        // Verification failed before promotion; the order is still claimable.
        assert!(fx.orders.get_pending(order.memo).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_settled_orders_overwrite_per_payer() {
        let fx = fixture();
        let alice = Identity::new("alice");

        let first = fx.service.reserve_order(&alice).await.unwrap();
        pay(&fx, &alice, first.fee, 7, first.memo).await;
        fx.service
            .claim_task(&alice, payload("one"), 1, 7, first.memo)
            .await
            .unwrap();

        // Distinct memo for the second reservation: same fixed clock, so
        // fabricate a different pending order directly.
        let second = PaymentOrder::reserve(alice.clone(), 100, Memo(first.memo.0 ^ 1));
        fx.orders.insert_pending(second.clone()).await.unwrap();
        pay(&fx, &alice, second.fee, 8, second.memo).await;
        fx.service
            .claim_task(&alice, payload("two"), 2, 8, second.memo)
            .await
            .unwrap();

        // Only the most recent settled order persists for the payer.
        let settled = fx.orders.get_settled(&alice).await.unwrap().unwrap();
        assert_eq!(settled.memo, second.memo);
        assert_eq!(settled.paid_at_block, Some(8));
    }

    #[tokio::test]
    async fn test_non_owner_mutations_are_not_found_and_harmless() {
        let fx = fixture();
        let alice = Identity::new("alice");
        let bob = Identity::new("bob");

        let order = fx.service.reserve_order(&alice).await.unwrap();
        pay(&fx, &alice, order.fee, 7, order.memo).await;
        let task = fx
            .service
            .claim_task(&alice, payload("private"), 1, 7, order.memo)
            .await
            .unwrap();

        let patch = TaskPatch {
            name: Some("stolen".into()),
            ..Default::default()
        };
        assert!(matches!(
            fx.service.update_task(&bob, task.id, patch).await,
            Err(PaygateError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.delete_task(&bob, task.id).await,
            Err(PaygateError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.complete_task(&bob, task.id).await,
            Err(PaygateError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.get_owned(&bob, task.id).await,
            Err(PaygateError::NotFound(_))
        ));

        let unchanged = fx.service.get_owned(&alice, task.id).await.unwrap();
        assert_eq!(unchanged, task);
    }

    #[tokio::test]
    async fn test_complete_then_delete_by_owner() {
        let fx = fixture();
        let alice = Identity::new("alice");

        let order = fx.service.reserve_order(&alice).await.unwrap();
        pay(&fx, &alice, order.fee, 7, order.memo).await;
        let task = fx
            .service
            .claim_task(&alice, payload("chore"), 1, 7, order.memo)
            .await
            .unwrap();

        fx.service.complete_task(&alice, task.id).await.unwrap();
        let completed = fx.service.get_owned(&alice, task.id).await.unwrap();
        assert_eq!(completed.status, crate::domain::task::TaskStatus::Completed);

        fx.service.delete_task(&alice, task.id).await.unwrap();
        assert!(fx.service.list_owned(&alice).await.unwrap().is_empty());
        assert!(matches!(
            fx.service.get_owned(&alice, task.id).await,
            Err(PaygateError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_owned_is_empty_for_unknown_owner() {
        let fx = fixture();
        assert!(
            fx.service
                .list_owned(&Identity::new("nobody"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_reconcile_reports_divergence() {
        let fx = fixture();
        let alice = Identity::new("alice");

        let order = fx.service.reserve_order(&alice).await.unwrap();
        pay(&fx, &alice, order.fee, 7, order.memo).await;
        let task = fx
            .service
            .claim_task(&alice, payload("tracked"), 1, 7, order.memo)
            .await
            .unwrap();
        assert!(fx.service.reconcile().await.unwrap().is_consistent());

        // Simulate a crash between the two writes: store entry gone, index
        // entry left behind.
        fx.tasks.remove(task.id).await.unwrap();
        let report = fx.service.reconcile().await.unwrap();
        assert_eq!(report.indexed_missing, vec![task.id]);
        assert!(report.unindexed.is_empty());
    }
}
