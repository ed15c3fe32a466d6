use chrono::{TimeZone, Utc};
use paygate::application::service::TaskService;
use paygate::config::FeeConfig;
use paygate::domain::identity::{Address, Identity};
use paygate::domain::order::Memo;
use paygate::domain::ports::FixedClock;
use paygate::infrastructure::in_memory::{
    InMemoryLedger, InMemoryOrderStore, InMemoryOwnerIndex, InMemoryTaskStore,
};
use paygate::domain::task::TaskDraft;
use std::sync::Arc;
use std::time::Duration;

pub const FEE: u64 = 100;

pub struct Harness {
    pub service: TaskService,
    pub ledger: InMemoryLedger,
    pub orders: Arc<InMemoryOrderStore>,
    pub tasks: Arc<InMemoryTaskStore>,
    pub index: Arc<InMemoryOwnerIndex>,
}

pub fn service_address() -> Address {
    Address::new("acct-paygate-service")
}

pub fn harness() -> Harness {
    harness_with_expiry(Duration::from_secs(120))
}

pub fn harness_with_expiry(window: Duration) -> Harness {
    let orders = Arc::new(InMemoryOrderStore::new());
    let tasks = Arc::new(InMemoryTaskStore::new());
    let index = Arc::new(InMemoryOwnerIndex::new());
    let ledger = InMemoryLedger::new();
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());

    let service = TaskService::new(
        FeeConfig {
            add_task_fee: Some(FEE),
            ..Default::default()
        },
        orders.clone(),
        tasks.clone(),
        index.clone(),
        Arc::new(ledger.clone()),
        Arc::new(clock),
        service_address(),
    )
    .with_expiry_window(window);

    Harness {
        service,
        ledger,
        orders,
        tasks,
        index,
    }
}

impl Harness {
    /// Scripts the out-of-band payment for `memo` onto the ledger.
    pub async fn pay(&self, payer: &Identity, block: u64, memo: Memo) {
        self.ledger
            .push_transfer(block, payer.address(), service_address(), FEE, memo.0)
            .await;
    }
}

pub fn payload(name: &str) -> TaskDraft {
    TaskDraft {
        name: name.into(),
        description: String::new(),
        due_date: None,
    }
}
