use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paygate::application::service::TaskService;
use paygate::config::FeeConfig;
use paygate::domain::identity::{Address, Identity};
use paygate::domain::ports::{OrderStoreArc, OwnerIndexArc, SystemClock, TaskStoreArc};
use paygate::infrastructure::in_memory::{
    InMemoryLedger, InMemoryOrderStore, InMemoryOwnerIndex, InMemoryTaskStore,
};
use paygate::interfaces::json;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// End-to-end demo of the payment-gated task flow: reserve an order, settle
/// it on an in-memory ledger, claim the task, and list what the caller owns.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Fee in ledger units charged for creating a task
    #[arg(long, default_value_t = 100)]
    fee: u64,

    /// Caller identity reserving and claiming the task
    #[arg(long, default_value = "alice")]
    caller: String,

    /// JSON claim payload, e.g. '{"name":"write report"}'
    #[arg(long, default_value = r#"{"name":"demo task"}"#)]
    payload: String,

    /// Block height the scripted transfer lands at
    #[arg(long, default_value_t = 7)]
    block_height: u64,

    /// Expiry window for unpaid reservations, in seconds
    #[arg(long, default_value_t = 120)]
    expiry_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let caller = Identity::new(&cli.caller);
    let payload = json::parse_claim(&cli.payload).into_diagnostic()?;

    let orders: OrderStoreArc = Arc::new(InMemoryOrderStore::new());
    let tasks: TaskStoreArc = Arc::new(InMemoryTaskStore::new());
    let index: OwnerIndexArc = Arc::new(InMemoryOwnerIndex::new());
    let ledger = InMemoryLedger::new();
    let service_address = Address::new("acct-paygate-service");

    let config = FeeConfig {
        add_task_fee: Some(cli.fee),
        ..Default::default()
    };
    let service = TaskService::new(
        config,
        orders,
        tasks,
        index,
        Arc::new(ledger.clone()),
        Arc::new(SystemClock),
        service_address.clone(),
    )
    .with_expiry_window(Duration::from_secs(cli.expiry_secs));

    let order = service.reserve_order(&caller).await.into_diagnostic()?;
    println!("reserved order: memo={} fee={}", order.memo, order.fee);

    // The out-of-band payment: script a matching transfer onto the ledger.
    ledger
        .push_transfer(
            cli.block_height,
            caller.address(),
            service_address,
            order.fee,
            order.memo.0,
        )
        .await;
    println!(
        "ledger transfer recorded at block {} with memo {}",
        cli.block_height, order.memo
    );

    let task = service
        .claim_task(
            &caller,
            payload.into(),
            order.memo.0,
            cli.block_height,
            order.memo,
        )
        .await
        .into_diagnostic()?;
    println!("claimed task {} ({})", task.id, task.name);

    for id in service.list_owned(&caller).await.into_diagnostic()? {
        let task = service.get_owned(&caller, id).await.into_diagnostic()?;
        println!("owned: {} {} [{:?}]", task.id, task.name, task.status);
    }

    Ok(())
}
