use crate::domain::order::Memo;
use crate::domain::ports::OrderStoreArc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One-shot deferred expiry of unpaid reservations.
///
/// Each reservation gets its own timer; when it fires, the order is removed
/// from the pending map if still present. Expiry and claim race for the same
/// removal through [`crate::domain::ports::OrderStore::remove_pending`]:
/// whichever runs first wins, the loser observes absence. A scheduled expiry
/// cannot be cancelled, only beaten to the removal.
pub struct ExpiryScheduler {
    orders: OrderStoreArc,
    window: Duration,
}

impl ExpiryScheduler {
    pub fn new(orders: OrderStoreArc, window: Duration) -> Self {
        Self { orders, window }
    }

    /// Spawns the deferred removal for `memo`. Dropping the returned handle
    /// does not cancel the timer.
    pub fn schedule(&self, memo: Memo) -> JoinHandle<()> {
        let orders = self.orders.clone();
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            match orders.remove_pending(memo).await {
                Ok(Some(_)) => debug!(%memo, "unpaid reservation expired"),
                // Already claimed or already expired; silent no-op.
                Ok(None) => {}
                Err(e) => warn!(%memo, error = %e, "expiry removal failed"),
            }
        })
    }
}
