use super::identity::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation token embedded in both a payment order and the external
/// ledger transfer that pays for it. Also the key under which the order is
/// stored while pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Memo(pub u64);

impl fmt::Display for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
}

/// A reservation that a fee must be paid before a gated task may be created.
///
/// Lives in the pending map from reservation until it is either claimed
/// (moved to the settled map) or expired (discarded, no settled record).
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentOrder {
    pub token: Memo,
    pub fee: u64,
    pub status: OrderStatus,
    pub payer: Identity,
    pub paid_at_block: Option<u64>,
    /// Always equal to `token`; the value the payer embeds in their
    /// transfer so the claim can be matched to this order.
    pub memo: Memo,
}

impl PaymentOrder {
    pub fn reserve(payer: Identity, fee: u64, memo: Memo) -> Self {
        Self {
            token: memo,
            fee,
            status: OrderStatus::Pending,
            payer,
            paid_at_block: None,
            memo,
        }
    }

    /// Marks the order paid at `block_height`. One-way; happens at most once
    /// per token because promotion is driven by removal from the pending map.
    pub fn promote(&mut self, block_height: u64) {
        self.status = OrderStatus::Completed;
        self.paid_at_block = Some(block_height);
    }
}
