use super::identity::Address;
use serde::{Deserialize, Serialize};

/// Query window for the external ledger: blocks `[start, start + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    pub start: u64,
    pub length: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Transfer {
        memo: u64,
        from: Address,
        to: Address,
        amount: u64,
    },
}

/// One ledger block. A block without a recognized operation is treated by
/// the verifier as non-matching, not as an error.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Block {
    pub operation: Option<Operation>,
}

impl Block {
    pub fn transfer(from: Address, to: Address, amount: u64, memo: u64) -> Self {
        Self {
            operation: Some(Operation::Transfer {
                memo,
                from,
                to,
                amount,
            }),
        }
    }
}
