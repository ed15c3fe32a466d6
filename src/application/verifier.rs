use crate::domain::identity::{Address, Identity};
use crate::domain::ledger::{BlockRange, Operation};
use crate::domain::order::Memo;
use crate::domain::ports::LedgerClientArc;
use crate::error::Result;
use tracing::debug;

/// Consumer-side payment verification against the external ledger.
///
/// Verification is bounded to exactly one block: the caller supplies the
/// height where their transfer landed, and a single `[height, height + 1)`
/// query is issued with no retry. There is no server-side scan of history.
pub struct LedgerVerifier {
    ledger: LedgerClientArc,
    /// The service's own account; payments must be sent here.
    service_address: Address,
}

impl LedgerVerifier {
    pub fn new(ledger: LedgerClientArc, service_address: Address) -> Self {
        Self {
            ledger,
            service_address,
        }
    }

    /// Returns true iff the queried block contains a transfer carrying
    /// `memo`, for exactly `expected_amount`, from the payer's address to
    /// the service address. First match wins.
    ///
    /// Addresses are matched by crc32 digest rather than byte-for-byte (see
    /// [`Address::digest`]); a digest collision between distinct addresses
    /// would incorrectly validate a payment.
    pub async fn verify(
        &self,
        payer: &Identity,
        expected_amount: u64,
        block_height: u64,
        memo: Memo,
    ) -> Result<bool> {
        let blocks = self
            .ledger
            .query_blocks(BlockRange {
                start: block_height,
                length: 1,
            })
            .await?;

        let payer_digest = payer.address().digest();
        let service_digest = self.service_address.digest();

        for block in &blocks {
            let Some(Operation::Transfer {
                memo: tx_memo,
                from,
                to,
                amount,
            }) = &block.operation
            else {
                continue;
            };

            if *tx_memo == memo.0
                && from.digest() == payer_digest
                && to.digest() == service_digest
                && *amount == expected_amount
            {
                debug!(%memo, block_height, amount, "matching transfer found");
                return Ok(true);
            }
        }

        debug!(%memo, block_height, "no matching transfer");
        Ok(false)
    }
}
