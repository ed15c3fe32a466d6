use crate::domain::identity::Identity;
use crate::domain::order::Memo;
use crate::domain::ports::ClockArc;
use crc32fast::Hasher as Crc32;

/// Derives the correlation token a payer embeds in their ledger transfer.
///
/// The token is a crc32 digest of `(subject, caller, current time)` widened
/// to `u64`. It is not cryptographically unpredictable, and distinct tuples
/// can collide; it is a lookup key, not a uniqueness guarantee. The clock is
/// injected so tests can pin the time component.
pub struct CorrelationIdGenerator {
    clock: ClockArc,
}

impl CorrelationIdGenerator {
    pub fn new(clock: ClockArc) -> Self {
        Self { clock }
    }

    pub fn generate(&self, subject: &str, caller: &Identity) -> Memo {
        let now = self.clock.now().timestamp_millis();
        let mut hasher = Crc32::new();
        hasher.update(format!("{subject}:{caller}:{now}").as_bytes());
        Memo(u64::from(hasher.finalize()))
    }
}
