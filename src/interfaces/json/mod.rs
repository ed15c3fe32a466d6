pub mod payloads;

pub use self::payloads::{ClaimPayload, UpdatePayload, parse_claim, parse_update};
