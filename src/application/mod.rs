//! Application layer orchestrating the payment-order lifecycle.
//!
//! `TaskService` is the entry point: reserve order -> verify payment ->
//! promote order -> create task -> update owner index. The smaller
//! components (`CorrelationIdGenerator`, `LedgerVerifier`,
//! `ExpiryScheduler`) each own one step of that flow.

pub mod correlation;
pub mod expiry;
pub mod service;
pub mod verifier;
