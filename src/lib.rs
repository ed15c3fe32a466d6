//! Payment-gated task service.
//!
//! Creation of owned tasks is gated behind verified payment on an external
//! ledger. A caller reserves a payment order, pays out-of-band embedding the
//! order's correlation memo in the transfer, then presents proof of payment
//! to claim the task. Unpaid reservations expire after a bounded window.
//!
//! Layout follows hexagonal lines: `domain` holds the entities and storage /
//! ledger ports, `application` the orchestration (`TaskService` and the
//! components for correlation, verification and expiry), `infrastructure`
//! the port implementations, `interfaces` the transport-facing payloads.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
