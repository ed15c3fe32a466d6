pub mod identity;
pub mod ledger;
pub mod order;
pub mod ports;
pub mod task;
