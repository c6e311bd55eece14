//! Checkout entities and the ports the orchestrator consumes.

pub mod checkout;
pub mod order;
pub mod payment;
pub mod ports;
pub mod product;
