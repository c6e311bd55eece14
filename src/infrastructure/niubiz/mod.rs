//! Card gateway adapter.
//!
//! Implements the `PaymentGateway` port over HTTP: security token, session,
//! authorization. Response reading is kept apart from transport so the
//! tolerant parsing can be exercised without a server.

mod client;
mod dto;
pub mod parser;

pub use client::{NiubizClient, basic_credentials};
