//! Application layer containing the checkout orchestration.
//!
//! `CheckoutService` composes the catalog, the order and transaction stores,
//! and the payment gateway into the two public flows: `init` opens a gateway
//! session for a product, `confirm` authorizes the card token the client
//! captured against that session.

pub mod checkout;
