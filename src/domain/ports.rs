use super::checkout::AuthorizationOutcome;
use super::order::{Amount, Order, PurchaseNumber};
use super::payment::PaymentTransaction;
use super::product::Product;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>>;
    async fn list(&self) -> Result<Vec<Product>>;
    async fn add_range(&self, products: Vec<Product>) -> Result<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_by_purchase_number(&self, purchase_number: &PurchaseNumber)
    -> Result<Option<Order>>;
    /// Fails with `StorageError` if the purchase number is already taken.
    async fn add(&self, order: Order) -> Result<()>;
    async fn update(&self, order: Order) -> Result<()>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// When several transactions reference the order, the most recently
    /// added one is returned.
    async fn get_by_order_id(&self, order_id: Uuid) -> Result<Option<PaymentTransaction>>;
    async fn add(&self, txn: PaymentTransaction) -> Result<()>;
    async fn update(&self, txn: PaymentTransaction) -> Result<()>;
}

/// The three-step card gateway handshake.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn get_security_token(&self) -> Result<String>;

    async fn create_session(
        &self,
        security_token: &str,
        amount: Amount,
        purchase_number: &PurchaseNumber,
        currency: &str,
    ) -> Result<String>;

    /// Never fails on an unreadable response body: the outcome is a denial
    /// carrying the raw text.
    async fn authorize(
        &self,
        security_token: &str,
        transaction_token: &str,
        amount: Amount,
        currency: &str,
        purchase_number: &PurchaseNumber,
    ) -> Result<AuthorizationOutcome>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub type ProductCatalogBox = Box<dyn ProductCatalog>;
pub type OrderStoreBox = Box<dyn OrderStore>;
pub type TransactionStoreBox = Box<dyn TransactionStore>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type ClockBox = Box<dyn Clock>;
