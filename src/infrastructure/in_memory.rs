use crate::domain::order::{Order, PurchaseNumber};
use crate::domain::payment::PaymentTransaction;
use crate::domain::ports::{OrderStore, ProductCatalog, TransactionStore};
use crate::domain::product::Product;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory product catalog.
///
/// Keeps insertion order so listings are stable.
#[derive(Default, Clone)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryProductCatalog {
    /// Creates a new, empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>> {
        Ok(self.products.read().await.clone())
    }

    async fn add_range(&self, products: Vec<Product>) -> Result<()> {
        let mut current = self.products.write().await;
        for product in products {
            match current.iter_mut().find(|p| p.id == product.id) {
                Some(existing) => *existing = product,
                None => current.push(product),
            }
        }
        Ok(())
    }
}

/// A thread-safe in-memory order store keyed by purchase number.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<PurchaseNumber, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get_by_purchase_number(
        &self,
        purchase_number: &PurchaseNumber,
    ) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(purchase_number).cloned())
    }

    async fn add(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.purchase_number) {
            return Err(CheckoutError::StorageError(format!(
                "Duplicate purchase number {}",
                order.purchase_number
            )));
        }
        orders.insert(order.purchase_number.clone(), order);
        Ok(())
    }

    async fn update(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.purchase_number) {
            Some(existing) if existing.id == order.id => {
                *existing = order;
                Ok(())
            }
            _ => Err(CheckoutError::StorageError(format!(
                "Order {} does not exist",
                order.id
            ))),
        }
    }
}

/// A thread-safe in-memory payment transaction store.
///
/// Transactions are keyed by their own id; a secondary index points each
/// order at the transaction added last for it.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<Uuid, PaymentTransaction>>>,
    latest_by_order: Arc<RwLock<HashMap<Uuid, Uuid>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn get_by_order_id(&self, order_id: Uuid) -> Result<Option<PaymentTransaction>> {
        let index = self.latest_by_order.read().await;
        let Some(txn_id) = index.get(&order_id) else {
            return Ok(None);
        };
        let transactions = self.transactions.read().await;
        Ok(transactions.get(txn_id).cloned())
    }

    async fn add(&self, txn: PaymentTransaction) -> Result<()> {
        let mut index = self.latest_by_order.write().await;
        let mut transactions = self.transactions.write().await;
        index.insert(txn.order_id, txn.id);
        transactions.insert(txn.id, txn);
        Ok(())
    }

    async fn update(&self, txn: PaymentTransaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        match transactions.get_mut(&txn.id) {
            Some(existing) => {
                *existing = txn;
                Ok(())
            }
            None => Err(CheckoutError::StorageError(format!(
                "Payment transaction {} does not exist",
                txn.id
            ))),
        }
    }
}
