use crate::domain::order::{Order, PurchaseNumber};
use crate::domain::payment::PaymentTransaction;
use crate::domain::ports::{OrderStore, ProductCatalog, TransactionStore};
use crate::domain::product::Product;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for catalog products, keyed by product id.
pub const CF_PRODUCTS: &str = "products";
/// Column Family for orders, keyed by purchase number.
pub const CF_ORDERS: &str = "orders";
/// Column Family for payment transactions, keyed by transaction id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family mapping an order id to its most recent transaction id.
pub const CF_TRANSACTIONS_BY_ORDER: &str = "transactions_by_order";

/// A persistent store implementation using RocksDB.
///
/// Backs the catalog, the order store and the transaction store, each in its
/// own Column Family.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [
            CF_PRODUCTS,
            CF_ORDERS,
            CF_TRANSACTIONS,
            CF_TRANSACTIONS_BY_ORDER,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
        .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| CheckoutError::StorageError(format!("Column family {} not found", name)))
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                CheckoutError::StorageError(format!("Deserialization error in {}: {}", cf_name, e))
            }),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value).map_err(|e| {
            CheckoutError::StorageError(format!("Serialization error in {}: {}", cf_name, e))
        })?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn exists(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        let cf = self.cf(cf_name)?;
        Ok(self.db.get_pinned_cf(cf, key)?.is_some())
    }
}

#[async_trait]
impl ProductCatalog for RocksDBStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        self.get_json(CF_PRODUCTS, id.as_bytes())
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let cf = self.cf(CF_PRODUCTS)?;
        let mut products = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let product: Product = serde_json::from_slice(&value).map_err(|e| {
                CheckoutError::StorageError(format!("Failed to deserialize product: {}", e))
            })?;
            products.push(product);
        }
        Ok(products)
    }

    async fn add_range(&self, products: Vec<Product>) -> Result<()> {
        for product in &products {
            self.put_json(CF_PRODUCTS, product.id.as_bytes(), product)?;
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn get_by_purchase_number(
        &self,
        purchase_number: &PurchaseNumber,
    ) -> Result<Option<Order>> {
        self.get_json(CF_ORDERS, purchase_number.as_str().as_bytes())
    }

    async fn add(&self, order: Order) -> Result<()> {
        let key = order.purchase_number.as_str().as_bytes();
        if self.exists(CF_ORDERS, key)? {
            return Err(CheckoutError::StorageError(format!(
                "Duplicate purchase number {}",
                order.purchase_number
            )));
        }
        self.put_json(CF_ORDERS, key, &order)
    }

    async fn update(&self, order: Order) -> Result<()> {
        let key = order.purchase_number.as_str().as_bytes();
        match self.get_json::<Order>(CF_ORDERS, key)? {
            Some(existing) if existing.id == order.id => self.put_json(CF_ORDERS, key, &order),
            _ => Err(CheckoutError::StorageError(format!(
                "Order {} does not exist",
                order.id
            ))),
        }
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn get_by_order_id(&self, order_id: Uuid) -> Result<Option<PaymentTransaction>> {
        let cf = self.cf(CF_TRANSACTIONS_BY_ORDER)?;
        match self.db.get_cf(cf, order_id.as_bytes())? {
            Some(txn_id) => self.get_json(CF_TRANSACTIONS, &txn_id),
            None => Ok(None),
        }
    }

    async fn add(&self, txn: PaymentTransaction) -> Result<()> {
        self.put_json(CF_TRANSACTIONS, txn.id.as_bytes(), &txn)?;
        let index = self.cf(CF_TRANSACTIONS_BY_ORDER)?;
        self.db.put_cf(index, txn.order_id.as_bytes(), txn.id.as_bytes())?;
        Ok(())
    }

    async fn update(&self, txn: PaymentTransaction) -> Result<()> {
        if !self.exists(CF_TRANSACTIONS, txn.id.as_bytes())? {
            return Err(CheckoutError::StorageError(format!(
                "Payment transaction {} does not exist",
                txn.id
            )));
        }
        self.put_json(CF_TRANSACTIONS, txn.id.as_bytes(), &txn)
    }
}
