use chrono::Utc;
use niubiz_checkout::domain::order::{Amount, Order, PurchaseNumber};
use niubiz_checkout::domain::payment::PaymentTransaction;
use niubiz_checkout::domain::ports::{OrderStoreBox, ProductCatalogBox, TransactionStoreBox};
use niubiz_checkout::domain::product::Product;
use niubiz_checkout::infrastructure::in_memory::{
    InMemoryOrderStore, InMemoryProductCatalog, InMemoryTransactionStore,
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_stores_as_trait_objects() {
    let catalog: ProductCatalogBox = Box::new(InMemoryProductCatalog::new());
    let orders: OrderStoreBox = Box::new(InMemoryOrderStore::new());
    let transactions: TransactionStoreBox = Box::new(InMemoryTransactionStore::new());

    let product = Product::new("Mouse", dec!(79.90));
    let product_id = product.id;
    let order = Order::new(
        PurchaseNumber::from("261017143005"),
        Amount::from_price(dec!(79.90)).unwrap(),
        "PEN".to_string(),
        None,
        Utc::now(),
    );
    let txn = PaymentTransaction::with_session(order.id, "SK-1".to_string(), Utc::now());
    let order_id = order.id;

    // Verify Send + Sync by spawning tasks
    let catalog_handle = tokio::spawn(async move {
        catalog.add_range(vec![product]).await.unwrap();
        catalog.get_by_id(product_id).await.unwrap().unwrap()
    });

    let order_handle = tokio::spawn(async move {
        orders.add(order).await.unwrap();
        orders
            .get_by_purchase_number(&PurchaseNumber::from("261017143005"))
            .await
            .unwrap()
            .unwrap()
    });

    let txn_handle = tokio::spawn(async move {
        transactions.add(txn).await.unwrap();
        transactions.get_by_order_id(order_id).await.unwrap().unwrap()
    });

    assert_eq!(catalog_handle.await.unwrap().name, "Mouse");
    assert_eq!(order_handle.await.unwrap().id, order_id);
    assert_eq!(txn_handle.await.unwrap().session_key.as_deref(), Some("SK-1"));
}
