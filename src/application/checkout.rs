use crate::domain::checkout::{
    CheckoutInitResult, ConfirmResult, MISSING_PURCHASE_NUMBER_MESSAGE, MISSING_TOKEN_MESSAGE,
};
use crate::domain::order::{Amount, Order, PurchaseNumber};
use crate::domain::payment::{PaymentStatus, PaymentTransaction};
use crate::domain::ports::{
    ClockBox, OrderStoreBox, PaymentGatewayBox, ProductCatalog, ProductCatalogBox, SystemClock,
    TransactionStoreBox,
};
use crate::domain::product::Product;
use crate::error::{CheckoutError, Result};
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Deployment-wide values echoed to the client.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub merchant_id: String,
    pub currency: String,
    pub static_widget_url: String,
}

/// Confirmation input as posted back by the payment widget.
///
/// The widget has used several names for the card token over time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmForm {
    pub purchase_number: Option<String>,
    pub transaction_token: Option<String>,
    pub token_id: Option<String>,
    pub token: Option<String>,
}

impl ConfirmForm {
    /// The first alias present wins, even when it is blank.
    fn resolved_token(&self) -> Option<&str> {
        self.transaction_token
            .as_deref()
            .or(self.token_id.as_deref())
            .or(self.token.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    fn resolved_purchase_number(&self) -> Option<&str> {
        self.purchase_number
            .as_deref()
            .map(str::trim)
            .filter(|pn| !pn.is_empty())
    }
}

/// Seeds the demo catalog when it holds no products.
pub async fn seed_catalog(catalog: &dyn ProductCatalog) -> Result<()> {
    if !catalog.list().await?.is_empty() {
        return Ok(());
    }
    catalog
        .add_range(vec![
            Product::new("Laptop", dec!(3999.99)),
            Product::new("Mouse", dec!(79.90)),
            Product::new("Teclado", dec!(149.00)),
        ])
        .await
}

/// Drives a purchase through the gateway handshake.
///
/// Every step is awaited in order, since each gateway call consumes the
/// previous one's output. Dropping the returned future cancels the flow at
/// its next await point; writes already made are kept.
pub struct CheckoutService {
    catalog: ProductCatalogBox,
    orders: OrderStoreBox,
    transactions: TransactionStoreBox,
    gateway: PaymentGatewayBox,
    clock: ClockBox,
    settings: CheckoutSettings,
}

impl CheckoutService {
    /// Creates a new `CheckoutService` using the system clock.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Read-only source of priced products.
    /// * `orders` - Store for checkout attempts.
    /// * `transactions` - Store for gateway-side transaction records.
    /// * `gateway` - The card gateway.
    /// * `settings` - Merchant id, currency and widget script URL.
    pub fn new(
        catalog: ProductCatalogBox,
        orders: OrderStoreBox,
        transactions: TransactionStoreBox,
        gateway: PaymentGatewayBox,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            catalog,
            orders,
            transactions,
            gateway,
            clock: Box::new(SystemClock),
            settings,
        }
    }

    pub fn with_clock(mut self, clock: ClockBox) -> Self {
        self.clock = clock;
        self
    }

    /// Opens a gateway session for one unit of `product_id`.
    ///
    /// The order is persisted before the gateway is contacted and is not
    /// removed if the gateway fails.
    pub async fn init(
        &self,
        product_id: Uuid,
        customer_email: Option<String>,
    ) -> Result<CheckoutInitResult> {
        let product = self
            .catalog
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFoundError(format!("Product {}", product_id)))?;

        let amount = Amount::from_price(product.price)?;
        let now = self.clock.now();
        let order = Order::new(
            PurchaseNumber::generate(now),
            amount,
            self.settings.currency.clone(),
            customer_email,
            now,
        );
        self.orders.add(order.clone()).await?;
        info!(purchase_number = %order.purchase_number, amount = %amount, "Order created");

        let security_token = self.gateway.get_security_token().await?;
        let session_key = self
            .gateway
            .create_session(
                &security_token,
                order.amount,
                &order.purchase_number,
                &order.currency,
            )
            .await?;

        let txn = PaymentTransaction::with_session(order.id, session_key.clone(), self.clock.now());
        self.transactions.add(txn).await?;
        info!(purchase_number = %order.purchase_number, "Payment session created");

        Ok(CheckoutInitResult {
            merchant_id: self.settings.merchant_id.clone(),
            session_key,
            purchase_number: order.purchase_number,
            amount: order.amount,
            currency: order.currency,
            static_widget_url: self.settings.static_widget_url.clone(),
        })
    }

    /// Authorizes `transaction_token` against the order's open session.
    ///
    /// A missing session or a declined card is a normal result with
    /// `success = false`; only infrastructure and protocol failures are errors.
    pub async fn confirm(
        &self,
        purchase_number: &PurchaseNumber,
        transaction_token: &str,
    ) -> Result<ConfirmResult> {
        let mut order = self
            .orders
            .get_by_purchase_number(purchase_number)
            .await?
            .ok_or_else(|| CheckoutError::NotFoundError(format!("Order {}", purchase_number)))?;

        if !order.status.accepts_authorization() {
            warn!(purchase_number = %purchase_number, "Order already paid");
            return Ok(ConfirmResult::already_paid(purchase_number));
        }

        // Security tokens are short-lived; each flow fetches its own.
        let security_token = self.gateway.get_security_token().await?;

        let mut txn = match self.transactions.get_by_order_id(order.id).await? {
            Some(txn) if txn.usable_session_key().is_some() => txn,
            _ => {
                warn!(purchase_number = %purchase_number, "No session key stored for order");
                return Ok(ConfirmResult::session_missing(purchase_number));
            }
        };

        let auth = self
            .gateway
            .authorize(
                &security_token,
                transaction_token,
                order.amount,
                &order.currency,
                &order.purchase_number,
            )
            .await?;

        order.settle(auth.approved)?;
        self.orders.update(order.clone()).await?;

        txn.transaction_token = Some(transaction_token.to_string());
        txn.authorization_code = auth.authorization_code.clone();
        txn.masked_card = auth.masked_card.clone();
        txn.status = if auth.approved {
            PaymentStatus::Authorized
        } else {
            PaymentStatus::Declined
        };
        txn.raw_response = Some(auth.raw_response.clone());
        self.transactions.update(txn).await?;

        if auth.approved {
            info!(purchase_number = %purchase_number, "Payment approved");
        } else {
            warn!(purchase_number = %purchase_number, "Payment declined");
        }
        Ok(ConfirmResult::from_authorization(&order.purchase_number, auth))
    }

    /// Confirms from raw widget input, turning missing fields into a
    /// structured failure instead of an error.
    pub async fn confirm_form(&self, form: &ConfirmForm) -> Result<ConfirmResult> {
        let purchase_number = form.resolved_purchase_number();
        let Some(token) = form.resolved_token() else {
            return Ok(ConfirmResult::missing_input(purchase_number, MISSING_TOKEN_MESSAGE));
        };
        let Some(purchase_number) = purchase_number else {
            return Ok(ConfirmResult::missing_input(None, MISSING_PURCHASE_NUMBER_MESSAGE));
        };
        self.confirm(&PurchaseNumber::from(purchase_number), token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_form_token_precedence() {
        let form = ConfirmForm {
            purchase_number: Some("260101120000".to_string()),
            transaction_token: None,
            token_id: Some("tok-id".to_string()),
            token: Some("tok".to_string()),
        };
        assert_eq!(form.resolved_token(), Some("tok-id"));
        assert_eq!(form.resolved_purchase_number(), Some("260101120000"));
    }

    #[test]
    fn test_confirm_form_blank_first_alias_is_missing() {
        let form = ConfirmForm {
            purchase_number: Some("260101120000".to_string()),
            transaction_token: Some("  ".to_string()),
            token_id: None,
            token: Some("tok".to_string()),
        };
        assert_eq!(form.resolved_token(), None);
    }

    #[test]
    fn test_confirm_form_deserializes_widget_field_names() {
        let form: ConfirmForm =
            serde_json::from_str(r#"{"purchaseNumber":"260101120000","tokenId":"t1"}"#).unwrap();
        assert_eq!(form.resolved_token(), Some("t1"));
        assert_eq!(ConfirmForm::default().resolved_token(), None);
    }
}
