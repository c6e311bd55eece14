#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use niubiz_checkout::application::checkout::{CheckoutService, CheckoutSettings};
use niubiz_checkout::domain::checkout::AuthorizationOutcome;
use niubiz_checkout::domain::order::{Amount, PurchaseNumber};
use niubiz_checkout::domain::ports::{Clock, PaymentGateway};
use niubiz_checkout::domain::product::Product;
use niubiz_checkout::error::{CheckoutError, Result};
use niubiz_checkout::infrastructure::in_memory::{
    InMemoryOrderStore, InMemoryProductCatalog, InMemoryTransactionStore,
};
use niubiz_checkout::infrastructure::niubiz::parser::parse_authorization;
use std::sync::{Arc, Mutex};

pub const MERCHANT_ID: &str = "456879852";
pub const WIDGET_URL: &str = "https://static-content-qas.vnforapps.com/v2/js/checkout.js?qa=true";

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    SecurityToken,
    Session {
        token: String,
        amount: String,
        purchase_number: String,
        currency: String,
    },
    Authorize {
        token: String,
        transaction_token: String,
        amount: String,
        currency: String,
        purchase_number: String,
    },
}

/// Scripted gateway. Security tokens are numbered so tests can tell fresh
/// tokens apart; authorization bodies go through the real parser.
#[derive(Clone)]
pub struct StubGateway {
    pub calls: Arc<Mutex<Vec<GatewayCall>>>,
    pub session_result: std::result::Result<String, u16>,
    pub authorization_body: Arc<Mutex<String>>,
}

impl StubGateway {
    pub fn approving() -> Self {
        Self::with_authorization(r#"{"order":{"actionCode":"000","authorizationCode":"A1"},"dataMap":{"CARD":"411111XXXXXX1111"}}"#)
    }

    pub fn with_authorization(body: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            session_result: Ok("sk-0001".to_string()),
            authorization_body: Arc::new(Mutex::new(body.to_string())),
        }
    }

    pub fn failing_session(status: u16) -> Self {
        Self {
            session_result: Err(status),
            ..Self::approving()
        }
    }

    /// Changes what later authorizations answer, e.g. a second card.
    pub fn set_authorization(&self, body: &str) {
        *self.authorization_body.lock().unwrap() = body.to_string();
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: GatewayCall) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls
            .iter()
            .filter(|c| matches!(c, GatewayCall::SecurityToken))
            .count()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn get_security_token(&self) -> Result<String> {
        let n = self.record(GatewayCall::SecurityToken);
        Ok(format!("token-{}", n))
    }

    async fn create_session(
        &self,
        security_token: &str,
        amount: Amount,
        purchase_number: &PurchaseNumber,
        currency: &str,
    ) -> Result<String> {
        self.record(GatewayCall::Session {
            token: security_token.to_string(),
            amount: amount.to_wire(),
            purchase_number: purchase_number.to_string(),
            currency: currency.to_string(),
        });
        self.session_result
            .clone()
            .map_err(|status| CheckoutError::GatewayError {
                status,
                body: "session refused".to_string(),
            })
    }

    async fn authorize(
        &self,
        security_token: &str,
        transaction_token: &str,
        amount: Amount,
        currency: &str,
        purchase_number: &PurchaseNumber,
    ) -> Result<AuthorizationOutcome> {
        self.record(GatewayCall::Authorize {
            token: security_token.to_string(),
            transaction_token: transaction_token.to_string(),
            amount: amount.to_wire(),
            currency: currency.to_string(),
            purchase_number: purchase_number.to_string(),
        });
        let body = self.authorization_body.lock().unwrap().clone();
        Ok(parse_authorization(&body))
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 14, 30, 5).unwrap()
}

/// Service wired to in-memory stores; the store handles share state with
/// the service so tests can inspect what was persisted.
pub struct Harness {
    pub service: CheckoutService,
    pub catalog: InMemoryProductCatalog,
    pub orders: InMemoryOrderStore,
    pub transactions: InMemoryTransactionStore,
    pub gateway: StubGateway,
}

pub fn harness(gateway: StubGateway, products: Vec<Product>) -> Harness {
    let catalog = InMemoryProductCatalog::with_products(products);
    let orders = InMemoryOrderStore::new();
    let transactions = InMemoryTransactionStore::new();
    let service = CheckoutService::new(
        Box::new(catalog.clone()),
        Box::new(orders.clone()),
        Box::new(transactions.clone()),
        Box::new(gateway.clone()),
        CheckoutSettings {
            merchant_id: MERCHANT_ID.to_string(),
            currency: "PEN".to_string(),
            static_widget_url: WIDGET_URL.to_string(),
        },
    );
    Harness {
        service,
        catalog,
        orders,
        transactions,
        gateway,
    }
}
