use crate::error::{CheckoutError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Monetary amount charged for an order, fixed at 2 fractional digits.
///
/// The gateway correlates the session and the authorization by the textual
/// form of this value, so every outbound request must use [`Amount::to_wire`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub const SCALE: u32 = 2;

    /// Rounds a catalog price half-away-from-zero to 2 decimals.
    pub fn from_price(price: Decimal) -> Result<Self> {
        if price <= Decimal::ZERO {
            return Err(CheckoutError::ValidationError(format!(
                "Price must be positive, got {}",
                price
            )));
        }
        let mut rounded =
            price.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(Self::SCALE);
        Ok(Self(rounded))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Invariant formatting: fixed 2 decimals, `.` separator, no grouping.
    pub fn to_wire(&self) -> String {
        let mut value = self.0;
        value.rescale(Self::SCALE);
        value.to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Merchant-side identifier of one checkout attempt.
///
/// Derived from the UTC clock at whole-second resolution (`yyMMddHHmmss`), so
/// two orders created within the same second share a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseNumber(String);

impl PurchaseNumber {
    pub const LEN: usize = 12;

    pub fn generate(now: DateTime<Utc>) -> Self {
        Self(now.format("%y%m%d%H%M%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PurchaseNumber {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PurchaseNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PurchaseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Rejected,
    /// Declared state; neither checkout flow currently sets it.
    Error,
}

impl OrderStatus {
    /// Only a paid order is closed to further authorization attempts; a
    /// rejected one may be retried with another card.
    pub fn accepts_authorization(&self) -> bool {
        !matches!(self, Self::Paid)
    }
}

/// One checkout attempt.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: Uuid,
    pub purchase_number: PurchaseNumber,
    pub amount: Amount,
    pub currency: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub customer_email: Option<String>,
}

impl Order {
    pub fn new(
        purchase_number: PurchaseNumber,
        amount: Amount,
        currency: impl Into<String>,
        customer_email: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            purchase_number,
            amount,
            currency: currency.into(),
            status: OrderStatus::Pending,
            created_at,
            customer_email,
        }
    }

    /// Records the authorization verdict. A paid order never changes again.
    pub fn settle(&mut self, approved: bool) -> Result<()> {
        if !self.status.accepts_authorization() {
            return Err(CheckoutError::ValidationError(format!(
                "Order {} is already {:?}",
                self.purchase_number, self.status
            )));
        }
        self.status = if approved {
            OrderStatus::Paid
        } else {
            OrderStatus::Rejected
        };
        Ok(())
    }
}
