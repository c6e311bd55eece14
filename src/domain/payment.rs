use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Init,
    SessionCreated,
    Authorized,
    Declined,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::SessionCreated => "SESSION_CREATED",
            Self::Authorized => "AUTHORIZED",
            Self::Declined => "DECLINED",
        }
    }
}

/// Gateway-side record attached to one order.
///
/// `order_id` is a lookup key only; the order does not own its transactions.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub order_id: Uuid,
    pub session_key: Option<String>,
    pub transaction_token: Option<String>,
    pub authorization_code: Option<String>,
    pub masked_card: Option<String>,
    pub status: PaymentStatus,
    /// Last gateway response body, kept for audit.
    pub raw_response: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentTransaction {
    pub fn with_session(order_id: Uuid, session_key: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            session_key: Some(session_key),
            transaction_token: None,
            authorization_code: None,
            masked_card: None,
            status: PaymentStatus::SessionCreated,
            raw_response: None,
            created_at,
        }
    }

    /// Session key, if one was issued and is not blank.
    pub fn usable_session_key(&self) -> Option<&str> {
        self.session_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}
