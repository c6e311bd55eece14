//! Values handed back to the caller of the two checkout flows.

use super::order::{Amount, PurchaseNumber};
use serde::Serialize;

pub const APPROVED_MESSAGE: &str = "Pago aprobado";
pub const DECLINED_MESSAGE: &str = "Pago rechazado";
pub const SESSION_MISSING_MESSAGE: &str = "SessionKey no encontrado para la orden";
pub const MISSING_TOKEN_MESSAGE: &str = "No se recibió token de transacción";
pub const MISSING_PURCHASE_NUMBER_MESSAGE: &str = "No se recibió purchaseNumber";
pub const ALREADY_PAID_MESSAGE: &str = "La orden ya fue pagada";

/// Raw payload reported when no gateway call was made.
pub const EMPTY_RAW_RESPONSE: &str = "{}";
/// Purchase number echoed when the caller supplied none.
pub const UNKNOWN_PURCHASE_NUMBER: &str = "-";

/// Everything the client needs to render the gateway's payment widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInitResult {
    pub merchant_id: String,
    pub session_key: String,
    pub purchase_number: PurchaseNumber,
    pub amount: Amount,
    pub currency: String,
    pub static_widget_url: String,
}

/// Best-effort reading of an authorization response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationOutcome {
    pub approved: bool,
    pub authorization_code: Option<String>,
    pub masked_card: Option<String>,
    pub raw_response: String,
}

impl AuthorizationOutcome {
    pub fn denied(raw_response: impl Into<String>) -> Self {
        Self {
            approved: false,
            authorization_code: None,
            masked_card: None,
            raw_response: raw_response.into(),
        }
    }
}

/// Why a confirmation ended the way it did. Only `Approved` is a success;
/// the others are normal business outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmOutcome {
    Approved,
    Declined,
    SessionMissing,
    MissingInput,
    AlreadyPaid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResult {
    pub success: bool,
    pub outcome: ConfirmOutcome,
    pub purchase_number: String,
    pub authorization_code: Option<String>,
    pub message: String,
    pub masked_card: Option<String>,
    #[serde(rename = "rawResponseJson")]
    pub raw_response: String,
}

impl ConfirmResult {
    pub fn from_authorization(purchase_number: &PurchaseNumber, auth: AuthorizationOutcome) -> Self {
        let (outcome, message) = if auth.approved {
            (ConfirmOutcome::Approved, APPROVED_MESSAGE)
        } else {
            (ConfirmOutcome::Declined, DECLINED_MESSAGE)
        };
        Self {
            success: auth.approved,
            outcome,
            purchase_number: purchase_number.to_string(),
            authorization_code: auth.authorization_code,
            message: message.to_string(),
            masked_card: auth.masked_card,
            raw_response: auth.raw_response,
        }
    }

    pub fn session_missing(purchase_number: &PurchaseNumber) -> Self {
        Self::failure(
            ConfirmOutcome::SessionMissing,
            purchase_number.to_string(),
            SESSION_MISSING_MESSAGE,
        )
    }

    pub fn already_paid(purchase_number: &PurchaseNumber) -> Self {
        Self::failure(
            ConfirmOutcome::AlreadyPaid,
            purchase_number.to_string(),
            ALREADY_PAID_MESSAGE,
        )
    }

    pub fn missing_input(purchase_number: Option<&str>, message: &str) -> Self {
        Self::failure(
            ConfirmOutcome::MissingInput,
            purchase_number.unwrap_or(UNKNOWN_PURCHASE_NUMBER).to_string(),
            message,
        )
    }

    fn failure(outcome: ConfirmOutcome, purchase_number: String, message: &str) -> Self {
        Self {
            success: false,
            outcome,
            purchase_number,
            authorization_code: None,
            message: message.to_string(),
            masked_card: None,
            raw_response: EMPTY_RAW_RESPONSE.to_string(),
        }
    }
}
