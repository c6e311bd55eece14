use crate::config::{CardHolder, MerchantProfile};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const CHANNEL_WEB: &str = "web";
const CAPTURE_MANUAL: &str = "manual";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SessionRequest<'a> {
    channel: &'static str,
    amount: String,
    antifraud: Antifraud<'a>,
    purchase_number: &'a str,
    recurrence_max_amount: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Antifraud<'a> {
    client_ip: &'a str,
    merchant_define_data: &'a BTreeMap<String, Value>,
}

impl<'a> SessionRequest<'a> {
    pub(super) fn new(amount: &str, purchase_number: &'a str, profile: &'a MerchantProfile) -> Self {
        Self {
            channel: CHANNEL_WEB,
            amount: amount.to_string(),
            antifraud: Antifraud {
                client_ip: &profile.client_ip,
                merchant_define_data: &profile.merchant_define_data,
            },
            purchase_number,
            recurrence_max_amount: amount.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuthorizationRequest<'a> {
    capture_type: &'static str,
    card_holder: &'a CardHolder,
    channel: &'static str,
    countable: bool,
    order: AuthorizationOrder<'a>,
    recurrence: Recurrence,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizationOrder<'a> {
    amount: String,
    currency: &'a str,
    purchase_number: &'a str,
    token_id: &'a str,
}

/// Recurrence is always sent, switched off.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Recurrence {
    amount: String,
    beneficiary_id: &'static str,
    frequency: &'static str,
    max_amount: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl<'a> AuthorizationRequest<'a> {
    pub(super) fn new(
        amount: &str,
        currency: &'a str,
        purchase_number: &'a str,
        transaction_token: &'a str,
        profile: &'a MerchantProfile,
    ) -> Self {
        Self {
            capture_type: CAPTURE_MANUAL,
            card_holder: &profile.card_holder,
            channel: CHANNEL_WEB,
            countable: true,
            order: AuthorizationOrder {
                amount: amount.to_string(),
                currency,
                purchase_number,
                token_id: transaction_token,
            },
            recurrence: Recurrence {
                amount: amount.to_string(),
                beneficiary_id: "0",
                frequency: "FALSE",
                max_amount: amount.to_string(),
                kind: "",
            },
        }
    }
}
