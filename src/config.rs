//! Gateway settings and the merchant's static risk/identity profile.
//!
//! Everything here is validated once at startup; a [`CheckoutError::ConfigurationError`]
//! must stop the process before it serves any checkout.

use crate::error::{CheckoutError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CURRENCY: &str = "PEN";
pub const DEFAULT_SECURITY_ENDPOINT: &str = "/api.security/v1/security";
pub const DEFAULT_SESSION_ENDPOINT: &str = "/api.ecommerce/v2/ecommerce/token/session/{merchantId}";
pub const DEFAULT_AUTHORIZATION_ENDPOINT: &str =
    "/api.authorization/v3/authorization/ecommerce/{merchantId}";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const MERCHANT_ID_PLACEHOLDER: &str = "{merchantId}";

/// Values shipped in sample configuration files that were never filled in.
const UNSET_PREFIX: &str = "TU_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayEnvironment {
    #[default]
    Qa,
    Prod,
}

impl GatewayEnvironment {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Qa => "https://apisandbox.vnforappstest.com",
            Self::Prod => "https://apiprod.vnforapps.com",
        }
    }

    pub fn default_static_widget_url(&self) -> &'static str {
        match self {
            Self::Qa => "https://static-content-qas.vnforapps.com/v2/js/checkout.js?qa=true",
            Self::Prod => "https://static-content.vnforapps.com/v2/js/checkout.js",
        }
    }
}

impl FromStr for GatewayEnvironment {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qa" => Ok(Self::Qa),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(CheckoutError::ConfigurationError(format!(
                "Unknown gateway environment '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for GatewayEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qa => f.write_str("qa"),
            Self::Prod => f.write_str("prod"),
        }
    }
}

/// Connection and credential settings for the card gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    pub environment: GatewayEnvironment,
    pub merchant_id: String,
    pub username: String,
    pub password: String,
    pub currency: String,
    pub base_url: String,
    pub security_endpoint: String,
    pub session_endpoint: String,
    pub authorization_endpoint: String,
    pub static_widget_url: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Settings for `environment` with its default URLs and no credentials.
    pub fn for_environment(environment: GatewayEnvironment) -> Self {
        Self {
            environment,
            merchant_id: String::new(),
            username: String::new(),
            password: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            base_url: environment.default_base_url().to_string(),
            security_endpoint: DEFAULT_SECURITY_ENDPOINT.to_string(),
            session_endpoint: DEFAULT_SESSION_ENDPOINT.to_string(),
            authorization_endpoint: DEFAULT_AUTHORIZATION_ENDPOINT.to_string(),
            static_widget_url: environment.default_static_widget_url().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_credential("merchant id", &self.merchant_id)?;
        require_credential("username", &self.username)?;
        require_credential("password", &self.password)?;

        Url::parse(&self.base_url).map_err(|e| {
            CheckoutError::ConfigurationError(format!(
                "Invalid gateway base URL '{}': {}",
                self.base_url, e
            ))
        })?;

        for (name, endpoint) in [
            ("security endpoint", &self.security_endpoint),
            ("session endpoint", &self.session_endpoint),
            ("authorization endpoint", &self.authorization_endpoint),
            ("static widget URL", &self.static_widget_url),
        ] {
            if endpoint.trim().is_empty() {
                return Err(CheckoutError::ConfigurationError(format!(
                    "Gateway {} is not configured",
                    name
                )));
            }
        }

        if self.currency.len() != 3 || !self.currency.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(CheckoutError::ConfigurationError(format!(
                "Currency must be a 3-letter code, got '{}'",
                self.currency
            )));
        }

        if self.timeout.is_zero() {
            return Err(CheckoutError::ConfigurationError(
                "Gateway timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolves a configured endpoint against the base URL, substituting the
    /// merchant id. Absolute endpoints are used as-is.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let path = endpoint.trim().replace(MERCHANT_ID_PLACEHOLDER, &self.merchant_id);
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };
        Url::parse(&raw).map_err(|e| {
            CheckoutError::ConfigurationError(format!("Invalid gateway endpoint '{}': {}", raw, e))
        })
    }
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("environment", &self.environment)
            .field("merchant_id", &self.merchant_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("currency", &self.currency)
            .field("base_url", &self.base_url)
            .field("security_endpoint", &self.security_endpoint)
            .field("session_endpoint", &self.session_endpoint)
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("static_widget_url", &self.static_widget_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn require_credential(name: &str, value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() || value.to_ascii_uppercase().starts_with(UNSET_PREFIX) {
        return Err(CheckoutError::ConfigurationError(format!(
            "Gateway {} is not configured",
            name
        )));
    }
    Ok(())
}

/// Card-holder identity registered for the merchant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardHolder {
    /// 0 = national id, 1 = foreigner card, 2 = passport.
    pub document_type: String,
    pub document_number: String,
}

/// Antifraud and identity data attached to outbound gateway requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantProfile {
    pub client_ip: String,
    pub merchant_define_data: BTreeMap<String, Value>,
    pub card_holder: CardHolder,
}

impl Default for MerchantProfile {
    fn default() -> Self {
        let merchant_define_data = [
            ("MDD4", Value::from("cliente@example.com")),
            ("MDD30", Value::from("00000000")),
            ("MDD31", Value::from("900000000")),
            ("MDD32", Value::from("00000000")),
            ("MDD33", Value::from("25")),
            ("MDD34", Value::from("00000000")),
            ("MDD63", Value::from("25")),
            ("MDD65", Value::from("00000000")),
            ("MDD71", Value::from("900000000")),
            ("MDD75", Value::from("Registrado")),
            ("MDD77", Value::from(0)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            client_ip: "127.0.0.1".to_string(),
            merchant_define_data,
            card_holder: CardHolder {
                document_type: "0".to_string(),
                document_number: "00000000".to_string(),
            },
        }
    }
}

impl MerchantProfile {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        serde_json::from_slice(&bytes).map_err(|e| {
            CheckoutError::ConfigurationError(format!(
                "Invalid merchant profile {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}
