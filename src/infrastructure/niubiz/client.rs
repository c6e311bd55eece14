use super::dto::{AuthorizationRequest, SessionRequest};
use super::parser::{parse_authorization, parse_security_token, parse_session_key};
use crate::config::{GatewayConfig, MerchantProfile};
use crate::domain::checkout::AuthorizationOutcome;
use crate::domain::order::{Amount, PurchaseNumber};
use crate::domain::ports::PaymentGateway;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use tracing::{debug, error, info};

const JSON: &str = "application/json";

/// HTTP client for the card gateway.
///
/// Each call is a single request bounded by the configured timeout; there are
/// no retries and no token caching.
#[derive(Clone)]
pub struct NiubizClient {
    client: Client,
    credentials: String,
    profile: MerchantProfile,
    security_url: Url,
    session_url: Url,
    authorization_url: Url,
}

impl NiubizClient {
    /// Validates `config` and builds the underlying HTTP client.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for invalid settings, `TransportError` when the
    /// HTTP client cannot be constructed.
    pub fn new(config: &GatewayConfig, profile: MerchantProfile) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            credentials: basic_credentials(&config.username, &config.password),
            profile,
            security_url: config.endpoint_url(&config.security_endpoint)?,
            session_url: config.endpoint_url(&config.session_endpoint)?,
            authorization_url: config.endpoint_url(&config.authorization_endpoint)?,
        })
    }

    async fn post_json(&self, url: &Url, security_token: &str, body: String) -> Result<(u16, String)> {
        let response = self
            .client
            .post(url.clone())
            .header(AUTHORIZATION, security_token)
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .body(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_transport_error)?;
        Ok((status, body))
    }
}

#[async_trait]
impl PaymentGateway for NiubizClient {
    async fn get_security_token(&self) -> Result<String> {
        debug!(url = %self.security_url, "Requesting security token");
        let response = self
            .client
            .post(self.security_url.clone())
            .header(AUTHORIZATION, format!("Basic {}", self.credentials))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body("")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "Security token request failed");
            return Err(CheckoutError::GatewayError {
                status: status.as_u16(),
                body,
            });
        }

        parse_security_token(&body)
    }

    async fn create_session(
        &self,
        security_token: &str,
        amount: Amount,
        purchase_number: &PurchaseNumber,
        currency: &str,
    ) -> Result<String> {
        let request = SessionRequest::new(&amount.to_wire(), purchase_number.as_str(), &self.profile);
        let json = serde_json::to_string(&request).map_err(|e| {
            CheckoutError::ValidationError(format!("Cannot encode session request: {}", e))
        })?;
        debug!(purchase_number = %purchase_number, currency, body = %json, "Creating payment session");

        let (status, body) = self.post_json(&self.session_url, security_token, json).await?;
        if !(200..300).contains(&status) {
            error!(status, body = %body, "Session creation failed");
            return Err(CheckoutError::GatewayError { status, body });
        }

        parse_session_key(&body).inspect_err(|_| {
            error!(body = %body, "Session response without session key");
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
        let request = AuthorizationRequest::new(
            &amount.to_wire(),
            currency,
            purchase_number.as_str(),
            transaction_token,
            &self.profile,
        );
        let json = serde_json::to_string(&request).map_err(|e| {
            CheckoutError::ValidationError(format!("Cannot encode authorization request: {}", e))
        })?;
        debug!(purchase_number = %purchase_number, body = %json, "Authorizing transaction");

        // Any status may carry a meaningful action code; the body is read regardless.
        let (status, body) = self
            .post_json(&self.authorization_url, security_token, json)
            .await?;
        info!(status, body = %body, "Authorization response");

        Ok(parse_authorization(&body))
    }
}

/// `username:password` encoded as ISO-8859-1 then base64, as the gateway
/// expects. Characters outside Latin-1 become `?`.
pub fn basic_credentials(username: &str, password: &str) -> String {
    let latin1: Vec<u8> = format!("{}:{}", username, password)
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    STANDARD.encode(latin1)
}

fn map_transport_error(e: reqwest::Error) -> CheckoutError {
    if e.is_timeout() {
        CheckoutError::TimeoutError
    } else {
        CheckoutError::TransportError(e)
    }
}
