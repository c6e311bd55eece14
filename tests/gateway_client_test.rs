use niubiz_checkout::config::{GatewayConfig, GatewayEnvironment, MerchantProfile};
use niubiz_checkout::domain::order::{Amount, PurchaseNumber};
use niubiz_checkout::domain::ports::PaymentGateway;
use niubiz_checkout::error::CheckoutError;
use niubiz_checkout::infrastructure::niubiz::NiubizClient;
use rust_decimal_macros::dec;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

#[derive(Debug)]
struct CapturedRequest {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

async fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before request headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap().split(' ');
    let method = request_line.next().unwrap().to_string();
    let path = request_line.next().unwrap().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .map(|(_, v)| v.parse::<usize>().unwrap())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before request body");
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8(buf[header_end..header_end + content_length].to_vec()).unwrap();

    CapturedRequest {
        method,
        path,
        headers,
        body,
    }
}

/// Serves one scripted response per connection, in order.
async fn spawn_gateway(
    responses: Vec<(u16, &'static str)>,
) -> (String, mpsc::UnboundedReceiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            tx.send(request).unwrap();
            let reason = if status == 200 { "OK" } else { "Status" };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        }
    });

    (format!("http://{}", addr), rx)
}

fn config(base_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::for_environment(GatewayEnvironment::Qa);
    config.merchant_id = "MID42".to_string();
    config.username = "user".to_string();
    config.password = "pass".to_string();
    config.base_url = base_url.to_string();
    config.timeout = Duration::from_secs(5);
    config
}

fn amount() -> Amount {
    Amount::from_price(dec!(79.9)).unwrap()
}

#[tokio::test]
async fn test_security_token_uses_basic_auth_and_strips_quotes() {
    let (base_url, mut requests) = spawn_gateway(vec![(201, "\"eyJraWQiOi\"\n")]).await;
    let client = NiubizClient::new(&config(&base_url), MerchantProfile::default()).unwrap();

    let token = client.get_security_token().await.unwrap();
    assert_eq!(token, "eyJraWQiOi");

    let request = requests.recv().await.unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api.security/v1/security");
    assert_eq!(request.header("authorization"), Some("Basic dXNlcjpwYXNz"));
    assert_eq!(request.body, "");
}

#[tokio::test]
async fn test_security_token_rejected_credentials() {
    let (base_url, _requests) = spawn_gateway(vec![(401, "Unauthorized access")]).await;
    let client = NiubizClient::new(&config(&base_url), MerchantProfile::default()).unwrap();

    let err = client.get_security_token().await.unwrap_err();
    match err {
        CheckoutError::GatewayError { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "Unauthorized access");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_security_token_empty_body() {
    let (base_url, _requests) = spawn_gateway(vec![(200, "  \"\"  ")]).await;
    let client = NiubizClient::new(&config(&base_url), MerchantProfile::default()).unwrap();

    assert!(matches!(
        client.get_security_token().await,
        Err(CheckoutError::InvalidGatewayResponse(_))
    ));
}

#[tokio::test]
async fn test_create_session_sends_raw_token_and_formatted_amount() {
    let (base_url, mut requests) =
        spawn_gateway(vec![(200, r#"{"sessionkey":"SK-77","expirationTime":1760000000}"#)]).await;
    let client = NiubizClient::new(&config(&base_url), MerchantProfile::default()).unwrap();

    let session = client
        .create_session("tok-1", amount(), &PurchaseNumber::from("261017143005"), "PEN")
        .await
        .unwrap();
    assert_eq!(session, "SK-77");

    let request = requests.recv().await.unwrap();
    assert_eq!(request.path, "/api.ecommerce/v2/ecommerce/token/session/MID42");
    assert_eq!(request.header("authorization"), Some("tok-1"));
    assert_eq!(request.header("content-type"), Some("application/json"));

    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["channel"], "web");
    assert_eq!(body["amount"], "79.90");
    assert_eq!(body["recurrenceMaxAmount"], "79.90");
    assert_eq!(body["purchaseNumber"], "261017143005");
    assert_eq!(body["antifraud"]["clientIp"], "127.0.0.1");
}

#[tokio::test]
async fn test_create_session_failures() {
    let (base_url, _requests) = spawn_gateway(vec![
        (500, r#"{"errorMessage":"internal"}"#),
        (200, r#"{"expirationTime":1760000000}"#),
    ])
    .await;
    let client = NiubizClient::new(&config(&base_url), MerchantProfile::default()).unwrap();
    let pn = PurchaseNumber::from("261017143005");

    assert!(matches!(
        client.create_session("tok", amount(), &pn, "PEN").await,
        Err(CheckoutError::GatewayError { status: 500, .. })
    ));
    assert!(matches!(
        client.create_session("tok", amount(), &pn, "PEN").await,
        Err(CheckoutError::InvalidGatewayResponse(_))
    ));
}

#[tokio::test]
async fn test_authorize_approved() {
    let (base_url, mut requests) = spawn_gateway(vec![(
        200,
        r#"{"header":{"ecoreTransactionUUID":"x"},"order":{"actionCode":"000","authorizationCode":"173424"},"dataMap":{"CARD":"455170******8059","STATUS":"Authorized"}}"#,
    )])
    .await;
    let client = NiubizClient::new(&config(&base_url), MerchantProfile::default()).unwrap();

    let outcome = client
        .authorize("tok-2", "card-token", amount(), "PEN", &PurchaseNumber::from("261017143005"))
        .await
        .unwrap();

    assert!(outcome.approved);
    assert_eq!(outcome.authorization_code.as_deref(), Some("173424"));
    assert_eq!(outcome.masked_card.as_deref(), Some("455170******8059"));

    let request = requests.recv().await.unwrap();
    assert_eq!(request.path, "/api.authorization/v3/authorization/ecommerce/MID42");
    assert_eq!(request.header("authorization"), Some("tok-2"));
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["captureType"], "manual");
    assert_eq!(body["countable"], true);
    assert_eq!(body["order"]["tokenId"], "card-token");
    assert_eq!(body["order"]["amount"], "79.90");
    assert_eq!(body["order"]["currency"], "PEN");
}

#[tokio::test]
async fn test_authorize_error_status_still_returns_outcome() {
    let declined = r#"{"errorCode":400,"errorMessage":"NOT AUTHORIZED","data":{"ACTION_CODE":"190","CARD":{"CARDNUMBER":"455170******8059"}}}"#;
    let (base_url, _requests) = spawn_gateway(vec![(400, declined)]).await;
    let client = NiubizClient::new(&config(&base_url), MerchantProfile::default()).unwrap();

    let outcome = client
        .authorize("tok", "card-token", amount(), "PEN", &PurchaseNumber::from("261017143005"))
        .await
        .unwrap();

    assert!(!outcome.approved);
    assert_eq!(outcome.masked_card.as_deref(), Some("455170******8059"));
    assert_eq!(outcome.raw_response, declined);
}

#[tokio::test]
async fn test_request_timeout_is_terminal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut stream).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let mut config = config(&format!("http://{}", addr));
    config.timeout = Duration::from_millis(200);
    let client = NiubizClient::new(&config, MerchantProfile::default()).unwrap();

    assert!(matches!(
        client.get_security_token().await,
        Err(CheckoutError::TimeoutError)
    ));
}
