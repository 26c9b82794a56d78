//! Full request/response lifecycle against a local fake of the platform.
//!
//! The fake checks the merchant signature on every request the way the real
//! platform does, and signs its own responses with the platform key.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use rsa::pkcs8::DecodePublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use wxpay::canonical::{request_message, response_message};
use wxpay::{ApiClient, Credentials, ErrorStage, Method, Signer, WxPayClient, WxPayError};

const MERCHANT_KEY: &str = include_str!("fixtures/merchant_key.pem");
const MERCHANT_PUB: &str = include_str!("fixtures/merchant_pub.pem");
const PLATFORM_KEY: &str = include_str!("fixtures/platform_key.pem");
const PLATFORM_PUB: &str = include_str!("fixtures/platform_pub.pem");

const MCHID: u64 = 1900000109;
const SERIAL: &str = "ABC123";

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Split `SCHEME k="v",k="v"` into the scheme and its parameters.
fn parse_authorization(value: &str) -> (String, Vec<(String, String)>) {
    let (scheme, params) = value.split_once(' ').unwrap();
    let params = params
        .split(',')
        .map(|kv| {
            let (k, v) = kv.split_once('=').unwrap();
            (k.to_string(), v.trim_matches('"').to_string())
        })
        .collect();
    (scheme.to_string(), params)
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> &'a str {
    &params.iter().find(|(k, _)| k == key).unwrap().1
}

/// How the fake answers a request it has authenticated.
#[derive(Clone)]
struct FakePlatform {
    status: u16,
    body: String,
    /// Sign the response with the platform key.
    sign: bool,
    /// Alter the body after signing.
    tamper: bool,
}

impl FakePlatform {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            sign: true,
            tamper: false,
        }
    }

    fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    fn unsigned(mut self) -> Self {
        self.sign = false;
        self
    }

    fn tampered(mut self) -> Self {
        self.tamper = true;
        self
    }

    fn merchant_signature_valid(request: &Request) -> bool {
        let Some(auth) = request.headers.get("authorization") else {
            return false;
        };
        let (_, params) = parse_authorization(auth.to_str().unwrap());
        let mut canonical_path = request.url.path().to_string();
        if let Some(q) = request.url.query() {
            canonical_path = format!("{canonical_path}?{q}");
        }
        let message = request_message(
            request.method.as_str(),
            &canonical_path,
            param(&params, "timestamp").parse().unwrap(),
            param(&params, "nonce_str"),
            std::str::from_utf8(&request.body).unwrap(),
        );
        let key = rsa::RsaPublicKey::from_public_key_pem(MERCHANT_PUB).unwrap();
        let signature = base64::engine::general_purpose::STANDARD
            .decode(param(&params, "signature"))
            .unwrap();
        key.verify(
            rsa::Pkcs1v15Sign::new::<Sha256>(),
            &Sha256::digest(message.as_bytes()),
            &signature,
        )
        .is_ok()
    }
}

impl Respond for FakePlatform {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if !Self::merchant_signature_valid(request) {
            return ResponseTemplate::new(401)
                .set_body_string(r#"{"code":"SIGN_ERROR","message":"bad merchant signature"}"#);
        }

        let timestamp = now().to_string();
        let nonce = "5K8264ILTKCH16CQ2502SI8ZNMTM67VS";
        let mut template = ResponseTemplate::new(self.status);
        if self.sign {
            let message = response_message(&timestamp, nonce, self.body.as_bytes());
            let signature = Signer::from_pkcs8_pem(PLATFORM_KEY)
                .unwrap()
                .sign(std::str::from_utf8(&message).unwrap())
                .unwrap();
            template = template
                .insert_header("Wechatpay-Timestamp", timestamp.as_str())
                .insert_header("Wechatpay-Nonce", nonce)
                .insert_header("Wechatpay-Signature", signature.as_str())
                .insert_header("Wechatpay-Serial", "PLATFORM01");
        }
        let body = if self.tamper {
            self.body.replace("100", "999")
        } else {
            self.body.clone()
        };
        template.set_body_raw(body, "application/json")
    }
}

fn client_for(server: &MockServer) -> WxPayClient {
    let credentials = Credentials::new(MCHID, SERIAL, MERCHANT_KEY, PLATFORM_PUB).unwrap();
    WxPayClient::new(credentials)
        .unwrap()
        .with_base_url(&format!("{}/v3/", server.uri()))
        .unwrap()
}

#[derive(Debug, Default, Deserialize)]
struct Stock {
    stock_id: String,
    stock_name: String,
    max_coupons: u64,
}

#[tokio::test]
async fn signed_get_is_accepted_and_verified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/marketing/srv/stocks/STOCK1"))
        .respond_with(FakePlatform::ok(
            r#"{"stock_id":"STOCK1","stock_name":"spring sale","max_coupons":100}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client
        .request_without_body(Method::GET, "marketing/srv/stocks/STOCK1")
        .unwrap();
    let stock: Stock = client.execute_json(request).await.unwrap();
    assert_eq!(stock.stock_id, "STOCK1");
    assert_eq!(stock.stock_name, "spring sale");
    assert_eq!(stock.max_coupons, 100);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let auth = received[0].headers.get("authorization").unwrap().to_str().unwrap();
    let (scheme, params) = parse_authorization(auth);
    assert_eq!(scheme, "WECHATPAY2-SHA256-RSA2048");
    let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["mchid", "nonce_str", "signature", "timestamp", "serial_no"]);
    assert_eq!(param(&params, "mchid"), "1900000109");
    assert_eq!(param(&params, "serial_no"), SERIAL);
    assert_eq!(param(&params, "nonce_str").len(), 32);
    let ts: i64 = param(&params, "timestamp").parse().unwrap();
    assert!((now() - ts).abs() <= 1);
    assert!(received[0].body.is_empty());
}

#[tokio::test]
async fn signed_post_body_matches_wire_bytes() {
    #[derive(Serialize)]
    struct CreateCoupon<'a> {
        stock_id: &'a str,
        out_request_no: &'a str,
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/marketing/srv/users/o4GgauInH_RCEdvrrNGrntXDuXXX/coupons"))
        .respond_with(FakePlatform::ok(r#"{"coupon_id":"9867041"}"#))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body = CreateCoupon {
        stock_id: "9856000",
        out_request_no: "89560002019101000121",
    };
    let request = client
        .new_request(
            Method::POST,
            "marketing/srv/users/o4GgauInH_RCEdvrrNGrntXDuXXX/coupons",
            Some(&body),
        )
        .unwrap();
    let response = client.execute(request).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.body(), br#"{"coupon_id":"9867041"}"#);

    let received = server.received_requests().await.unwrap();
    assert_eq!(
        received[0].body,
        br#"{"stock_id":"9856000","out_request_no":"89560002019101000121"}"#
    );
    assert_eq!(
        received[0].headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn query_string_is_signed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/marketing/srv/stocks"))
        .respond_with(FakePlatform::ok(r#"{"data":[],"total_count":0}"#))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client
        .request_without_body(Method::GET, "marketing/srv/stocks?offset=0&limit=10")
        .unwrap();
    // The fake answers 401 unless the signature covered the query too.
    let value: serde_json::Value = client.execute_json(request).await.unwrap();
    assert_eq!(value["total_count"], 0);
}

#[tokio::test]
async fn tampered_body_fails_verification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/marketing/srv/stocks/STOCK1"))
        .respond_with(
            FakePlatform::ok(r#"{"stock_id":"STOCK1","stock_name":"x","max_coupons":100}"#)
                .tampered(),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client
        .request_without_body(Method::GET, "marketing/srv/stocks/STOCK1")
        .unwrap();
    let err = client.execute_json::<Stock>(request).await.unwrap_err();
    assert!(matches!(err, WxPayError::SignatureInvalid));
    assert_eq!(err.stage(), ErrorStage::Verify);
}

#[tokio::test]
async fn missing_signature_headers_fail_verification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/certificates"))
        .respond_with(FakePlatform::ok(r#"{"data":[]}"#).unsigned())
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client.request_without_body(Method::GET, "certificates").unwrap();
    let err = client.execute(request).await.unwrap_err();
    assert!(matches!(err, WxPayError::SignatureMissing(_)));
    assert!(err.is_authentication_failure());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn verified_error_response_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/marketing/srv/stocks/STOCK1/pause"))
        .respond_with(
            FakePlatform::ok(r#"{"code":"RESOURCE_NOT_EXISTS","message":"stock not found"}"#)
                .status(404),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client
        .request_without_body(Method::POST, "marketing/srv/stocks/STOCK1/pause")
        .unwrap();
    match client.execute(request).await {
        Err(WxPayError::Api {
            status,
            code,
            message,
        }) => {
            assert_eq!(status, 404);
            assert_eq!(code, "RESOURCE_NOT_EXISTS");
            assert_eq!(message, "stock not found");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/certificates"))
        .respond_with(
            FakePlatform::ok(r#"{"code":"SYSTEM_ERROR","message":"try again"}"#).status(500),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client.request_without_body(Method::GET, "certificates").unwrap();
    let err = client.execute(request).await.unwrap_err();
    assert_eq!(err.stage(), ErrorStage::Api);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn raw_body_copies_into_sink() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/bill/tradebill"))
        .respond_with(FakePlatform::ok("trade_time,transaction_id\n2020-01-01,42\n"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client.request_without_body(Method::GET, "bill/tradebill").unwrap();
    let mut sink = Vec::new();
    let n = client.execute_into(request, &mut sink).await.unwrap();
    assert_eq!(n as usize, sink.len());
    assert_eq!(sink, b"trade_time,transaction_id\n2020-01-01,42\n");
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let credentials = Credentials::new(MCHID, SERIAL, MERCHANT_KEY, PLATFORM_PUB).unwrap();
    let client = WxPayClient::new(credentials)
        .unwrap()
        .with_base_url(&format!("http://127.0.0.1:{port}/v3/"))
        .unwrap();
    let request = client.request_without_body(Method::GET, "certificates").unwrap();
    let err = client.execute(request).await.unwrap_err();
    assert_eq!(err.stage(), ErrorStage::Transport);
    assert!(err.is_retryable());
}
