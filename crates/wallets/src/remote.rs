//! The remote signer surface: keys held by a signing service, authorized with passkeys.

use crate::account::AuthContext;
use alloy_consensus::{SignableTransaction, TypedTransaction};
use alloy_primitives::{Address, Bytes, hex};
use alloy_rpc_types::TransactionRequest;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

const LIST_AUTHENTICATORS_PATH: &str = "/public/v1/query/get_authenticators";
const SIGN_TRANSACTION_PATH: &str = "/public/v1/submit/sign_transaction";
const SIGN_TRANSACTION_ACTIVITY: &str = "ACTIVITY_TYPE_SIGN_TRANSACTION_V2";
const ACTIVITY_COMPLETED: &str = "ACTIVITY_STATUS_COMPLETED";

#[derive(Debug, thiserror::Error)]
pub enum RemoteSignerError {
    #[error("remote signer request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote signer answered {status}: {message}")]
    Api { status: u16, message: String },
    #[error("signing activity ended in {status}")]
    ActivityFailed { status: String },
    #[error("remote signer returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("transaction can not be signed remotely: {0}")]
    UnsignableTransaction(String),
    #[error("failed to stamp request: {0}")]
    Stamp(String),
}

/// A passkey credential registered for a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authenticator {
    pub authenticator_id: String,
    #[serde(default)]
    pub authenticator_name: String,
}

/// Signs transactions for an `(organization, address)` pair.
#[async_trait::async_trait]
pub trait RemoteSigningService: Send + Sync {
    /// Passkey credentials registered for the user of `auth`.
    async fn authenticators(
        &self,
        auth: &AuthContext,
    ) -> Result<Vec<Authenticator>, RemoteSignerError>;

    /// Signs a fully prepared `tx` with the key of `address`, returning the raw signed
    /// transaction.
    async fn sign_transaction(
        &self,
        auth: &AuthContext,
        address: Address,
        tx: &TransactionRequest,
    ) -> Result<Bytes, RemoteSignerError>;
}

/// Produces the credential header that authorizes a request body.
pub trait CredentialStamper: Send + Sync {
    /// Returns `(header name, header value)` for `body`.
    fn stamp(&self, body: &str) -> Result<(String, String), RemoteSignerError>;
}

/// Sends a stamp obtained out of band, e.g. from a completed passkey ceremony.
#[derive(Clone)]
pub struct StaticStamper {
    header: String,
    value: String,
}

impl StaticStamper {
    pub fn new(header: impl Into<String>, value: impl Into<String>) -> Self {
        Self { header: header.into(), value: value.into() }
    }
}

impl fmt::Debug for StaticStamper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticStamper").field("header", &self.header).finish_non_exhaustive()
    }
}

impl CredentialStamper for StaticStamper {
    fn stamp(&self, _body: &str) -> Result<(String, String), RemoteSignerError> {
        Ok((self.header.clone(), self.value.clone()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticatorsRequest<'a> {
    organization_id: &'a str,
    user_id: &'a str,
}

#[derive(Deserialize)]
struct AuthenticatorsResponse {
    #[serde(default)]
    authenticators: Vec<Authenticator>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignTransactionRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp_ms: String,
    organization_id: &'a str,
    parameters: SignTransactionParameters,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignTransactionParameters {
    sign_with: String,
    unsigned_transaction: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ActivityResponse {
    activity: Activity,
}

#[derive(Deserialize)]
struct Activity {
    status: String,
    #[serde(default)]
    result: Option<ActivityResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityResult {
    sign_transaction_result: Option<SignTransactionResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignTransactionResult {
    signed_transaction: String,
}

/// HTTP client of the remote signing service.
pub struct RemoteSignerClient {
    client: reqwest::Client,
    api_url: String,
    stamper: Box<dyn CredentialStamper>,
}

impl fmt::Debug for RemoteSignerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSignerClient").field("api_url", &self.api_url).finish_non_exhaustive()
    }
}

impl RemoteSignerClient {
    pub fn new(
        api_url: impl Into<String>,
        stamper: impl CredentialStamper + 'static,
    ) -> Result<Self, RemoteSignerError> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self::with_client(client, api_url, stamper))
    }

    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        stamper: impl CredentialStamper + 'static,
    ) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url, stamper: Box::new(stamper) }
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, RemoteSignerError> {
        let body = serde_json::to_string(body)
            .map_err(|err| RemoteSignerError::InvalidResponse(err.to_string()))?;
        let (header, stamp) = self.stamper.stamp(&body)?;
        let resp = self
            .client
            .post(format!("{}{path}", self.api_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(header, stamp)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RemoteSignerError::Api { status: status.as_u16(), message });
        }
        resp.json().await.map_err(|err| RemoteSignerError::InvalidResponse(err.to_string()))
    }
}

#[async_trait::async_trait]
impl RemoteSigningService for RemoteSignerClient {
    async fn authenticators(
        &self,
        auth: &AuthContext,
    ) -> Result<Vec<Authenticator>, RemoteSignerError> {
        let request = AuthenticatorsRequest {
            organization_id: &auth.organization_id,
            user_id: &auth.user_id,
        };
        let resp: AuthenticatorsResponse = self.post(LIST_AUTHENTICATORS_PATH, &request).await?;
        Ok(resp.authenticators)
    }

    async fn sign_transaction(
        &self,
        auth: &AuthContext,
        address: Address,
        tx: &TransactionRequest,
    ) -> Result<Bytes, RemoteSignerError> {
        let request = SignTransactionRequest {
            kind: SIGN_TRANSACTION_ACTIVITY,
            timestamp_ms: timestamp_ms(),
            organization_id: &auth.organization_id,
            parameters: SignTransactionParameters {
                sign_with: address.to_checksum(None),
                unsigned_transaction: hex::encode(unsigned_payload(tx)?),
                kind: "TRANSACTION_TYPE_ETHEREUM",
            },
        };
        let resp: ActivityResponse = self.post(SIGN_TRANSACTION_PATH, &request).await?;
        if resp.activity.status != ACTIVITY_COMPLETED {
            return Err(RemoteSignerError::ActivityFailed { status: resp.activity.status });
        }
        let signed = resp
            .activity
            .result
            .and_then(|result| result.sign_transaction_result)
            .ok_or_else(|| {
                RemoteSignerError::InvalidResponse("missing signed transaction".into())
            })?;
        hex::decode(signed.signed_transaction.trim_start_matches("0x"))
            .map(Bytes::from)
            .map_err(|err| RemoteSignerError::InvalidResponse(err.to_string()))
    }
}

/// The unsigned RLP payload of a prepared transaction.
pub fn unsigned_payload(tx: &TransactionRequest) -> Result<Vec<u8>, RemoteSignerError> {
    let typed = tx.clone().build_typed_tx().map_err(|_| {
        RemoteSignerError::UnsignableTransaction("transaction is missing required fields".into())
    })?;
    match typed {
        TypedTransaction::Eip1559(tx) => Ok(tx.encoded_for_signing()),
        TypedTransaction::Legacy(tx) => Ok(tx.encoded_for_signing()),
        TypedTransaction::Eip2930(tx) => Ok(tx.encoded_for_signing()),
        other => Err(RemoteSignerError::UnsignableTransaction(format!(
            "unsupported transaction type {:?}",
            other.tx_type()
        ))),
    }
}

fn timestamp_ms() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{TxKind, U256};
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use serde_json::{Value, json};

    const ALICE: Address = Address::repeat_byte(0xa1);

    fn auth() -> AuthContext {
        AuthContext { user_id: "user-1".to_string(), organization_id: "org-1".to_string() }
    }

    fn prepared() -> TransactionRequest {
        TransactionRequest {
            from: Some(ALICE),
            to: Some(TxKind::Call(Address::repeat_byte(0x55))),
            value: Some(U256::from(5)),
            nonce: Some(0),
            gas: Some(21_000),
            max_fee_per_gas: Some(2_000_000_000),
            max_priority_fee_per_gas: Some(1_000_000_000),
            chain_id: Some(11155111),
            ..Default::default()
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    #[test]
    fn encodes_prepared_transaction() {
        let payload = unsigned_payload(&prepared()).unwrap();
        // EIP-2718 type byte of a dynamic fee transaction
        assert_eq!(payload[0], 0x02);

        let err = unsigned_payload(&TransactionRequest::default()).unwrap_err();
        assert!(matches!(err, RemoteSignerError::UnsignableTransaction(_)), "{err}");
    }

    #[tokio::test]
    async fn lists_authenticators_with_stamp() {
        let router = Router::new().route(
            LIST_AUTHENTICATORS_PATH,
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["X-Stamp-WebAuthn"], "stamp");
                assert_eq!(body, json!({ "organizationId": "org-1", "userId": "user-1" }));
                Json(json!({
                    "authenticators": [{ "authenticatorId": "a-1", "authenticatorName": "laptop" }]
                }))
            }),
        );
        let url = serve(router).await;
        let client = RemoteSignerClient::new(url, StaticStamper::new("X-Stamp-WebAuthn", "stamp"))
            .unwrap();

        let authenticators = client.authenticators(&auth()).await.unwrap();
        assert_eq!(
            authenticators,
            vec![Authenticator {
                authenticator_id: "a-1".to_string(),
                authenticator_name: "laptop".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn returns_signed_transaction() {
        let router = Router::new().route(
            SIGN_TRANSACTION_PATH,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["type"], SIGN_TRANSACTION_ACTIVITY);
                assert_eq!(body["organizationId"], "org-1");
                assert_eq!(body["parameters"]["signWith"], ALICE.to_checksum(None));
                Json(json!({
                    "activity": {
                        "status": ACTIVITY_COMPLETED,
                        "result": { "signTransactionResult": { "signedTransaction": "02abcd" } }
                    }
                }))
            }),
        );
        let url = serve(router).await;
        let client = RemoteSignerClient::new(url, StaticStamper::new("X-Stamp", "s")).unwrap();

        let raw = client.sign_transaction(&auth(), ALICE, &prepared()).await.unwrap();
        assert_eq!(raw, Bytes::from_static(&[0x02, 0xab, 0xcd]));
    }

    #[tokio::test]
    async fn surfaces_api_errors() {
        let router = Router::new().route(
            SIGN_TRANSACTION_PATH,
            post(|| async {
                Json(json!({ "activity": { "status": "ACTIVITY_STATUS_REJECTED" } }))
            }),
        )
        .route(
            LIST_AUTHENTICATORS_PATH,
            post(|| async { (axum::http::StatusCode::UNAUTHORIZED, "bad stamp") }),
        );
        let url = serve(router).await;
        let client = RemoteSignerClient::new(url, StaticStamper::new("X-Stamp", "s")).unwrap();

        let err = client.sign_transaction(&auth(), ALICE, &prepared()).await.unwrap_err();
        assert!(matches!(err, RemoteSignerError::ActivityFailed { .. }), "{err}");

        let err = client.authenticators(&auth()).await.unwrap_err();
        match err {
            RemoteSignerError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad stamp");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
