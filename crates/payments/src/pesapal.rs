//! PesaPal v3 client.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::GatewayError;
use crate::gateway::{OrderRequest, OrderResponse, PaymentGateway, TransactionStatus};

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

const DEFAULT_BASE_URL: &str = "https://cybqa.pesapal.com/pesapalv3/api";
const DEFAULT_CURRENCY: &str = "UGX";
const DEFAULT_COUNTRY_CODE: &str = "UG";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// PesapalConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PesapalConfig {
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    /// Where the gateway sends IPN callbacks and redirects the payer.
    pub callback_url: String,
    pub currency: String,
    pub country_code: String,
    /// Timeout for a single HTTP attempt.
    pub timeout: Duration,
}

impl PesapalConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `PESAPAL_CONSUMER_KEY` is not set, signalling that
    /// payments are not configured.
    ///
    /// | Variable                  | Required | Default                                   |
    /// |---------------------------|----------|-------------------------------------------|
    /// | `PESAPAL_CONSUMER_KEY`    | yes      | --                                        |
    /// | `PESAPAL_CONSUMER_SECRET` | no       | empty                                     |
    /// | `PESAPAL_CALLBACK_URL`    | no       | `http://localhost:3000/api/v1/payments/webhook` |
    /// | `PESAPAL_BASE_URL`        | no       | `https://cybqa.pesapal.com/pesapalv3/api` |
    /// | `PESAPAL_CURRENCY`        | no       | `UGX`                                     |
    /// | `PESAPAL_COUNTRY_CODE`    | no       | `UG`                                      |
    /// | `PESAPAL_TIMEOUT_SECS`    | no       | `10`                                      |
    pub fn from_env() -> Option<Self> {
        let consumer_key = std::env::var("PESAPAL_CONSUMER_KEY").ok()?;
        Some(Self {
            base_url: std::env::var("PESAPAL_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            consumer_key,
            consumer_secret: std::env::var("PESAPAL_CONSUMER_SECRET").unwrap_or_default(),
            callback_url: std::env::var("PESAPAL_CALLBACK_URL").unwrap_or_else(|_| {
                "http://localhost:3000/api/v1/payments/webhook".to_string()
            }),
            currency: std::env::var("PESAPAL_CURRENCY")
                .unwrap_or_else(|_| DEFAULT_CURRENCY.to_string()),
            country_code: std::env::var("PESAPAL_COUNTRY_CODE")
                .unwrap_or_else(|_| DEFAULT_COUNTRY_CODE.to_string()),
            timeout: Duration::from_secs(
                std::env::var("PESAPAL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }

    /// Currency used when no gateway is configured.
    pub fn default_currency() -> String {
        std::env::var("PESAPAL_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string())
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Error object embedded in otherwise-2xx responses.
#[derive(Debug, Deserialize)]
struct BodyError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    error: Option<BodyError>,
}

#[derive(Debug, Deserialize)]
struct IpnRegistration {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    ipn_id: Option<String>,
    #[serde(default)]
    error: Option<BodyError>,
}

/// Turn an embedded error object into [`GatewayError::Rejected`].
fn check_body_error(error: Option<BodyError>) -> Result<(), GatewayError> {
    match error {
        Some(BodyError { code, message }) if code.is_some() || message.is_some() => {
            Err(GatewayError::Rejected(
                message.or(code).unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
        _ => Ok(()),
    }
}

/// Choose the IPN registered for `callback_url`, else the first one listed.
fn select_ipn(list: Vec<IpnRegistration>, callback_url: &str) -> Option<String> {
    let exact = list
        .iter()
        .find(|ipn| ipn.url.as_deref() == Some(callback_url))
        .and_then(|ipn| ipn.ipn_id.clone());
    exact.or_else(|| list.into_iter().find_map(|ipn| ipn.ipn_id))
}

// ---------------------------------------------------------------------------
// PesapalClient
// ---------------------------------------------------------------------------

pub struct PesapalClient {
    config: PesapalConfig,
    client: reqwest::Client,
    /// IPN id, cached after the first successful registration or lookup.
    ipn_id: Mutex<Option<String>>,
}

impl PesapalClient {
    pub fn new(config: PesapalConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            client,
            ipn_id: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Run `attempt` with backoff between retryable failures.
    async fn with_retry<T, F, Fut>(&self, operation: &'static str, attempt: F) -> Result<T, GatewayError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, GatewayError>>,
    {
        for (n, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(
                        operation,
                        attempt = n + 1,
                        error = %e,
                        "Gateway call failed, retrying",
                    );
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
                Err(e) => return Err(e),
            }
        }

        // Final attempt after the last backoff.
        attempt().await.inspect_err(|e| {
            tracing::error!(operation, error = %e, "Gateway call failed after all retries");
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::HttpStatus(status.as_u16()));
        }
        Ok(response.json::<T>().await?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<T, GatewayError> {
        let mut request = self
            .client
            .post(self.url(path))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Self::decode(request.send().await?).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn lookup_ipn(&self, token: &str) -> Result<Option<String>, GatewayError> {
        let list: Vec<IpnRegistration> = self
            .with_retry("get_ipn_list", || {
                self.get_json("URLSetup/GetIpnList", token, &[])
            })
            .await?;
        Ok(select_ipn(list, &self.config.callback_url))
    }

    fn order_body(&self, order: &OrderRequest, ipn_id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": order.merchant_reference,
            "currency": self.config.currency,
            "amount": order.amount,
            "description": order.description,
            "callback_url": self.config.callback_url,
            "notification_id": ipn_id,
            "billing_address": {
                "email_address": order.payer_email,
                "phone_number": order.payer_phone,
                "country_code": self.config.country_code,
                "first_name": order.payer_first_name,
                "last_name": order.payer_last_name,
            },
        })
    }
}

/// Body shape of `SubmitOrderRequest` responses.
#[derive(Debug, Deserialize)]
struct SubmitOrderBody {
    #[serde(flatten)]
    order: OrderResponse,
    #[serde(default)]
    error: Option<BodyError>,
}

/// Body shape of `GetTransactionStatus` responses.
#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(flatten)]
    status: TransactionStatus,
    #[serde(default)]
    error: Option<BodyError>,
}

#[async_trait]
impl PaymentGateway for PesapalClient {
    fn currency(&self) -> &str {
        &self.config.currency
    }

    async fn request_auth_token(&self) -> Result<String, GatewayError> {
        let body = serde_json::json!({
            "consumer_key": self.config.consumer_key,
            "consumer_secret": self.config.consumer_secret,
        });
        let response: TokenResponse = self
            .with_retry("request_token", || {
                self.post_json("Auth/RequestToken", None, &body)
            })
            .await?;
        check_body_error(response.error)?;
        response.token.ok_or(GatewayError::MissingField("token"))
    }

    async fn register_callback_url(&self, token: &str) -> Result<String, GatewayError> {
        if let Some(id) = self.ipn_id.lock().await.clone() {
            return Ok(id);
        }

        let body = serde_json::json!({
            "url": self.config.callback_url,
            "ipn_notification_type": "POST",
        });
        let registered = self
            .with_retry("register_ipn", || {
                self.post_json::<IpnRegistration>("URLSetup/RegisterIPN", Some(token), &body)
            })
            .await
            .and_then(|r| {
                check_body_error(r.error)?;
                r.ipn_id.ok_or(GatewayError::MissingField("ipn_id"))
            });

        let ipn_id = match registered {
            Ok(id) => id,
            Err(e) => {
                // Registration fails when the URL is already registered.
                tracing::warn!(error = %e, "IPN registration failed, looking up existing IPNs");
                self.lookup_ipn(token)
                    .await?
                    .ok_or(GatewayError::MissingField("ipn_id"))?
            }
        };

        *self.ipn_id.lock().await = Some(ipn_id.clone());
        Ok(ipn_id)
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, GatewayError> {
        let token = self.request_auth_token().await?;
        let ipn_id = self.register_callback_url(&token).await?;
        let body = self.order_body(order, &ipn_id);

        let response: SubmitOrderBody = self
            .with_retry("submit_order", || {
                self.post_json("Transactions/SubmitOrderRequest", Some(&token), &body)
            })
            .await?;
        check_body_error(response.error)?;
        if response.order.order_tracking_id.is_none() {
            return Err(GatewayError::MissingField("order_tracking_id"));
        }

        tracing::info!(
            merchant_reference = %order.merchant_reference,
            order_tracking_id = ?response.order.order_tracking_id,
            "Gateway order submitted",
        );
        Ok(response.order)
    }

    async fn get_transaction_status(
        &self,
        order_tracking_id: &str,
    ) -> Result<TransactionStatus, GatewayError> {
        let token = self.request_auth_token().await?;
        let query = [("orderTrackingId", order_tracking_id)];
        let response: StatusBody = self
            .with_retry("transaction_status", || {
                self.get_json("Transactions/GetTransactionStatus", &token, &query)
            })
            .await?;
        check_body_error(response.error)?;
        Ok(response.status)
    }
}
