//! Gateway interface and the values crossing it.

use async_trait::async_trait;
use qgig_core::payments::PaymentStatus;
use serde::Deserialize;

use crate::error::GatewayError;

/// One order to submit.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub merchant_reference: String,
    pub amount: f64,
    pub description: String,
    pub payer_email: String,
    pub payer_phone: String,
    pub payer_first_name: String,
    pub payer_last_name: String,
}

/// Result of a submitted order.
///
/// The gateway has spelled these keys several ways across versions; all of
/// them are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderResponse {
    #[serde(
        default,
        alias = "OrderTrackingId",
        alias = "orderTrackingId",
        alias = "OrderTrackingID"
    )]
    pub order_tracking_id: Option<String>,

    #[serde(default, alias = "RedirectURL", alias = "redirectUrl")]
    pub redirect_url: Option<String>,

    #[serde(default)]
    pub merchant_reference: Option<String>,
}

/// Status of a transaction as reported by the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionStatus {
    /// Free-text status, e.g. `"Completed"`, `"Failed"`, `"INVALID"`.
    #[serde(default)]
    pub payment_status_description: String,

    #[serde(default, alias = "confirmation_code")]
    pub transaction_id: Option<String>,

    #[serde(default)]
    pub payment_method: Option<String>,

    #[serde(default)]
    pub amount: Option<f64>,

    #[serde(default)]
    pub currency: Option<String>,
}

impl TransactionStatus {
    /// Terminal status this report settles the payment to, if any.
    pub fn settled_status(&self) -> Option<PaymentStatus> {
        PaymentStatus::from_external(&self.payment_status_description)
    }
}

/// Remote payment provider.
///
/// Every call is fallible and may be slow; implementations own their retry
/// and timeout policy.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Currency every order is charged in.
    fn currency(&self) -> &str;

    async fn request_auth_token(&self) -> Result<String, GatewayError>;

    /// Register the notification callback and return its id.
    async fn register_callback_url(&self, token: &str) -> Result<String, GatewayError>;

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, GatewayError>;

    async fn get_transaction_status(
        &self,
        order_tracking_id: &str,
    ) -> Result<TransactionStatus, GatewayError>;
}

/// Gateway used when no credentials are configured. Every call fails with
/// [`GatewayError::NotConfigured`].
#[derive(Debug, Clone)]
pub struct DisabledGateway {
    currency: String,
}

impl DisabledGateway {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for DisabledGateway {
    fn currency(&self) -> &str {
        &self.currency
    }

    async fn request_auth_token(&self) -> Result<String, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn register_callback_url(&self, _token: &str) -> Result<String, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn submit_order(&self, _order: &OrderRequest) -> Result<OrderResponse, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn get_transaction_status(
        &self,
        _order_tracking_id: &str,
    ) -> Result<TransactionStatus, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}
