/// Error type for payment gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request failed (network, DNS, timeout, etc.).
    #[error("Gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway answered with a non-2xx status code.
    #[error("Gateway returned HTTP {0}")]
    HttpStatus(u16),

    /// The gateway answered 2xx but reported an error in the body.
    #[error("Gateway rejected the request: {0}")]
    Rejected(String),

    /// A required field was missing from the gateway response.
    #[error("Gateway response is missing {0}")]
    MissingField(&'static str),

    /// No gateway credentials are configured.
    #[error("Payment gateway is not configured")]
    NotConfigured,
}

impl GatewayError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::HttpStatus(code) => *code >= 500 || *code == 429,
            Self::Rejected(_) | Self::MissingField(_) | Self::NotConfigured => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}
