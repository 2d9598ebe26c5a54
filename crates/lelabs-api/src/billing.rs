use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::retry::{is_retryable_status, with_retry_if, RetryConfig};

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Failed to fetch products: status {0}")]
    Status(u16),

    #[error("{0}")]
    Checkout(String),

    #[error("Checkout response did not include a session URL")]
    MissingSessionUrl,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl BillingError {
    /// Transport hiccups and 5xx/429 are worth retrying; everything else is final
    pub fn is_retryable(&self) -> bool {
        match self {
            BillingError::Status(code) => reqwest::StatusCode::from_u16(*code)
                .map(is_retryable_status)
                .unwrap_or(false),
            BillingError::Network(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;

/// A purchasable credit pack or subscription plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub credits: i64,
    pub price: ProductPrice,
    #[serde(default)]
    pub metadata: ProductMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPrice {
    #[serde(default)]
    pub id: String,
    /// Smallest currency unit (cents)
    pub amount: i64,
    pub currency: String,
    #[serde(rename = "type")]
    pub kind: PriceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    OneTime,
    Recurring,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMetadata {
    #[serde(default)]
    pub bonus: i64,
    #[serde(default)]
    pub token_receive: i64,
    #[serde(default)]
    pub popular: bool,
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutResponse {
    session_url: Option<String>,
    message: Option<String>,
}

/// Client for the payment provider's product listing and checkout endpoints
pub struct BillingClient {
    client: reqwest::Client,
    products_url: String,
    checkout_url: String,
    retry_config: RetryConfig,
}

impl BillingClient {
    pub fn new(products_url: impl Into<String>, checkout_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            products_url: products_url.into(),
            checkout_url: checkout_url.into(),
            retry_config: RetryConfig::default(),
        })
    }

    /// Replace the retry policy used for product listing
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// List every product (one-time and recurring), retrying transient failures
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let products = with_retry_if(
            &self.retry_config,
            || async {
                let response = self.client.get(&self.products_url).send().await?;

                let status = response.status();
                if !status.is_success() {
                    return Err(BillingError::Status(status.as_u16()));
                }

                let body: ProductsResponse = response.json().await?;
                Ok(body.products)
            },
            BillingError::is_retryable,
        )
        .await?;

        debug!("Fetched {} products", products.len());
        Ok(products)
    }

    /// Ask the provider for a checkout session; the returned URL is where
    /// the user should be sent to pay. Never retried.
    pub async fn create_checkout_session(
        &self,
        product_id: &str,
        access_token: Option<&str>,
    ) -> Result<CheckoutSession> {
        let mut request = self
            .client
            .post(&self.checkout_url)
            .json(&serde_json::json!({ "productId": product_id }));

        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body: CheckoutResponse = serde_json::from_str(&text).unwrap_or_default();
            return Err(BillingError::Checkout(
                body.message
                    .unwrap_or_else(|| "Error during checkout".to_string()),
            ));
        }

        let body: CheckoutResponse = serde_json::from_str(&text)?;
        match body.session_url {
            Some(session_url) if !session_url.is_empty() => {
                info!("Checkout session created for product {}", product_id);
                Ok(CheckoutSession { session_url })
            }
            _ => match body.message {
                Some(message) => Err(BillingError::Checkout(message)),
                None => Err(BillingError::MissingSessionUrl),
            },
        }
    }
}
