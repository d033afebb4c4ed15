// NOTE: async-stripe is compiled with a minimal feature set (runtime-tokio-hyper, billing).
// Touching APIs outside those features will require updating Cargo.toml.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum StripeServiceError {
    #[error("stripe api error: {0}")]
    Api(String),
    #[error("stripe rejected request: {0}")]
    InvalidRequest(String),
    #[error("resource missing: {0}")]
    NotFound(String),
    #[error("webhook verification failed: {0}")]
    Webhook(String),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("other error: {0}")]
    Other(String),
}

impl StripeServiceError {
    pub fn is_resource_missing(&self) -> bool {
        matches!(self, StripeServiceError::NotFound(_))
    }
}

impl From<stripe::StripeError> for StripeServiceError {
    fn from(err: stripe::StripeError) -> Self {
        match err {
            stripe::StripeError::Stripe(req) => {
                let message = req.message.clone().unwrap_or_else(|| req.to_string());
                if matches!(req.code, Some(stripe::ErrorCode::ResourceMissing)) {
                    StripeServiceError::NotFound(message)
                } else if (400..500).contains(&req.http_status) {
                    StripeServiceError::InvalidRequest(message)
                } else {
                    StripeServiceError::Api(message)
                }
            }
            other => StripeServiceError::Api(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StripeServiceError {
    fn from(err: serde_json::Error) -> Self {
        StripeServiceError::Serde(err.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    pub r#type: String,
    pub payload: serde_json::Value,
}

/// One line item of a provider subscription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSubscriptionItem {
    pub id: String,
    pub subscription_id: String,
    pub plan_id: String,
    pub plan_active: bool,
    pub quantity: i64,
    pub amount: i64,
    pub product_id: String,
}

/// The provider's view of a subscription, as received from the API or a webhook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSubscription {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub items: Vec<RemoteSubscriptionItem>,
    /// Client secret of the latest invoice's payment intent, when expanded.
    pub client_secret: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: String,
    pub active: bool,
    pub name: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait StripeService: Send + Sync {
    async fn create_customer(&self, email: &str, name: &str) -> Result<String, StripeServiceError>;

    async fn retrieve_customer_email(
        &self,
        customer_id: &str,
    ) -> Result<Option<String>, StripeServiceError>;

    /// Price object with its product expanded, in the provider's JSON shape.
    async fn retrieve_price(&self, price_id: &str) -> Result<serde_json::Value, StripeServiceError>;

    async fn retrieve_product(&self, product_id: &str) -> Result<ProductInfo, StripeServiceError>;

    /// Card payment methods attached to the customer, in the provider's JSON shape.
    async fn list_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<Vec<serde_json::Value>, StripeServiceError>;

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError>;

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError>;

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError>;

    /// Swaps the price of one item and turns off `cancel_at_period_end`.
    async fn update_subscription_price(
        &self,
        subscription_id: &str,
        item_id: &str,
        price_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError>;

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, StripeServiceError>;
}

mod live;
#[cfg(test)]
mod mock;
pub mod signature;
pub mod wire;

pub use live::LiveStripeService;
#[cfg(test)]
pub use mock::{remote_subscription, MockStripeService};
