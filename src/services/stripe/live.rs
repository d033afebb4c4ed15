use super::{
    signature, wire, ProductInfo, RemoteSubscription, StripeEvent, StripeService,
    StripeServiceError,
};
use async_trait::async_trait;

/// Expansion needed to read the latest payment intent's client secret.
const SUBSCRIPTION_EXPAND: &[&str] = &["latest_invoice.payment_intent"];

pub struct LiveStripeService {
    client: stripe::Client,
    webhook_secret: String,
}

impl LiveStripeService {
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        let client = stripe::Client::new(secret_key);
        Self {
            client,
            webhook_secret: webhook_secret.into(),
        }
    }

    pub fn from_settings(settings: &crate::config::StripeSettings) -> Self {
        Self::new(settings.secret_key.clone(), settings.webhook_secret.clone())
    }
}

fn parse_customer_id(id: &str) -> Result<stripe::CustomerId, StripeServiceError> {
    id.parse::<stripe::CustomerId>()
        .map_err(|e| StripeServiceError::Other(format!("invalid customer id {id}: {e}")))
}

fn parse_subscription_id(id: &str) -> Result<stripe::SubscriptionId, StripeServiceError> {
    id.parse::<stripe::SubscriptionId>()
        .map_err(|e| StripeServiceError::Other(format!("invalid subscription id {id}: {e}")))
}

fn into_subscription(sub: &stripe::Subscription) -> Result<RemoteSubscription, StripeServiceError> {
    wire::subscription_from_value(wire::to_value(sub)?)
}

#[async_trait]
impl StripeService for LiveStripeService {
    async fn create_customer(&self, email: &str, name: &str) -> Result<String, StripeServiceError> {
        let mut params = stripe::CreateCustomer::new();
        params.email = Some(email);
        params.name = Some(name);
        let customer = stripe::Customer::create(&self.client, params).await?;
        Ok(customer.id.to_string())
    }

    async fn retrieve_customer_email(
        &self,
        customer_id: &str,
    ) -> Result<Option<String>, StripeServiceError> {
        let customer_id = parse_customer_id(customer_id)?;
        let customer = stripe::Customer::retrieve(&self.client, &customer_id, &[]).await?;
        wire::customer_email_from_value(wire::to_value(&customer)?)
    }

    async fn retrieve_price(&self, price_id: &str) -> Result<serde_json::Value, StripeServiceError> {
        let price_id = price_id
            .parse::<stripe::PriceId>()
            .map_err(|e| StripeServiceError::Other(format!("invalid price id {price_id}: {e}")))?;
        let price = stripe::Price::retrieve(&self.client, &price_id, &["product"]).await?;
        wire::to_value(&price)
    }

    async fn retrieve_product(&self, product_id: &str) -> Result<ProductInfo, StripeServiceError> {
        let id = product_id.parse::<stripe::ProductId>().map_err(|e| {
            StripeServiceError::Other(format!("invalid product id {product_id}: {e}"))
        })?;
        let product = stripe::Product::retrieve(&self.client, &id, &[]).await?;
        wire::product_from_value(wire::to_value(&product)?)
    }

    async fn list_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<Vec<serde_json::Value>, StripeServiceError> {
        let mut params = stripe::ListPaymentMethods::new();
        params.customer = Some(parse_customer_id(customer_id)?);
        params.type_ = Some(stripe::PaymentMethodTypeFilter::Card);

        let list = stripe::PaymentMethod::list(&self.client, &params).await?;
        list.data.iter().map(wire::to_value).collect()
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError> {
        let mut params = stripe::CreateSubscription::new(parse_customer_id(customer_id)?);
        params.items = Some(vec![stripe::CreateSubscriptionItems {
            price: Some(price_id.to_string()),
            ..Default::default()
        }]);
        // Save the payment method on the subscription once the first payment succeeds.
        params.payment_settings = Some(stripe::CreateSubscriptionPaymentSettings {
            save_default_payment_method: Some(
                stripe::CreateSubscriptionPaymentSettingsSaveDefaultPaymentMethod::OnSubscription,
            ),
            ..Default::default()
        });
        params.payment_behavior = Some(stripe::SubscriptionPaymentBehavior::DefaultIncomplete);
        params.expand = SUBSCRIPTION_EXPAND;

        let sub = stripe::Subscription::create(&self.client, params).await?;
        into_subscription(&sub)
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError> {
        let sub_id = parse_subscription_id(subscription_id)?;
        let sub = stripe::Subscription::retrieve(&self.client, &sub_id, SUBSCRIPTION_EXPAND).await?;
        into_subscription(&sub)
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError> {
        let sub_id = parse_subscription_id(subscription_id)?;
        let sub = stripe::Subscription::cancel(
            &self.client,
            &sub_id,
            stripe::CancelSubscription::default(),
        )
        .await?;
        into_subscription(&sub)
    }

    async fn update_subscription_price(
        &self,
        subscription_id: &str,
        item_id: &str,
        price_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError> {
        let sub_id = parse_subscription_id(subscription_id)?;
        let mut params = stripe::UpdateSubscription::new();
        params.cancel_at_period_end = Some(false);
        params.items = Some(vec![stripe::UpdateSubscriptionItems {
            id: Some(item_id.to_string()),
            price: Some(price_id.to_string()),
            ..Default::default()
        }]);
        let sub = stripe::Subscription::update(&self.client, &sub_id, params).await?;
        into_subscription(&sub)
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, StripeServiceError> {
        signature::construct_event(payload, signature_header, &self.webhook_secret)
    }
}
