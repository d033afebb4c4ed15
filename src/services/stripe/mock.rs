use super::{
    signature, ProductInfo, RemoteSubscription, RemoteSubscriptionItem, StripeEvent,
    StripeService, StripeServiceError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockStripeService {
    pub customers: Arc<Mutex<HashMap<String, Option<String>>>>,
    pub prices: Arc<Mutex<HashMap<String, serde_json::Value>>>,
    pub products: Arc<Mutex<HashMap<String, ProductInfo>>>,
    /// price id -> product id, used when synthesizing subscription items
    pub price_products: Arc<Mutex<HashMap<String, String>>>,
    pub payment_methods: Arc<Mutex<Vec<serde_json::Value>>>,
    pub subscriptions: Arc<Mutex<HashMap<String, RemoteSubscription>>>,
    pub created: Arc<Mutex<Vec<(String, String)>>>,
    pub cancelled: Arc<Mutex<Vec<String>>>,
    pub updated: Arc<Mutex<Vec<(String, String, String)>>>,
    pub product_lookups: Arc<Mutex<usize>>,
    pub reject_signatures: bool,
    pub fail_create_customer: bool,
    pub fail_products: bool,
    counter: Arc<AtomicU64>,
}

impl MockStripeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_signatures() -> Self {
        Self {
            reject_signatures: true,
            ..Default::default()
        }
    }

    pub fn failing_products() -> Self {
        Self {
            fail_products: true,
            ..Default::default()
        }
    }

    pub fn failing_customers() -> Self {
        Self {
            fail_create_customer: true,
            ..Default::default()
        }
    }

    pub fn with_price(self, price_id: &str, product: ProductInfo) -> Self {
        self.prices.lock().unwrap().insert(
            price_id.to_string(),
            serde_json::json!({
                "id": price_id,
                "object": "price",
                "active": true,
                "nickname": serde_json::Value::Null,
                "unit_amount": 900,
                "product": {
                    "id": product.id,
                    "name": product.name,
                    "active": product.active,
                },
            }),
        );
        self.price_products
            .lock()
            .unwrap()
            .insert(price_id.to_string(), product.id.clone());
        self.products
            .lock()
            .unwrap()
            .insert(product.id.clone(), product);
        self
    }

    pub fn with_subscription(self, sub: RemoteSubscription) -> Self {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(sub.id.clone(), sub);
        self
    }

    pub fn subscription(&self, id: &str) -> Option<RemoteSubscription> {
        self.subscriptions.lock().unwrap().get(id).cloned()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}_test_{n}")
    }

    fn item_for(&self, sub_id: &str, item_id: String, price_id: &str) -> RemoteSubscriptionItem {
        let product_id = self
            .price_products
            .lock()
            .unwrap()
            .get(price_id)
            .cloned()
            .unwrap_or_default();
        RemoteSubscriptionItem {
            id: item_id,
            subscription_id: sub_id.to_string(),
            plan_id: price_id.to_string(),
            plan_active: true,
            quantity: 1,
            amount: 900,
            product_id,
        }
    }
}

/// A subscription with one item, shaped like the provider's.
pub fn remote_subscription(
    id: &str,
    customer_id: &str,
    status: &str,
    price_id: &str,
    product_id: &str,
) -> RemoteSubscription {
    RemoteSubscription {
        id: id.to_string(),
        customer_id: customer_id.to_string(),
        status: status.to_string(),
        items: vec![RemoteSubscriptionItem {
            id: format!("si_{id}"),
            subscription_id: id.to_string(),
            plan_id: price_id.to_string(),
            plan_active: true,
            quantity: 1,
            amount: 900,
            product_id: product_id.to_string(),
        }],
        client_secret: None,
    }
}

#[async_trait]
impl StripeService for MockStripeService {
    async fn create_customer(&self, email: &str, _name: &str) -> Result<String, StripeServiceError> {
        if self.fail_create_customer {
            return Err(StripeServiceError::InvalidRequest("customer rejected".into()));
        }
        let id = self.next_id("cus");
        self.customers
            .lock()
            .unwrap()
            .insert(id.clone(), Some(email.to_string()));
        Ok(id)
    }

    async fn retrieve_customer_email(
        &self,
        customer_id: &str,
    ) -> Result<Option<String>, StripeServiceError> {
        self.customers
            .lock()
            .unwrap()
            .get(customer_id)
            .cloned()
            .ok_or_else(|| StripeServiceError::NotFound(format!("No such customer: {customer_id}")))
    }

    async fn retrieve_price(&self, price_id: &str) -> Result<serde_json::Value, StripeServiceError> {
        self.prices
            .lock()
            .unwrap()
            .get(price_id)
            .cloned()
            .ok_or_else(|| StripeServiceError::NotFound(format!("No such price: {price_id}")))
    }

    async fn retrieve_product(&self, product_id: &str) -> Result<ProductInfo, StripeServiceError> {
        *self.product_lookups.lock().unwrap() += 1;
        if self.fail_products {
            return Err(StripeServiceError::Api("product lookup unavailable".into()));
        }
        self.products
            .lock()
            .unwrap()
            .get(product_id)
            .cloned()
            .ok_or_else(|| StripeServiceError::NotFound(format!("No such product: {product_id}")))
    }

    async fn list_payment_methods(
        &self,
        _customer_id: &str,
    ) -> Result<Vec<serde_json::Value>, StripeServiceError> {
        Ok(self.payment_methods.lock().unwrap().clone())
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError> {
        self.created
            .lock()
            .unwrap()
            .push((customer_id.to_string(), price_id.to_string()));

        let id = self.next_id("sub");
        let item_id = self.next_id("si");
        let sub = RemoteSubscription {
            items: vec![self.item_for(&id, item_id, price_id)],
            client_secret: Some(format!("pi_secret_{id}")),
            customer_id: customer_id.to_string(),
            status: "incomplete".into(),
            id,
        };
        self.subscriptions
            .lock()
            .unwrap()
            .insert(sub.id.clone(), sub.clone());
        Ok(sub)
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError> {
        self.subscription(subscription_id).ok_or_else(|| {
            StripeServiceError::NotFound(format!("No such subscription: {subscription_id}"))
        })
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError> {
        let mut subs = self.subscriptions.lock().unwrap();
        let sub = subs.get_mut(subscription_id).ok_or_else(|| {
            StripeServiceError::NotFound(format!("No such subscription: {subscription_id}"))
        })?;
        sub.status = "canceled".into();
        self.cancelled
            .lock()
            .unwrap()
            .push(subscription_id.to_string());
        Ok(sub.clone())
    }

    async fn update_subscription_price(
        &self,
        subscription_id: &str,
        item_id: &str,
        price_id: &str,
    ) -> Result<RemoteSubscription, StripeServiceError> {
        let existing = self.retrieve_subscription(subscription_id).await?;
        if !existing.items.iter().any(|i| i.id == item_id) {
            return Err(StripeServiceError::InvalidRequest(format!(
                "No such subscription item: {item_id}"
            )));
        }
        let item = self.item_for(subscription_id, item_id.to_string(), price_id);
        let mut subs = self.subscriptions.lock().unwrap();
        let sub = subs.get_mut(subscription_id).ok_or_else(|| {
            StripeServiceError::NotFound(format!("No such subscription: {subscription_id}"))
        })?;
        for slot in sub.items.iter_mut().filter(|i| i.id == item_id) {
            *slot = item.clone();
        }
        self.updated.lock().unwrap().push((
            subscription_id.to_string(),
            item_id.to_string(),
            price_id.to_string(),
        ));
        Ok(sub.clone())
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        _signature_header: &str,
    ) -> Result<StripeEvent, StripeServiceError> {
        if self.reject_signatures {
            return Err(StripeServiceError::Webhook("signature mismatch".into()));
        }
        signature::parse_event(payload)
    }
}
