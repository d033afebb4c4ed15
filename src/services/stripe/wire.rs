//! Decoding of the provider's JSON objects into the domain types.
//!
//! Webhook payloads and API responses share one shape, so both paths go
//! through these helpers.
use serde::{Deserialize, Serialize};

use super::{ProductInfo, RemoteSubscription, RemoteSubscriptionItem, StripeServiceError};

/// An expandable reference: either a bare id or the full object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdOrObject {
    Id(String),
    Object { id: String },
}

impl IdOrObject {
    fn into_id(self) -> String {
        match self {
            IdOrObject::Id(id) => id,
            IdOrObject::Object { id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

impl<T> Default for WireList<T> {
    fn default() -> Self {
        WireList { data: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
struct WirePlan {
    id: String,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    product: Option<IdOrObject>,
}

#[derive(Debug, Deserialize)]
struct WireSubscriptionItem {
    id: String,
    #[serde(default)]
    subscription: Option<String>,
    #[serde(default)]
    quantity: Option<i64>,
    #[serde(default)]
    plan: Option<WirePlan>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePaymentIntentRef {
    Id(String),
    Object {
        #[serde(default)]
        client_secret: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireInvoiceRef {
    Id(String),
    Object {
        #[serde(default)]
        payment_intent: Option<WirePaymentIntentRef>,
    },
}

#[derive(Debug, Deserialize)]
struct WireSubscription {
    id: String,
    customer: IdOrObject,
    status: String,
    #[serde(default)]
    items: WireList<WireSubscriptionItem>,
    #[serde(default)]
    latest_invoice: Option<WireInvoiceRef>,
}

#[derive(Debug, Deserialize)]
struct WireProduct {
    id: String,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCustomer {
    #[serde(default)]
    email: Option<String>,
}

impl From<WireSubscription> for RemoteSubscription {
    fn from(wire: WireSubscription) -> Self {
        let client_secret = match wire.latest_invoice {
            Some(WireInvoiceRef::Object {
                payment_intent: Some(WirePaymentIntentRef::Object { client_secret }),
            }) => client_secret.filter(|s| !s.is_empty()),
            _ => None,
        };

        let parent_id = wire.id;
        let items = wire
            .items
            .data
            .into_iter()
            .map(|item| {
                let (plan_id, plan_active, amount, product_id) = match item.plan {
                    Some(plan) => (
                        plan.id,
                        plan.active.unwrap_or(false),
                        plan.amount.unwrap_or(0),
                        plan.product.map(IdOrObject::into_id).unwrap_or_default(),
                    ),
                    None => (String::new(), false, 0, String::new()),
                };
                RemoteSubscriptionItem {
                    id: item.id,
                    subscription_id: item.subscription.unwrap_or_else(|| parent_id.clone()),
                    plan_id,
                    plan_active,
                    quantity: item.quantity.unwrap_or(0),
                    amount,
                    product_id,
                }
            })
            .collect();

        RemoteSubscription {
            id: parent_id,
            customer_id: wire.customer.into_id(),
            status: wire.status,
            items,
            client_secret,
        }
    }
}

pub fn subscription_from_value(
    value: serde_json::Value,
) -> Result<RemoteSubscription, StripeServiceError> {
    let wire: WireSubscription = serde_json::from_value(value)?;
    Ok(wire.into())
}

/// Pulls the subscription out of an event's `data.object`.
pub fn subscription_from_event(
    payload: &serde_json::Value,
) -> Result<RemoteSubscription, StripeServiceError> {
    let object = payload
        .get("data")
        .and_then(|d| d.get("object"))
        .cloned()
        .ok_or_else(|| StripeServiceError::Serde("event has no data.object".into()))?;
    subscription_from_value(object)
}

pub fn product_from_value(value: serde_json::Value) -> Result<ProductInfo, StripeServiceError> {
    let wire: WireProduct = serde_json::from_value(value)?;
    Ok(ProductInfo {
        id: wire.id,
        active: wire.active.unwrap_or(false),
        name: wire.name.unwrap_or_default(),
        description: wire.description,
    })
}

pub fn customer_email_from_value(
    value: serde_json::Value,
) -> Result<Option<String>, StripeServiceError> {
    let wire: WireCustomer = serde_json::from_value(value)?;
    Ok(wire.email)
}

/// Re-reads an async-stripe object through the shared JSON decoders.
pub fn to_value<T: Serialize>(object: &T) -> Result<serde_json::Value, StripeServiceError> {
    Ok(serde_json::to_value(object)?)
}
