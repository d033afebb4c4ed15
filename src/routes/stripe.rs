use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::services::reconciler::{OrgLookup, UpdateOutcome};
use crate::services::stripe::{wire, StripeEvent};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WebhookAction {
    CheckoutCompleted,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    Ignored,
}

fn classify(event_type: &str) -> WebhookAction {
    match event_type {
        "checkout.session.completed" => WebhookAction::CheckoutCompleted,
        "customer.subscription.created" => WebhookAction::SubscriptionCreated,
        // every non-terminal lifecycle change funnels into the same update
        "customer.subscription.updated"
        | "customer.subscription.paused"
        | "customer.subscription.resumed"
        | "customer.subscription.pending_update_applied"
        | "customer.subscription.pending_update_expired"
        | "customer.subscription.trial_will_end" => WebhookAction::SubscriptionUpdated,
        "customer.subscription.deleted" => WebhookAction::SubscriptionDeleted,
        _ => WebhookAction::Ignored,
    }
}

async fn log_checkout(state: &AppState, evt: &StripeEvent) {
    let Some(customer_id) = evt
        .payload
        .pointer("/data/object/customer")
        .and_then(|v| v.as_str())
    else {
        warn!(event_id = %evt.id, "checkout.session.completed without customer");
        return;
    };

    match state.stripe.retrieve_customer_email(customer_id).await {
        Ok(email) => info!(
            event_id = %evt.id,
            customer_id,
            email = email.as_deref().unwrap_or(""),
            "checkout completed"
        ),
        Err(err) => warn!(?err, customer_id, "failed to load customer for checkout"),
    }
}

async fn reconcile(
    state: &AppState,
    action: WebhookAction,
    evt: &StripeEvent,
) -> Result<(), AppError> {
    let sub = wire::subscription_from_event(&evt.payload)?;
    let reconciler = state.reconciler();
    match action {
        WebhookAction::SubscriptionCreated => {
            reconciler.apply_create(&sub, OrgLookup::Customer).await?
        }
        WebhookAction::SubscriptionUpdated => {
            if reconciler.apply_update(&sub).await? == UpdateOutcome::Stale {
                debug!(event_id = %evt.id, subscription_id = %sub.id, "stale subscription event");
            }
        }
        WebhookAction::SubscriptionDeleted => reconciler.apply_delete(&sub).await?,
        WebhookAction::CheckoutCompleted | WebhookAction::Ignored => {}
    }
    Ok(())
}

// POST /stripe/webhook
pub async fn webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let sig = match headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
    {
        Some(s) => s,
        None => return AppError::Auth("Missing Stripe-Signature".into()).into_response(),
    };

    let evt = match app_state.stripe.verify_webhook(&body, sig) {
        Ok(e) => e,
        Err(err) => {
            warn!(?err, "stripe webhook verification failed");
            return AppError::Auth("invalid webhook".into()).into_response();
        }
    };

    let action = classify(&evt.r#type);
    match action {
        WebhookAction::Ignored => {
            debug!(event_id = %evt.id, event_type = %evt.r#type, "unhandled webhook event");
            return StatusCode::OK.into_response();
        }
        WebhookAction::CheckoutCompleted => log_checkout(&app_state, &evt).await,
        _ => {
            // Failures are acknowledged anyway; the provider redelivers on its own schedule.
            if let Err(err) = reconcile(&app_state, action, &evt).await {
                error!(
                    ?err,
                    event_id = %evt.id,
                    event_type = %evt.r#type,
                    "failed to reconcile subscription event"
                );
            }
        }
    }

    Json(serde_json::json!({ "received": true })).into_response()
}
