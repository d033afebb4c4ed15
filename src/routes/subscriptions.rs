use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::organization::Organization;
use crate::responses::JsonResponse;
use crate::routes::organization_context::OrganizationContext;
use crate::services::reconciler::OrgLookup;
use crate::services::stripe::RemoteSubscription;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub plan: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummary {
    pub subscription_id: String,
    pub subscription_status: String,
    pub client_secret: String,
}

impl From<RemoteSubscription> for SubscriptionSummary {
    fn from(sub: RemoteSubscription) -> Self {
        SubscriptionSummary {
            subscription_id: sub.id,
            subscription_status: sub.status,
            client_secret: sub.client_secret.unwrap_or_default(),
        }
    }
}

fn invalid_body(rejection: JsonRejection) -> AppError {
    AppError::Validation(format!("invalid body {}", rejection.body_text()))
}

fn current_subscription(org: &Organization) -> AppResult<&str> {
    org.subscription_id()
        .ok_or_else(|| AppError::Validation("organization has no subscription".into()))
}

fn resolve_plan<'a>(state: &'a AppState, plan: &str) -> AppResult<&'a str> {
    state
        .config
        .plans
        .price_for(plan.trim())
        .ok_or_else(|| AppError::Validation(format!("Invalid plan: {plan}")))
}

// GET /organization/{id}/sub
pub async fn get_subscription(
    State(state): State<AppState>,
    OrganizationContext(org): OrganizationContext,
) -> AppResult<Json<SubscriptionSummary>> {
    let sub_id = current_subscription(&org)?;
    let sub = state.stripe.retrieve_subscription(sub_id).await?;
    Ok(Json(sub.into()))
}

// POST /organization/{id}/sub
pub async fn create_subscription(
    State(state): State<AppState>,
    OrganizationContext(org): OrganizationContext,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> AppResult<Json<SubscriptionSummary>> {
    let Json(req) = payload.map_err(invalid_body)?;
    let price_id = resolve_plan(&state, &req.plan)?;

    // Only one live subscription per organization.
    if let Some(existing) = org.subscription_id() {
        match state.stripe.cancel_subscription(existing).await {
            Ok(_) => info!(
                org_id = org.id,
                subscription_id = existing,
                "cancelled previous subscription"
            ),
            Err(err) if err.is_resource_missing() => warn!(
                org_id = org.id,
                subscription_id = existing,
                "previous subscription already gone"
            ),
            Err(err) => return Err(err.into()),
        }
    }

    let sub = state
        .stripe
        .create_subscription(&org.stripe_id, price_id)
        .await?;

    state
        .reconciler()
        .apply_create(&sub, OrgLookup::Organization(org.id))
        .await?;

    info!(org_id = org.id, subscription_id = %sub.id, plan = %req.plan, "subscription created");
    Ok(Json(sub.into()))
}

// PATCH /organization/{id}/sub
pub async fn update_subscription(
    State(state): State<AppState>,
    OrganizationContext(org): OrganizationContext,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> AppResult<Json<RemoteSubscription>> {
    let Json(req) = payload.map_err(invalid_body)?;
    let price_id = resolve_plan(&state, &req.plan)?;
    let sub_id = current_subscription(&org)?;

    let current = state.stripe.retrieve_subscription(sub_id).await?;
    let item = current
        .items
        .first()
        .ok_or_else(|| AppError::Validation("subscription has no items".into()))?;

    let updated = state
        .stripe
        .update_subscription_price(sub_id, &item.id, price_id)
        .await?;

    // Local state follows through the customer.subscription.updated webhook.
    info!(
        org_id = org.id,
        subscription_id = sub_id,
        plan = %req.plan,
        "subscription price changed"
    );
    Ok(Json(updated))
}

// DELETE /organization/{id}/sub
pub async fn cancel_subscription(
    State(state): State<AppState>,
    OrganizationContext(org): OrganizationContext,
) -> AppResult<Response> {
    let reconciler = state.reconciler();

    let Some(sub_id) = org.subscription_id() else {
        reconciler.clear_for_organization(org.id).await?;
        return Ok(JsonResponse::success("No subscription to cancel").into_response());
    };

    match state.stripe.cancel_subscription(sub_id).await {
        Ok(sub) => reconciler.apply_delete(&sub).await?,
        Err(err) if err.is_resource_missing() => {
            warn!(
                org_id = org.id,
                subscription_id = sub_id,
                "subscription missing remotely, clearing local state"
            );
            reconciler.clear_for_organization(org.id).await?;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(JsonResponse::success("Subscription cancelled").into_response())
}
