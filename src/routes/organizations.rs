use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::organization::{CreateOrganizationPayload, Organization};
use crate::routes::organization_context::OrganizationContext;
use crate::state::AppState;

// POST /organization/create
pub async fn create_organization(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrganizationPayload>, JsonRejection>,
) -> AppResult<Json<Organization>> {
    let Json(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::Validation("name and email are required".into()));
    }

    if state
        .org_repo
        .find_by_name_and_email(name, email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Organization already exists".into()));
    }

    // The customer must exist remotely before a row can point at it.
    let customer_id = state.stripe.create_customer(email, name).await?;
    let org = state
        .org_repo
        .create_organization(name, email, &customer_id)
        .await?;

    info!(org_id = org.id, customer_id = %customer_id, "organization created");
    Ok(Json(org))
}

// GET /organization
pub async fn list_organizations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Organization>>> {
    Ok(Json(state.org_repo.list_organizations().await?))
}

// GET /organization/{id}
pub async fn get_organization(OrganizationContext(org): OrganizationContext) -> Json<Organization> {
    Json(org)
}

// GET /organization/{id}/payment-method
pub async fn get_payment_method(
    State(state): State<AppState>,
    OrganizationContext(org): OrganizationContext,
) -> AppResult<Json<serde_json::Value>> {
    let methods = state.stripe.list_payment_methods(&org.stripe_id).await?;
    methods
        .into_iter()
        .next()
        .map(Json)
        .ok_or(AppError::NotFound)
}
