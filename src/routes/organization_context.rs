use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::AppError;
use crate::models::organization::Organization;
use crate::state::AppState;

/// The organization named by the `{id}` path segment, loaded from the store.
#[derive(Debug, PartialEq)]
pub struct OrganizationContext(pub Organization);

impl FromRequestParts<AppState> for OrganizationContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let id = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::Validation(format!("invalid organization id `{raw}`")))?;

        let org = state
            .org_repo
            .find_organization(id)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(OrganizationContext(org))
    }
}
