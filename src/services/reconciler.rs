use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::db::organization_repository::{OrganizationRepository, SubscriptionFields};
use crate::models::plan::{encode_plans, Plan, Product};
use crate::services::stripe::{RemoteSubscription, StripeService};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("failed to encode plans: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("no organization matches subscription {0}")]
    NoMatchingOrganization(String),
}

/// Which organization row a freshly created subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgLookup {
    Organization(i64),
    /// Match on the subscription's own customer id.
    Customer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// The row has since moved to another subscription, or was never on this one.
    Stale,
}

/// Overwrites an organization's subscription columns from the provider's view.
#[derive(Clone)]
pub struct SubscriptionReconciler {
    repo: Arc<dyn OrganizationRepository>,
    stripe: Arc<dyn StripeService>,
}

impl SubscriptionReconciler {
    pub fn new(repo: Arc<dyn OrganizationRepository>, stripe: Arc<dyn StripeService>) -> Self {
        Self { repo, stripe }
    }

    /// Product lookup that never fails; errors leave only the id filled in.
    pub async fn enrich_product(&self, product_id: &str) -> Product {
        if product_id.is_empty() {
            return Product::default();
        }
        match self.stripe.retrieve_product(product_id).await {
            Ok(info) => Product {
                id: info.id,
                active: info.active,
                name: info.name,
                description: info.description.unwrap_or_default(),
            },
            Err(err) => {
                warn!(?err, product_id, "product lookup failed, keeping bare id");
                Product::unresolved(product_id)
            }
        }
    }

    pub async fn build_plans(&self, sub: &RemoteSubscription) -> Vec<Plan> {
        let mut plans = Vec::with_capacity(sub.items.len());
        for item in &sub.items {
            plans.push(Plan {
                id: item.plan_id.clone(),
                si_id: item.id.clone(),
                sub_id: item.subscription_id.clone(),
                active: item.plan_active,
                quantity: item.quantity,
                amount: item.amount,
                product: self.enrich_product(&item.product_id).await,
            });
        }
        plans
    }

    async fn snapshot(&self, sub: &RemoteSubscription) -> Result<Vec<u8>, ReconcileError> {
        let plans = self.build_plans(sub).await;
        Ok(encode_plans(&plans)?)
    }

    pub async fn apply_create(
        &self,
        sub: &RemoteSubscription,
        lookup: OrgLookup,
    ) -> Result<(), ReconcileError> {
        let blob = self.snapshot(sub).await?;
        let fields = SubscriptionFields {
            stripe_sub: &sub.id,
            sub_status: &sub.status,
            plans: &blob,
        };

        let rows = match lookup {
            OrgLookup::Organization(id) => self.repo.set_subscription_by_id(id, fields).await?,
            OrgLookup::Customer => {
                self.repo
                    .set_subscription_by_customer(&sub.customer_id, fields)
                    .await?
            }
        };
        if rows == 0 {
            return Err(ReconcileError::NoMatchingOrganization(sub.id.clone()));
        }

        info!(
            subscription_id = %sub.id,
            status = %sub.status,
            plans = sub.items.len(),
            "subscription recorded"
        );
        Ok(())
    }

    pub async fn apply_update(
        &self,
        sub: &RemoteSubscription,
    ) -> Result<UpdateOutcome, ReconcileError> {
        let blob = self.snapshot(sub).await?;
        let fields = SubscriptionFields {
            stripe_sub: &sub.id,
            sub_status: &sub.status,
            plans: &blob,
        };

        let rows = self
            .repo
            .update_subscription_for_current(&sub.customer_id, fields)
            .await?;
        if rows == 0 {
            warn!(
                subscription_id = %sub.id,
                customer_id = %sub.customer_id,
                "ignoring update for a subscription the organization no longer holds"
            );
            return Ok(UpdateOutcome::Stale);
        }

        info!(subscription_id = %sub.id, status = %sub.status, "subscription updated");
        Ok(UpdateOutcome::Applied)
    }

    pub async fn apply_delete(&self, sub: &RemoteSubscription) -> Result<(), ReconcileError> {
        let rows = self.repo.clear_subscription(&sub.id).await?;
        if rows == 0 {
            debug!(subscription_id = %sub.id, "deleted subscription was not recorded locally");
        } else {
            info!(subscription_id = %sub.id, "subscription cleared");
        }
        Ok(())
    }

    /// Clears by organization id, regardless of the stored `stripe_sub`.
    pub async fn clear_for_organization(&self, org_id: i64) -> Result<(), ReconcileError> {
        let rows = self.repo.clear_subscription_by_id(org_id).await?;
        if rows == 0 {
            return Err(ReconcileError::NoMatchingOrganization(format!(
                "organization {org_id}"
            )));
        }
        info!(org_id, "subscription cleared for organization");
        Ok(())
    }
}
