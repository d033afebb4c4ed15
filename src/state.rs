use crate::config::Config;
use crate::db::organization_repository::OrganizationRepository;
use crate::services::reconciler::SubscriptionReconciler;
use crate::services::stripe::StripeService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub org_repo: Arc<dyn OrganizationRepository>,
    pub stripe: Arc<dyn StripeService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        org_repo: Arc<dyn OrganizationRepository>,
        stripe: Arc<dyn StripeService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            org_repo,
            stripe,
            config,
        }
    }

    pub fn reconciler(&self) -> SubscriptionReconciler {
        SubscriptionReconciler::new(self.org_repo.clone(), self.stripe.clone())
    }
}
