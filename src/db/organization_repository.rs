use async_trait::async_trait;

use crate::models::organization::Organization;

/// The subscription columns of an organization row, written together.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionFields<'a> {
    pub stripe_sub: &'a str,
    pub sub_status: &'a str,
    pub plans: &'a [u8],
}

/// Write methods return the number of rows they touched.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create_organization(
        &self,
        name: &str,
        email: &str,
        stripe_id: &str,
    ) -> Result<Organization, sqlx::Error>;

    async fn list_organizations(&self) -> Result<Vec<Organization>, sqlx::Error>;

    async fn find_organization(&self, id: i64) -> Result<Option<Organization>, sqlx::Error>;

    async fn find_by_name_and_email(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<Organization>, sqlx::Error>;

    async fn set_subscription_by_id(
        &self,
        id: i64,
        fields: SubscriptionFields<'_>,
    ) -> Result<u64, sqlx::Error>;

    async fn set_subscription_by_customer(
        &self,
        stripe_id: &str,
        fields: SubscriptionFields<'_>,
    ) -> Result<u64, sqlx::Error>;

    /// Only touches a row whose customer matches and whose current
    /// `stripe_sub` already equals `fields.stripe_sub`.
    async fn update_subscription_for_current(
        &self,
        stripe_id: &str,
        fields: SubscriptionFields<'_>,
    ) -> Result<u64, sqlx::Error>;

    /// Clears `stripe_sub`, `sub_status` and `plans` on rows holding `stripe_sub`.
    async fn clear_subscription(&self, stripe_sub: &str) -> Result<u64, sqlx::Error>;

    async fn clear_subscription_by_id(&self, id: i64) -> Result<u64, sqlx::Error>;
}
