use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::organization::{Organization, OrganizationRow};

use super::organization_repository::{OrganizationRepository, SubscriptionFields};

const ORGANIZATION_COLUMNS: &str = "id, name, email, stripe_id, stripe_sub, sub_status, plans";

pub struct PostgresOrganizationRepository {
    pub pool: PgPool,
}

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn create_organization(
        &self,
        name: &str,
        email: &str,
        stripe_id: &str,
    ) -> Result<Organization, sqlx::Error> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            r#"
            INSERT INTO organization (name, email, stripe_id)
            VALUES ($1, $2, $3)
            RETURNING {ORGANIZATION_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(stripe_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, sqlx::Error> {
        let rows = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organization ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Organization::from).collect())
    }

    async fn find_organization(&self, id: i64) -> Result<Option<Organization>, sqlx::Error> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organization WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Organization::from))
    }

    async fn find_by_name_and_email(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<Organization>, sqlx::Error> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organization WHERE name = $1 AND email = $2 LIMIT 1"
        ))
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Organization::from))
    }

    async fn set_subscription_by_id(
        &self,
        id: i64,
        fields: SubscriptionFields<'_>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE organization
            SET stripe_sub = $1, sub_status = $2, plans = $3
            WHERE id = $4
            "#,
        )
        .bind(fields.stripe_sub)
        .bind(fields.sub_status)
        .bind(fields.plans)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn set_subscription_by_customer(
        &self,
        stripe_id: &str,
        fields: SubscriptionFields<'_>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE organization
            SET stripe_sub = $1, sub_status = $2, plans = $3
            WHERE stripe_id = $4
            "#,
        )
        .bind(fields.stripe_sub)
        .bind(fields.sub_status)
        .bind(fields.plans)
        .bind(stripe_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn update_subscription_for_current(
        &self,
        stripe_id: &str,
        fields: SubscriptionFields<'_>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE organization
            SET stripe_sub = $1, sub_status = $2, plans = $3
            WHERE stripe_id = $4 AND stripe_sub = $1
            "#,
        )
        .bind(fields.stripe_sub)
        .bind(fields.sub_status)
        .bind(fields.plans)
        .bind(stripe_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn clear_subscription(&self, stripe_sub: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE organization
            SET stripe_sub = NULL, sub_status = NULL, plans = NULL
            WHERE stripe_sub = $1
            "#,
        )
        .bind(stripe_sub)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn clear_subscription_by_id(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE organization
            SET stripe_sub = NULL, sub_status = NULL, plans = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
