use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::organization::{Organization, OrganizationRow};

use super::organization_repository::{OrganizationRepository, SubscriptionFields};

/// In-memory stand-in for the `organization` table.
#[derive(Default)]
pub struct MockOrganizationRepository {
    pub rows: Mutex<Vec<OrganizationRow>>,
    pub should_fail: bool,
    pub subscription_writes: Mutex<usize>,
}

impl MockOrganizationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Seeds a row with no subscription and returns its id.
    pub fn seed(&self, name: &str, email: &str, stripe_id: &str) -> i64 {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        rows.push(OrganizationRow {
            id,
            name: name.into(),
            email: email.into(),
            stripe_id: stripe_id.into(),
            stripe_sub: None,
            sub_status: None,
            plans: None,
        });
        id
    }

    pub fn seed_with_subscription(
        &self,
        name: &str,
        email: &str,
        stripe_id: &str,
        stripe_sub: &str,
        sub_status: &str,
    ) -> i64 {
        let id = self.seed(name, email, stripe_id);
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.stripe_sub = Some(stripe_sub.into());
            row.sub_status = Some(sub_status.into());
            row.plans = Some(b"[]".to_vec());
        }
        id
    }

    pub fn get(&self, id: i64) -> Option<Organization> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .map(Organization::from)
    }

    pub fn raw(&self, id: i64) -> Option<OrganizationRow> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        Ok(())
    }

    fn write_where<F>(&self, fields: Option<SubscriptionFields<'_>>, mut pred: F) -> u64
    where
        F: FnMut(&OrganizationRow) -> bool,
    {
        *self.subscription_writes.lock().unwrap() += 1;
        let mut touched = 0;
        for row in self.rows.lock().unwrap().iter_mut().filter(|r| pred(r)) {
            match fields {
                Some(f) => {
                    row.stripe_sub = Some(f.stripe_sub.to_string());
                    row.sub_status = Some(f.sub_status.to_string());
                    row.plans = Some(f.plans.to_vec());
                }
                None => {
                    row.stripe_sub = None;
                    row.sub_status = None;
                    row.plans = None;
                }
            }
            touched += 1;
        }
        touched
    }
}

#[async_trait]
impl OrganizationRepository for MockOrganizationRepository {
    async fn create_organization(
        &self,
        name: &str,
        email: &str,
        stripe_id: &str,
    ) -> Result<Organization, sqlx::Error> {
        self.check()?;
        let id = self.seed(name, email, stripe_id);
        self.get(id).ok_or(sqlx::Error::RowNotFound)
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, sqlx::Error> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(Organization::from)
            .collect())
    }

    async fn find_organization(&self, id: i64) -> Result<Option<Organization>, sqlx::Error> {
        self.check()?;
        Ok(self.get(id))
    }

    async fn find_by_name_and_email(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<Organization>, sqlx::Error> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name && r.email == email)
            .cloned()
            .map(Organization::from))
    }

    async fn set_subscription_by_id(
        &self,
        id: i64,
        fields: SubscriptionFields<'_>,
    ) -> Result<u64, sqlx::Error> {
        self.check()?;
        Ok(self.write_where(Some(fields), |r| r.id == id))
    }

    async fn set_subscription_by_customer(
        &self,
        stripe_id: &str,
        fields: SubscriptionFields<'_>,
    ) -> Result<u64, sqlx::Error> {
        self.check()?;
        Ok(self.write_where(Some(fields), |r| r.stripe_id == stripe_id))
    }

    async fn update_subscription_for_current(
        &self,
        stripe_id: &str,
        fields: SubscriptionFields<'_>,
    ) -> Result<u64, sqlx::Error> {
        self.check()?;
        Ok(self.write_where(Some(fields), |r| {
            r.stripe_id == stripe_id && r.stripe_sub.as_deref() == Some(fields.stripe_sub)
        }))
    }

    async fn clear_subscription(&self, stripe_sub: &str) -> Result<u64, sqlx::Error> {
        self.check()?;
        Ok(self.write_where(None, |r| r.stripe_sub.as_deref() == Some(stripe_sub)))
    }

    async fn clear_subscription_by_id(&self, id: i64) -> Result<u64, sqlx::Error> {
        self.check()?;
        Ok(self.write_where(None, |r| r.id == id))
    }
}
