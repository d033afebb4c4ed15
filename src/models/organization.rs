use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;

use super::plan::{decode_plans, Plan};

/// Raw `organization` row; `plans` is still the encoded blob.
#[derive(Debug, Clone, FromRow)]
pub struct OrganizationRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub stripe_id: String,
    pub stripe_sub: Option<String>,
    pub sub_status: Option<String>,
    pub plans: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub stripe_id: String,
    pub stripe_sub: Option<String>,
    pub sub_status: Option<String>,
    pub plans: Vec<Plan>,
}

impl Organization {
    /// The remote subscription id, if one is recorded and non-blank.
    pub fn subscription_id(&self) -> Option<&str> {
        self.stripe_sub
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        let plans = decode_plans(row.plans.as_deref()).unwrap_or_else(|err| {
            warn!(?err, org_id = row.id, "failed to decode stored plans");
            Vec::new()
        });
        Organization {
            id: row.id,
            name: row.name,
            email: row.email,
            stripe_id: row.stripe_id,
            stripe_sub: row.stripe_sub,
            sub_status: row.sub_status,
            plans,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}
