use serde::{Deserialize, Serialize};

/// Snapshot of a provider product, embedded in [`Plan`].
///
/// Populated on a best-effort basis: when the product lookup fails only `id`
/// is filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub active: bool,
    pub name: String,
    pub description: String,
}

impl Product {
    pub fn unresolved(id: impl Into<String>) -> Self {
        Product {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// One subscription line item as it looked at the last reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub si_id: String,
    pub sub_id: String,
    pub active: bool,
    pub quantity: i64,
    pub amount: i64,
    pub product: Product,
}

/// Encode a plan list into the blob stored in `organization.plans`.
pub fn encode_plans(plans: &[Plan]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(plans)
}

/// Decode the stored blob. A missing blob is an empty list.
pub fn decode_plans(blob: Option<&[u8]>) -> Result<Vec<Plan>, serde_json::Error> {
    match blob {
        None => Ok(Vec::new()),
        Some(bytes) if bytes.is_empty() => Ok(Vec::new()),
        Some(bytes) => serde_json::from_slice(bytes),
    }
}
