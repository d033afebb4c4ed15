use std::collections::BTreeMap;
use std::env;

const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_PLANS: &[(&str, &str)] = &[
    ("planA", "price_1NEDyqSAVJByQTEdNkeEdf7P"),
    ("planB", "price_1NEDyNSAVJByQTEdrH97Z3B6"),
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid SUBSCRIPTION_PLANS entry `{0}`, expected name=price_id")]
    InvalidPlan(String),
    #[error("SUBSCRIPTION_PLANS lists `{0}` more than once")]
    DuplicatePlan(String),
}

#[derive(Clone, Debug)]
pub struct StripeSettings {
    pub secret_key: String,
    pub publishable_key: String,
    pub webhook_secret: String,
}

/// Short plan names mapped to provider price ids, ordered by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanCatalog {
    plans: BTreeMap<String, String>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        PlanCatalog {
            plans: DEFAULT_PLANS
                .iter()
                .map(|(name, price)| (name.to_string(), price.to_string()))
                .collect(),
        }
    }
}

impl PlanCatalog {
    /// Parses `name=price_id,name=price_id`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut plans = BTreeMap::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, price) = entry
                .split_once('=')
                .map(|(n, p)| (n.trim(), p.trim()))
                .filter(|(n, p)| !n.is_empty() && !p.is_empty())
                .ok_or_else(|| ConfigError::InvalidPlan(entry.to_string()))?;
            if plans.insert(name.to_string(), price.to_string()).is_some() {
                return Err(ConfigError::DuplicatePlan(name.to_string()));
            }
        }
        if plans.is_empty() {
            return Err(ConfigError::InvalidPlan(raw.to_string()));
        }
        Ok(PlanCatalog { plans })
    }

    pub fn price_for(&self, name: &str) -> Option<&str> {
        self.plans.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.plans.iter().map(|(n, p)| (n.as_str(), p.as_str()))
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub frontend_origin: String,
    pub bind_addr: String,
    pub stripe: StripeSettings,
    pub plans: PlanCatalog,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok(); // Load .env file
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let database_url = required("DATABASE_URL")?;
        let frontend_origin =
            lookup("FRONTEND_ORIGIN").unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string());
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let stripe = StripeSettings {
            secret_key: required("STRIPE_SECRET_KEY")?,
            publishable_key: required("STRIPE_PUBLISHABLE_KEY")?,
            webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        };

        let plans = match lookup("SUBSCRIPTION_PLANS") {
            Some(raw) if !raw.trim().is_empty() => PlanCatalog::parse(&raw)?,
            _ => PlanCatalog::default(),
        };

        Ok(Config {
            database_url,
            frontend_origin,
            bind_addr,
            stripe,
            plans,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/test".into(),
        frontend_origin: DEFAULT_FRONTEND_ORIGIN.into(),
        bind_addr: DEFAULT_BIND_ADDR.into(),
        stripe: StripeSettings {
            secret_key: "sk_test".into(),
            publishable_key: "pk_test_123".into(),
            webhook_secret: "whsec_test".into(),
        },
        plans: PlanCatalog::default(),
    }
}
