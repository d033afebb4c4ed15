use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub publishable_key: String,
}

// GET /config
pub async fn get_config(State(state): State<AppState>) -> Json<ClientConfig> {
    Json(ClientConfig {
        publishable_key: state.config.stripe.publishable_key.clone(),
    })
}

// GET /plans
pub async fn get_plans(State(state): State<AppState>) -> AppResult<Json<Vec<serde_json::Value>>> {
    let mut prices = Vec::new();
    for (name, price_id) in state.config.plans.iter() {
        let mut price = state.stripe.retrieve_price(price_id).await?;
        // the short plan name is what clients send back on subscribe
        if let Some(obj) = price.as_object_mut() {
            obj.insert("nickname".into(), serde_json::Value::String(name.to_string()));
        }
        prices.push(price);
    }
    Ok(Json(prices))
}
