pub mod organization_context;
pub mod organizations;
pub mod plans;
pub mod stripe;
pub mod subscriptions;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::responses::JsonResponse;
use crate::state::AppState;

pub fn cors_layer(frontend_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::HEAD,
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .allow_credentials(true);

    match frontend_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(err) => {
            warn!(?err, frontend_origin, "ignoring unparsable FRONTEND_ORIGIN");
            cors
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.frontend_origin);

    Router::new()
        .route("/", get(root))
        .route("/config", get(plans::get_config))
        .route("/plans", get(plans::get_plans))
        .route("/organization", get(organizations::list_organizations))
        .route(
            "/organization/create",
            post(organizations::create_organization),
        )
        .route("/organization/{id}", get(organizations::get_organization))
        .route(
            "/organization/{id}/sub",
            get(subscriptions::get_subscription)
                .post(subscriptions::create_subscription)
                .patch(subscriptions::update_subscription)
                .delete(subscriptions::cancel_subscription),
        )
        .route(
            "/organization/{id}/payment-method",
            get(organizations::get_payment_method),
        )
        .route(
            "/organization/{id}/add-payment-method",
            get(organizations::get_payment_method),
        )
        .route("/stripe/webhook", post(stripe::webhook))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// A simple root route.
async fn root() -> Response {
    JsonResponse::success("orgbill backend is running").into_response()
}
