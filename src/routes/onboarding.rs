use crate::{AppState, handlers, portal};
use axum::{Router, middleware, routing::get};

/// Onboarding Router Module
///
/// "Complete your profile" for identities whose role could not be resolved.
/// Guarded by identity only: requiring a role here would redirect in a loop.
pub fn onboarding_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/onboarding",
            get(handlers::onboarding_page).post(handlers::complete_onboarding),
        )
        .route_layer(middleware::from_fn(portal::require_identity))
}
