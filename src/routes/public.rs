use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Screens and actions available without a session: the landing page, the
/// login/register forms, logout, and the assistant. Login and register still
/// act on the caller's portal session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        .route("/", get(handlers::landing))
        // GET /login?role=student|faculty
        // POST /login: authenticate, then 303 to the resolved role's dashboard.
        .route("/login", get(handlers::login_page).post(handlers::login))
        // GET /register?role=student|faculty
        // POST /register: create credential + profile, then 303 to the login form.
        .route("/register", get(handlers::register_page).post(handlers::register))
        // POST /logout
        // 303 to the landing page, or 204 when the provider refused the sign-out.
        .route("/logout", post(handlers::logout))
        .route(
            "/assistant",
            get(handlers::assistant_greeting).post(handlers::ask_assistant),
        )
}
