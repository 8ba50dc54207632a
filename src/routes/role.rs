use crate::{AppState, handlers, models::Role, portal};
use axum::{
    Router, middleware,
    routing::{any, get, post, put},
};

/// Role Router Module
///
/// Each role's screens live below its prefix and share the profile and shell
/// routes. Every route, including the catch-all, passes the role guard first:
/// waiting sessions get 202, anonymous ones go to `/login`, and the other role
/// goes to its own dashboard.
fn role_routes(role: Role, dashboard: Router<AppState>) -> Router<AppState> {
    dashboard
        // POST /{role}/shell/toggle?location=...
        .route("/shell/toggle", post(handlers::toggle_shell))
        // --- Profile screen ---
        .route("/profile", get(handlers::profile_page))
        .route("/profile/edit", post(handlers::begin_edit))
        .route("/profile/cancel", post(handlers::cancel_edit))
        .route("/profile/draft", put(handlers::update_draft))
        .route("/profile/skills", post(handlers::add_skill))
        .route(
            "/profile/skills/{skill}",
            axum::routing::delete(handlers::remove_skill),
        )
        .route("/profile/submit", post(handlers::submit_profile))
        // Upload flow: presign, PUT to storage from the client, then record the key.
        .route(
            "/profile/photo/upload-url",
            post(handlers::photo_upload_url),
        )
        .route("/profile/photo", put(handlers::set_photo))
        // Anything else below the prefix lands on the dashboard.
        .route("/", any(handlers::role_fallback))
        .route("/{*rest}", any(handlers::role_fallback))
        .route_layer(middleware::from_fn_with_state(role, portal::require_role))
}

/// Student routes, nested under `/student`.
pub fn student_routes() -> Router<AppState> {
    let dashboard = Router::new()
        .route("/dashboard", get(handlers::student_dashboard))
        // GET /student/skills: own records; POST: score and store a new one.
        .route(
            "/skills",
            get(handlers::skills_page).post(handlers::add_skill_record),
        )
        .route(
            "/skills/certificate/upload-url",
            post(handlers::certificate_upload_url),
        )
        .route("/projects", get(handlers::student_projects))
        // POST /student/projects/{id}/apply
        // 404 for unknown projects, 409 when closed or already applied.
        .route("/projects/{id}/apply", post(handlers::apply_for_project));
    role_routes(Role::Student, dashboard)
}

/// Faculty routes, nested under `/faculty`.
pub fn faculty_routes() -> Router<AppState> {
    let dashboard = Router::new()
        .route("/dashboard", get(handlers::faculty_dashboard))
        // POST /faculty/requests/{id}/accept|reject
        // Pending -> Accepted/Rejected; anything else is a 409.
        .route("/requests/{id}/accept", post(handlers::accept_request))
        .route("/requests/{id}/reject", post(handlers::reject_request))
        .route(
            "/projects/create",
            get(handlers::create_project_page).post(handlers::create_project),
        )
        // GET /faculty/students/search?skill=...&limit=...
        .route("/students/search", get(handlers::search_students));
    role_routes(Role::Faculty, dashboard)
}
