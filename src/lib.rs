use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Backends and the state built on them.
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod projects;
pub mod repository;
pub mod storage;
pub mod session;

// Navigation, chrome and screens.
pub mod assistant;
pub mod dashboard;
pub mod guard;
pub mod profile;
pub mod screens;
pub mod shell;
pub mod skills;

// HTTP surface.
pub mod handlers;
pub mod portal;
pub mod routes;
use routes::{onboarding, public, role};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use identity::{IdentityBackendState, MockIdentityBackend, SupabaseIdentityBackend};
pub use portal::{SessionRegistry, SessionRegistryState};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for every screen and action, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::landing, handlers::login_page, handlers::login, handlers::register_page,
        handlers::register, handlers::logout, handlers::assistant_greeting,
        handlers::ask_assistant, handlers::onboarding_page, handlers::complete_onboarding,
        handlers::toggle_shell, handlers::student_dashboard, handlers::faculty_dashboard,
        handlers::accept_request, handlers::reject_request, handlers::profile_page,
        handlers::begin_edit, handlers::cancel_edit, handlers::update_draft,
        handlers::add_skill, handlers::remove_skill, handlers::submit_profile,
        handlers::photo_upload_url, handlers::set_photo, handlers::skills_page,
        handlers::certificate_upload_url, handlers::add_skill_record,
        handlers::student_projects, handlers::apply_for_project, handlers::create_project_page,
        handlers::create_project, handlers::search_students
    ),
    components(
        schemas(
            models::Identity, models::Role, models::Profile, models::ProfilePatch,
            models::RegisterRequest, models::LoginRequest, models::OnboardingRequest,
            models::DraftFieldsRequest, models::AddSkillRequest, models::PresignedUrlRequest,
            models::PresignedUrlResponse, models::PhotoRequest, models::AssistantRequest,
            screens::LandingView, screens::AuthFormView, screens::OnboardingView,
            screens::NotFoundView, screens::StudentDashboardPage, screens::FacultyDashboardPage,
            screens::ProfilePage, shell::ShellView, profile::ProfileDraft,
            dashboard::ProjectRequest, assistant::AssistantReply, models::SkillRecord,
            models::SkillSummary, models::StudentMatch, models::Project, models::ProjectStatus,
            models::Application, models::ApplicationStatus, models::AddSkillRecordRequest,
            models::CreateProjectRequest, screens::SkillsPage, screens::StudentProjectsPage,
            screens::CreateProjectPage, screens::StudentSearchPage,
        )
    ),
    tags(
        (name = "rit-links-in", description = "RIT Links In portal")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, shared container for all application services and configuration.
#[derive(Clone)]
pub struct AppState {
    /// Profile documents.
    pub repo: RepositoryState,
    /// Object storage for profile photos.
    pub storage: StorageState,
    /// Live portal sessions.
    pub sessions: SessionRegistryState,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state and a fresh session registry over the given backends.
    /// The identity backend is only reached through the registry, which opens one
    /// provider connection per portal session.
    pub fn new(
        identity: IdentityBackendState,
        repo: RepositoryState,
        storage: StorageState,
        config: AppConfig,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new(identity, repo.clone()));
        Self {
            repo,
            storage,
            sessions,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for SessionRegistryState {
    fn from_ref(app_state: &AppState) -> SessionRegistryState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the guards and global middleware, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(portal::SESSION_HEADER)]);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(onboarding::onboarding_routes())
        .nest("/student", role::student_routes())
        .nest("/faculty", role::faculty_routes())
        .fallback(handlers::not_found)
        // Sessions open lazily, only where a guard or handler extracts one.
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            portal::attach_session,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, correlated by `x-request-id` and tagged with the
/// client's portal session when it sent one.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("unknown")
            .to_string()
    };

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %header("x-request-id"),
        session_id = %header(portal::SESSION_HEADER),
    )
}
