use crate::{
    assistant::{self, AssistantReply, GREETING},
    config::AppConfig,
    projects,
    repository::RepositoryState,
    skills::{self, DEFAULT_SEARCH_LIMIT},
    dashboard::{FacultyDashboard, ProjectRequest, RequestDecision, StudentDashboard, decide_request},
    error::PortalError,
    guard::dashboard_for,
    models::{
        AddSkillRecordRequest, AddSkillRequest, Application, AssistantRequest,
        CreateProjectRequest, DraftFieldsRequest, LocationQuery, LoginRequest, OnboardingRequest,
        PhotoRequest, PresignedUrlRequest, PresignedUrlResponse, ProfilePatch, Project,
        RegisterRequest, Role, RoleQuery, SkillRecord, StudentSearchQuery,
    },
    portal::{ClientSession, PortalSession},
    profile::{self, ProfileDraft, ProfileEditor, ProfileView},
    screens::{
        AuthFormView, CreateProjectPage, FacultyDashboardPage, LandingView, NotFoundView,
        OnboardingView, ProfilePage, SkillsPage, StudentDashboardPage, StudentProjectsPage,
        StudentSearchPage, login_link,
    },
    shell::{self, ShellView},
    storage::{StorageState, sanitize_key},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

const PHOTO_PREFIX: &str = "profiles";
const CERTIFICATE_PREFIX: &str = "certifications";

// --- Helpers ---

fn require_filled(fields: &[&str]) -> Result<(), PortalError> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err(PortalError::BadRequest("Please fill in all fields".to_string()));
    }
    Ok(())
}

fn not_editing() -> PortalError {
    PortalError::Conflict("Profile is not in edit mode".to_string())
}

/// The signed-in identity's id. Guarded routes only run with one present.
fn signed_in_id(session: &PortalSession) -> Result<Uuid, PortalError> {
    session
        .store
        .snapshot()
        .identity_id()
        .ok_or_else(|| PortalError::Conflict("Session is no longer signed in".to_string()))
}

async fn render_shell(session: &PortalSession, role: Role, location: &str) -> ShellView {
    let snapshot = session.store.snapshot();
    session
        .shell
        .lock()
        .await
        .render(role, location, snapshot.profile.as_ref())
}

/// Presigns an upload to `{prefix}/{user}/{uuid}.{ext}` for the signed-in caller.
async fn presign_under(
    session: &PortalSession,
    storage: &StorageState,
    prefix: &str,
    payload: &PresignedUrlRequest,
) -> Result<PresignedUrlResponse, PortalError> {
    let user_id = signed_in_id(session)?;

    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let object_key = format!("{}/{}/{}.{}", prefix, user_id, Uuid::new_v4(), extension);

    let upload_url = storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(PortalError::Storage)?;

    Ok(PresignedUrlResponse {
        upload_url,
        resource_key: object_key,
    })
}

/// The sanitized key when it lies under the caller's `{prefix}/{user}/` folder.
fn owned_key(key: &str, prefix: &str, user_id: Uuid) -> Option<String> {
    let key = sanitize_key(key);
    key.starts_with(&format!("{}/{}/", prefix, user_id))
        .then_some(key)
}

async fn render_profile_page(session: &PortalSession, role: Role) -> ProfilePage {
    let snapshot = session.store.snapshot();
    let profile = snapshot.profile.as_ref();
    let shell = session.shell.lock().await.render(role, role.profile_path(), profile);
    let mut editor = session.editor.lock().await;

    ProfilePage {
        shell,
        profile: ProfileView::build(role, profile, &mut editor),
    }
}

async fn edit_draft<T>(
    session: &PortalSession,
    edit: impl FnOnce(&mut ProfileDraft) -> T,
) -> Result<ProfileDraft, PortalError> {
    let mut editor = session.editor.lock().await;
    let draft = editor.draft_mut().ok_or_else(not_editing)?;
    edit(&mut *draft);
    Ok(draft.clone())
}

// --- Public Screens ---

/// landing
///
/// [Public Route] Product pitch plus role-specific sign-in links.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Landing screen", body = LandingView))
)]
pub async fn landing() -> Json<LandingView> {
    Json(LandingView::build())
}

/// login_page
///
/// [Public Route] The login form, with `?role=` pre-selecting the role toggle.
/// A session that is already signed in with a known role goes to its dashboard.
#[utoipa::path(
    get,
    path = "/login",
    params(RoleQuery),
    responses(
        (status = 200, description = "Login form", body = AuthFormView),
        (status = 303, description = "Already signed in")
    )
)]
pub async fn login_page(session: ClientSession, Query(query): Query<RoleQuery>) -> Response {
    let snapshot = session.store.snapshot();
    if let (Some(_), Some(role)) = (&snapshot.identity, snapshot.role) {
        return Redirect::to(role.dashboard_path()).into_response();
    }
    Json(AuthFormView::login(query.preselected())).into_response()
}

/// login
///
/// [Public Route] Authenticates, waits for the session listener to publish the
/// resolved role (bounded by `SESSION_SYNC_TIMEOUT_MS`), then redirects to that
/// role's dashboard. On timeout the redirect uses whatever has been published;
/// the guard on the destination handles an unsettled session.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 303, description = "Signed in; redirect to dashboard"),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(config): State<AppConfig>,
    session: ClientSession,
    Json(payload): Json<LoginRequest>,
) -> Result<Redirect, PortalError> {
    require_filled(&[&payload.email, &payload.password])?;

    let identity = session.store.login(payload.email.trim(), &payload.password).await?;

    let synced = tokio::time::timeout(
        config.session_sync_timeout,
        session
            .store
            .wait_for(|s| !s.loading && s.identity_id() == Some(identity.id)),
    )
    .await;

    let role = match synced {
        Ok(settled) => settled.role,
        Err(_) => {
            tracing::warn!(user_id = %identity.id, "session did not settle before the sync timeout");
            session.store.snapshot().role
        }
    };

    Ok(Redirect::to(dashboard_for(role)))
}

/// register_page
///
/// [Public Route] The registration form, with `?role=` pre-selecting the role toggle.
#[utoipa::path(
    get,
    path = "/register",
    params(RoleQuery),
    responses((status = 200, description = "Registration form", body = AuthFormView))
)]
pub async fn register_page(Query(query): Query<RoleQuery>) -> Json<AuthFormView> {
    Json(AuthFormView::register(query.preselected()))
}

/// register
///
/// [Public Route] Creates the credential and the profile document, then sends the
/// user to the login form for the chosen role. Does not sign in.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 303, description = "Registered; redirect to login"),
        (status = 400, description = "Missing fields or weak password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    session: ClientSession,
    Json(payload): Json<RegisterRequest>,
) -> Result<Redirect, PortalError> {
    require_filled(&[&payload.email, &payload.password, &payload.name])?;

    session
        .store
        .register(
            payload.email.trim(),
            &payload.password,
            payload.role,
            payload.name.trim(),
        )
        .await?;

    Ok(Redirect::to(&login_link(payload.role)))
}

/// logout
///
/// [Public Route] Signs out and navigates to the landing screen. A failed sign-out
/// is logged only; the client gets 204 and stays where it is.
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Signed out; redirect to landing"),
        (status = 204, description = "Sign-out failed; stay on the current screen")
    )
)]
pub async fn logout(session: ClientSession) -> Response {
    match shell::logout(&session.store).await {
        Some(next) => {
            *session.editor.lock().await = ProfileEditor::default();
            Redirect::to(next).into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// assistant_greeting
///
/// [Public Route] The assistant's opening message.
#[utoipa::path(
    get,
    path = "/assistant",
    responses((status = 200, description = "Greeting"))
)]
pub async fn assistant_greeting() -> Json<serde_json::Value> {
    Json(json!({ "text": GREETING }))
}

/// ask_assistant
///
/// [Public Route] Routes a message to a canned reply by keyword.
#[utoipa::path(
    post,
    path = "/assistant",
    request_body = AssistantRequest,
    responses(
        (status = 200, description = "Reply", body = AssistantReply),
        (status = 400, description = "Blank message")
    )
)]
pub async fn ask_assistant(
    Json(payload): Json<AssistantRequest>,
) -> Result<Json<AssistantReply>, PortalError> {
    assistant::reply_to(&payload.text)
        .map(Json)
        .ok_or_else(|| PortalError::BadRequest("Message must not be blank".to_string()))
}

/// not_found
///
/// Fallback for every unmatched path outside the role prefixes.
pub async fn not_found() -> (StatusCode, Json<NotFoundView>) {
    (StatusCode::NOT_FOUND, Json(NotFoundView::default()))
}

// --- Onboarding ---

/// onboarding_page
///
/// [Signed-in Route] "Complete your profile" for an identity whose role is unknown.
/// Sessions that already have a role are sent to their dashboard.
#[utoipa::path(
    get,
    path = "/onboarding",
    responses(
        (status = 200, description = "Onboarding form", body = OnboardingView),
        (status = 303, description = "Role already known")
    )
)]
pub async fn onboarding_page(session: ClientSession) -> Response {
    let snapshot = session.store.snapshot();
    match (snapshot.role, snapshot.identity) {
        (Some(role), _) => Redirect::to(role.dashboard_path()).into_response(),
        (None, Some(identity)) => Json(OnboardingView::build(&identity.email)).into_response(),
        // The identity guard runs first; this only covers a sign-out racing the request.
        (None, None) => Redirect::to(dashboard_for(None)).into_response(),
    }
}

/// complete_onboarding
///
/// [Signed-in Route] Creates the missing profile document and redirects to the
/// new role's dashboard.
#[utoipa::path(
    post,
    path = "/onboarding",
    request_body = OnboardingRequest,
    responses(
        (status = 303, description = "Profile created"),
        (status = 409, description = "Profile already exists")
    )
)]
pub async fn complete_onboarding(
    session: ClientSession,
    Json(payload): Json<OnboardingRequest>,
) -> Result<Redirect, PortalError> {
    require_filled(&[&payload.name])?;
    session
        .store
        .complete_profile(payload.role, payload.name.trim())
        .await?;
    Ok(Redirect::to(payload.role.dashboard_path()))
}

// --- Role Shell ---

/// toggle_shell
///
/// [Role Route] Expands or collapses the sidebar and returns the re-rendered shell.
#[utoipa::path(
    post,
    path = "/{role}/shell/toggle",
    params(("role" = Role, Path, description = "student or faculty"), LocationQuery),
    responses((status = 200, description = "Shell", body = ShellView))
)]
pub async fn toggle_shell(
    Extension(role): Extension<Role>,
    session: ClientSession,
    Query(query): Query<LocationQuery>,
) -> Json<ShellView> {
    let snapshot = session.store.snapshot();
    let location = query.location.as_deref().unwrap_or(role.dashboard_path());

    let mut shell = session.shell.lock().await;
    shell.toggle();
    Json(shell.render(role, location, snapshot.profile.as_ref()))
}

/// role_fallback
///
/// [Role Route] Unmatched paths below a role prefix go to that role's dashboard.
pub async fn role_fallback(Extension(role): Extension<Role>) -> Redirect {
    Redirect::to(role.dashboard_path())
}

// --- Dashboards ---

/// student_dashboard
///
/// [Student Route] Stats, current projects and upcoming seminars.
#[utoipa::path(
    get,
    path = "/student/dashboard",
    responses(
        (status = 200, description = "Student dashboard", body = StudentDashboardPage),
        (status = 202, description = "Session still loading"),
        (status = 303, description = "Not signed in, or not a student")
    )
)]
pub async fn student_dashboard(session: ClientSession) -> Json<StudentDashboardPage> {
    let snapshot = session.store.snapshot();
    let profile = snapshot.profile.as_ref();
    let shell = session
        .shell
        .lock()
        .await
        .render(Role::Student, Role::Student.dashboard_path(), profile);

    Json(StudentDashboardPage {
        shell,
        dashboard: StudentDashboard::build(profile),
    })
}

/// faculty_dashboard
///
/// [Faculty Route] Stats, student project requests and upcoming seminars.
#[utoipa::path(
    get,
    path = "/faculty/dashboard",
    responses(
        (status = 200, description = "Faculty dashboard", body = FacultyDashboardPage),
        (status = 202, description = "Session still loading"),
        (status = 303, description = "Not signed in, or not faculty")
    )
)]
pub async fn faculty_dashboard(session: ClientSession) -> Json<FacultyDashboardPage> {
    let snapshot = session.store.snapshot();
    let profile = snapshot.profile.as_ref();
    let shell = session
        .shell
        .lock()
        .await
        .render(Role::Faculty, Role::Faculty.dashboard_path(), profile);
    let requests = session.requests.lock().await;

    Json(FacultyDashboardPage {
        shell,
        dashboard: FacultyDashboard::build(profile, &requests),
    })
}

async fn decide(
    session: &PortalSession,
    id: u32,
    decision: RequestDecision,
) -> Result<Json<ProjectRequest>, PortalError> {
    let mut requests = session.requests.lock().await;
    let updated = decide_request(&mut requests, id, decision)?;
    tracing::info!(request_id = id, status = ?updated.status, "project request decided");
    Ok(Json(updated))
}

/// accept_request
///
/// [Faculty Route] Accepts a pending student project request.
#[utoipa::path(
    post,
    path = "/faculty/requests/{id}/accept",
    params(("id" = u32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Accepted", body = ProjectRequest),
        (status = 404, description = "Unknown request"),
        (status = 409, description = "Already decided")
    )
)]
pub async fn accept_request(
    session: ClientSession,
    Path(id): Path<u32>,
) -> Result<Json<ProjectRequest>, PortalError> {
    decide(&session, id, RequestDecision::Accept).await
}

/// reject_request
///
/// [Faculty Route] Rejects a pending student project request.
#[utoipa::path(
    post,
    path = "/faculty/requests/{id}/reject",
    params(("id" = u32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Rejected", body = ProjectRequest),
        (status = 404, description = "Unknown request"),
        (status = 409, description = "Already decided")
    )
)]
pub async fn reject_request(
    session: ClientSession,
    Path(id): Path<u32>,
) -> Result<Json<ProjectRequest>, PortalError> {
    decide(&session, id, RequestDecision::Reject).await
}

// --- Profile ---

/// profile_page
///
/// [Role Route] The profile screen. Any pending notice is included once.
#[utoipa::path(
    get,
    path = "/{role}/profile",
    params(("role" = Role, Path, description = "student or faculty")),
    responses((status = 200, description = "Profile screen", body = ProfilePage))
)]
pub async fn profile_page(
    Extension(role): Extension<Role>,
    session: ClientSession,
) -> Json<ProfilePage> {
    Json(render_profile_page(&session, role).await)
}

/// begin_edit
///
/// [Role Route] Enters edit mode with a draft seeded from the current profile.
#[utoipa::path(
    post,
    path = "/{role}/profile/edit",
    params(("role" = Role, Path, description = "student or faculty")),
    responses((status = 200, description = "Profile screen in edit mode", body = ProfilePage))
)]
pub async fn begin_edit(
    Extension(role): Extension<Role>,
    session: ClientSession,
) -> Json<ProfilePage> {
    let snapshot = session.store.snapshot();
    session.editor.lock().await.begin_edit(snapshot.profile.as_ref());
    Json(render_profile_page(&session, role).await)
}

/// cancel_edit
///
/// [Role Route] Leaves edit mode and discards the draft.
#[utoipa::path(
    post,
    path = "/{role}/profile/cancel",
    params(("role" = Role, Path, description = "student or faculty")),
    responses((status = 200, description = "Profile screen", body = ProfilePage))
)]
pub async fn cancel_edit(
    Extension(role): Extension<Role>,
    session: ClientSession,
) -> Json<ProfilePage> {
    session.editor.lock().await.cancel();
    Json(render_profile_page(&session, role).await)
}

/// update_draft
///
/// [Role Route] Edits the draft's name, bio or department.
#[utoipa::path(
    put,
    path = "/{role}/profile/draft",
    params(("role" = Role, Path, description = "student or faculty")),
    request_body = DraftFieldsRequest,
    responses(
        (status = 200, description = "Updated draft", body = ProfileDraft),
        (status = 409, description = "Not in edit mode")
    )
)]
pub async fn update_draft(
    session: ClientSession,
    Json(payload): Json<DraftFieldsRequest>,
) -> Result<Json<ProfileDraft>, PortalError> {
    edit_draft(&session, |draft| draft.apply_fields(payload))
        .await
        .map(Json)
}

/// add_skill
///
/// [Role Route] Adds a trimmed skill to the draft. Blank and duplicate skills are ignored.
#[utoipa::path(
    post,
    path = "/{role}/profile/skills",
    params(("role" = Role, Path, description = "student or faculty")),
    request_body = AddSkillRequest,
    responses(
        (status = 200, description = "Updated draft", body = ProfileDraft),
        (status = 409, description = "Not in edit mode")
    )
)]
pub async fn add_skill(
    session: ClientSession,
    Json(payload): Json<AddSkillRequest>,
) -> Result<Json<ProfileDraft>, PortalError> {
    edit_draft(&session, |draft| draft.add_skill(&payload.skill))
        .await
        .map(Json)
}

/// remove_skill
///
/// [Role Route] Removes a skill from the draft by value.
#[utoipa::path(
    delete,
    path = "/{role}/profile/skills/{skill}",
    params(
        ("role" = Role, Path, description = "student or faculty"),
        ("skill" = String, Path, description = "Skill to remove")
    ),
    responses(
        (status = 200, description = "Updated draft", body = ProfileDraft),
        (status = 409, description = "Not in edit mode")
    )
)]
pub async fn remove_skill(
    session: ClientSession,
    Path(skill): Path<String>,
) -> Result<Json<ProfileDraft>, PortalError> {
    edit_draft(&session, |draft| draft.remove_skill(&skill))
        .await
        .map(Json)
}

/// submit_profile
///
/// [Role Route] Writes the draft through the session store. Success leaves edit
/// mode; failure keeps the draft. Either way the outcome is reported as a notice.
#[utoipa::path(
    post,
    path = "/{role}/profile/submit",
    params(("role" = Role, Path, description = "student or faculty")),
    responses(
        (status = 200, description = "Profile screen with notice", body = ProfilePage),
        (status = 409, description = "Not in edit mode")
    )
)]
pub async fn submit_profile(
    Extension(role): Extension<Role>,
    session: ClientSession,
) -> Result<Json<ProfilePage>, PortalError> {
    let draft = session
        .editor
        .lock()
        .await
        .draft()
        .cloned()
        .ok_or_else(not_editing)?;

    let outcome = profile::submit(&session.store, &draft).await;
    session.editor.lock().await.finish_submit(&outcome);

    Ok(Json(render_profile_page(&session, role).await))
}

/// photo_upload_url
///
/// [Role Route] Presigns an upload for a new profile photo under the caller's prefix.
#[utoipa::path(
    post,
    path = "/{role}/profile/photo/upload-url",
    params(("role" = Role, Path, description = "student or faculty")),
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 400, description = "Not an image"),
        (status = 502, description = "Storage unavailable")
    )
)]
pub async fn photo_upload_url(
    session: ClientSession,
    State(storage): State<StorageState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, PortalError> {
    if !payload.file_type.starts_with("image/") {
        return Err(PortalError::BadRequest("Profile photos must be images".to_string()));
    }
    presign_under(&session, &storage, PHOTO_PREFIX, &payload)
        .await
        .map(Json)
}

/// set_photo
///
/// [Role Route] Records an uploaded object as the profile photo.
#[utoipa::path(
    put,
    path = "/{role}/profile/photo",
    params(("role" = Role, Path, description = "student or faculty")),
    request_body = PhotoRequest,
    responses(
        (status = 200, description = "Profile screen", body = ProfilePage),
        (status = 400, description = "Key outside the caller's prefix"),
        (status = 502, description = "Profile store unavailable")
    )
)]
pub async fn set_photo(
    Extension(role): Extension<Role>,
    session: ClientSession,
    State(storage): State<StorageState>,
    Json(payload): Json<PhotoRequest>,
) -> Result<Json<ProfilePage>, PortalError> {
    let user_id = signed_in_id(&session)?;
    let key = owned_key(&payload.resource_key, PHOTO_PREFIX, user_id).ok_or_else(|| {
        PortalError::BadRequest("Photo must be uploaded through this session".to_string())
    })?;

    let patch = ProfilePatch {
        photo_url: Some(storage.public_url(&key)),
        updated_at: Some(Utc::now()),
        ..ProfilePatch::default()
    };
    session.store.update_profile(patch).await?;

    Ok(Json(render_profile_page(&session, role).await))
}

// --- Skills ---

/// skills_page
///
/// [Student Route] "Add Skills and Project": the student's skill records, best first.
#[utoipa::path(
    get,
    path = "/student/skills",
    responses(
        (status = 200, description = "Skill records", body = SkillsPage),
        (status = 502, description = "Store unavailable")
    )
)]
pub async fn skills_page(
    session: ClientSession,
    State(repo): State<RepositoryState>,
) -> Result<Json<SkillsPage>, PortalError> {
    let user_id = signed_in_id(&session)?;
    let mut records = repo.skill_records(user_id).await?;
    records.sort_by(|a, b| b.score.cmp(&a.score));

    Ok(Json(SkillsPage {
        shell: render_shell(&session, Role::Student, "/student/skills").await,
        records,
    }))
}

/// certificate_upload_url
///
/// [Student Route] Presigns an upload for a certificate (image or PDF) under the
/// caller's prefix. The returned key goes into `POST /student/skills`.
#[utoipa::path(
    post,
    path = "/student/skills/certificate/upload-url",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 400, description = "Neither an image nor a PDF"),
        (status = 502, description = "Storage unavailable")
    )
)]
pub async fn certificate_upload_url(
    session: ClientSession,
    State(storage): State<StorageState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, PortalError> {
    if !(payload.file_type.starts_with("image/") || payload.file_type == "application/pdf") {
        return Err(PortalError::BadRequest(
            "Certificates must be images or PDFs".to_string(),
        ));
    }
    presign_under(&session, &storage, CERTIFICATE_PREFIX, &payload)
        .await
        .map(Json)
}

/// add_skill_record
///
/// [Student Route] Scores and stores a skill record, then adds the skill to the
/// profile's list when it is not there yet.
#[utoipa::path(
    post,
    path = "/student/skills",
    request_body = AddSkillRecordRequest,
    responses(
        (status = 201, description = "Stored record with its score", body = SkillRecord),
        (status = 400, description = "Missing fields, or certificate outside the caller's prefix"),
        (status = 502, description = "Store unavailable")
    )
)]
pub async fn add_skill_record(
    session: ClientSession,
    State(repo): State<RepositoryState>,
    State(storage): State<StorageState>,
    Json(payload): Json<AddSkillRecordRequest>,
) -> Result<(StatusCode, Json<SkillRecord>), PortalError> {
    require_filled(&[&payload.skill_name, &payload.skill_level])?;
    let user_id = signed_in_id(&session)?;

    let certificate_url = match payload.certificate_key.as_deref() {
        Some(key) => {
            let key = owned_key(key, CERTIFICATE_PREFIX, user_id).ok_or_else(|| {
                PortalError::BadRequest(
                    "Certificate must be uploaded through this session".to_string(),
                )
            })?;
            Some(storage.public_url(&key))
        }
        None => None,
    };

    let record = skills::new_record(&payload, certificate_url);
    repo.add_skill_record(user_id, &record).await?;
    tracing::info!(
        user_id = %user_id,
        skill = %record.name,
        score = record.score,
        "skill record added"
    );

    let listed = session
        .store
        .snapshot()
        .profile
        .map(|profile| profile.skills)
        .unwrap_or_default();
    if let Some(skills) = skills::with_skill(&listed, &record.name) {
        let patch = ProfilePatch {
            skills: Some(skills),
            updated_at: Some(Utc::now()),
            ..ProfilePatch::default()
        };
        session.store.update_profile(patch).await?;
    }

    Ok((StatusCode::CREATED, Json(record)))
}

// --- Projects ---

/// student_projects
///
/// [Student Route] "My Projects": open projects and the student's applications.
#[utoipa::path(
    get,
    path = "/student/projects",
    responses(
        (status = 200, description = "Projects screen", body = StudentProjectsPage),
        (status = 502, description = "Store unavailable")
    )
)]
pub async fn student_projects(
    session: ClientSession,
    State(repo): State<RepositoryState>,
) -> Result<Json<StudentProjectsPage>, PortalError> {
    let user_id = signed_in_id(&session)?;
    let open_projects = repo.list_open_projects().await?;
    let applications = repo.applications_for_student(user_id).await?;

    Ok(Json(StudentProjectsPage {
        shell: render_shell(&session, Role::Student, "/student/projects").await,
        open_projects,
        applications,
    }))
}

/// apply_for_project
///
/// [Student Route] Applies to an open project. One application per project.
#[utoipa::path(
    post,
    path = "/student/projects/{id}/apply",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 201, description = "Pending application", body = Application),
        (status = 404, description = "Unknown project"),
        (status = 409, description = "Project closed, or already applied")
    )
)]
pub async fn apply_for_project(
    session: ClientSession,
    State(repo): State<RepositoryState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Application>), PortalError> {
    let user_id = signed_in_id(&session)?;
    let project = repo
        .read_project(id)
        .await?
        .ok_or_else(|| PortalError::NotFound("Project not found".to_string()))?;

    let snapshot = session.store.snapshot();
    let name = snapshot.display_name().unwrap_or("Student");
    let application = projects::new_application(&project, user_id, name)?;
    repo.create_application(&application).await?;
    tracing::info!(user_id = %user_id, project_id = %id, "applied for project");

    Ok((StatusCode::CREATED, Json(application)))
}

/// create_project_page
///
/// [Faculty Route] "Add Projects": the caller's projects, newest first.
#[utoipa::path(
    get,
    path = "/faculty/projects/create",
    responses(
        (status = 200, description = "Project form and own projects", body = CreateProjectPage),
        (status = 502, description = "Store unavailable")
    )
)]
pub async fn create_project_page(
    session: ClientSession,
    State(repo): State<RepositoryState>,
) -> Result<Json<CreateProjectPage>, PortalError> {
    let user_id = signed_in_id(&session)?;
    let projects = repo.projects_by_faculty(user_id).await?;

    Ok(Json(CreateProjectPage {
        shell: render_shell(&session, Role::Faculty, "/faculty/projects/create").await,
        projects,
    }))
}

/// create_project
///
/// [Faculty Route] Adds an open project owned by the caller.
#[utoipa::path(
    post,
    path = "/faculty/projects/create",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Created project", body = Project),
        (status = 400, description = "Missing fields, no skills, or no seats"),
        (status = 502, description = "Store unavailable")
    )
)]
pub async fn create_project(
    session: ClientSession,
    State(repo): State<RepositoryState>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), PortalError> {
    let user_id = signed_in_id(&session)?;
    let snapshot = session.store.snapshot();
    let faculty_name = snapshot.display_name().unwrap_or("Faculty");

    let project = projects::new_project(&payload, user_id, faculty_name)?;
    repo.create_project(&project).await?;
    tracing::info!(faculty_id = %user_id, project_id = %project.id, "project added");

    Ok((StatusCode::CREATED, Json(project)))
}

/// search_students
///
/// [Faculty Route] Students with a record for `skill`, best score first, at most
/// `limit` (default 10). Without `skill` the screen is shown with no results.
#[utoipa::path(
    get,
    path = "/faculty/students/search",
    params(StudentSearchQuery),
    responses(
        (status = 200, description = "Search screen", body = StudentSearchPage),
        (status = 400, description = "Blank skill"),
        (status = 502, description = "Store unavailable")
    )
)]
pub async fn search_students(
    session: ClientSession,
    State(repo): State<RepositoryState>,
    Query(query): Query<StudentSearchQuery>,
) -> Result<Json<StudentSearchPage>, PortalError> {
    let shell = render_shell(&session, Role::Faculty, "/faculty/students/search").await;

    let Some(skill) = query.skill.as_deref().map(str::trim) else {
        return Ok(Json(StudentSearchPage {
            shell,
            skill: None,
            students: Vec::new(),
        }));
    };
    if skill.is_empty() {
        return Err(PortalError::BadRequest("Skill parameter is required".to_string()));
    }

    let matches = repo.students_with_skill(skill).await?;
    let students = skills::rank_students(matches, query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT));

    Ok(Json(StudentSearchPage {
        shell,
        skill: Some(skill.to_string()),
        students,
    }))
}
