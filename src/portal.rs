//! Per-client portal state and the request plumbing that finds it.
//!
//! Every browser client owns a [`PortalSession`]: its own identity connection,
//! [`SessionStore`], and screen state. Clients name their session with the
//! `x-session-id` header. Sessions are opened lazily, the first time a handler or
//! guard extracts [`ClientSession`]; the id is echoed on those responses so a client
//! that arrived without one (or with an unknown one) can keep using the fresh session.
//! Static routes never open one. Idle sessions are swept by [`spawn_eviction`].

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderName, HeaderValue, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::{
    sync::{Mutex, OnceCell, RwLock},
    task::JoinHandle,
    time::Instant,
};
use uuid::Uuid;

use crate::{
    dashboard::{ProjectRequest, sample_requests},
    guard::{self, GuardDecision},
    identity::IdentityBackendState,
    models::Role,
    profile::ProfileEditor,
    repository::RepositoryState,
    session::SessionStore,
    shell::RoleShell,
};

pub const SESSION_HEADER: &str = "x-session-id";

/// Longest pause between two eviction sweeps, whatever the idle TTL.
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// PortalSession
///
/// One client's state. Screen state sits behind async mutexes so handlers for
/// the same client can interleave safely.
pub struct PortalSession {
    pub id: Uuid,
    pub store: SessionStore,
    pub shell: Mutex<RoleShell>,
    pub editor: Mutex<ProfileEditor>,
    pub requests: Mutex<Vec<ProjectRequest>>,
    last_seen: std::sync::Mutex<Instant>,
}

impl PortalSession {
    /// Opens a fresh identity connection and starts its session store.
    pub fn open(id: Uuid, identity: &IdentityBackendState, repo: RepositoryState) -> Self {
        Self {
            id,
            store: SessionStore::start(identity.connect(), repo),
            shell: Mutex::new(RoleShell::default()),
            editor: Mutex::new(ProfileEditor::default()),
            requests: Mutex::new(sample_requests()),
            last_seen: std::sync::Mutex::new(Instant::now()),
        }
    }

    /// Marks the session as used now.
    pub fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    /// Time since the client last used this session.
    pub fn idle_for(&self) -> Duration {
        self.last_seen.lock().unwrap_or_else(|e| e.into_inner()).elapsed()
    }
}

/// SessionRegistry
///
/// All live portal sessions, keyed by client session id.
pub struct SessionRegistry {
    identity: IdentityBackendState,
    repo: RepositoryState,
    sessions: RwLock<HashMap<Uuid, Arc<PortalSession>>>,
}

/// SessionRegistryState
///
/// The concrete type used to share the registry across the application state.
pub type SessionRegistryState = Arc<SessionRegistry>;

impl SessionRegistry {
    pub fn new(identity: IdentityBackendState, repo: RepositoryState) -> Self {
        Self {
            identity,
            repo,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The session named by `id`, or a newly opened one when `id` is absent or unknown.
    pub async fn resolve(&self, id: Option<Uuid>) -> Arc<PortalSession> {
        if let Some(id) = id {
            if let Some(session) = self.sessions.read().await.get(&id) {
                session.touch();
                return session.clone();
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(PortalSession::open(id, &self.identity, self.repo.clone()));
        self.sessions.write().await.insert(id, session.clone());
        tracing::debug!(session_id = %id, "opened portal session");
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<PortalSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// evict_idle
    ///
    /// Drops every session idle for at least `ttl` and returns how many went.
    /// Dropping a session stops its listener and closes its identity connection.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.idle_for() < ttl);
        before - sessions.len()
    }
}

/// spawn_eviction
///
/// Sweeps idle sessions out of the registry on a fixed interval. The task holds
/// only a weak reference and ends once the registry is dropped.
pub fn spawn_eviction(registry: &SessionRegistryState, ttl: Duration) -> JoinHandle<()> {
    let registry: Weak<SessionRegistry> = Arc::downgrade(registry);
    let period = ttl.clamp(Duration::from_millis(10), MAX_SWEEP_PERIOD);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(registry) = registry.upgrade() else {
                tracing::debug!("session registry dropped; eviction task exiting");
                break;
            };
            let evicted = registry.evict_idle(ttl).await;
            if evicted > 0 {
                let remaining = registry.len().await;
                tracing::info!(evicted, remaining, "evicted idle portal sessions");
            }
        }
    })
}

/// SessionSlot
///
/// What [`attach_session`] leaves in the request extensions: the registry, the id
/// the client asked for, and the session once something has resolved it.
#[derive(Clone)]
struct SessionSlot {
    registry: SessionRegistryState,
    requested: Option<Uuid>,
    resolved: Arc<OnceCell<Arc<PortalSession>>>,
}

impl SessionSlot {
    async fn session(&self) -> Arc<PortalSession> {
        self.resolved
            .get_or_init(|| self.registry.resolve(self.requested))
            .await
            .clone()
    }
}

/// ClientSession Extractor Result
///
/// The caller's portal session, as attached by [`attach_session`].
#[derive(Clone)]
pub struct ClientSession(pub Arc<PortalSession>);

impl std::ops::Deref for ClientSession {
    type Target = PortalSession;

    fn deref(&self) -> &PortalSession {
        &self.0
    }
}

/// ClientSession Extractor Implementation
///
/// Resolves the caller's session through the slot the middleware stored in the
/// request extensions, opening it on first use. Works with any router state, so
/// guard middleware with its own state can use it too.
///
/// Rejection: 500 when the session middleware was not installed.
impl<S> FromRequestParts<S> for ClientSession
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let slot = parts.extensions.get::<SessionSlot>().cloned().ok_or_else(|| {
            tracing::error!("portal session missing; is attach_session installed?");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        Ok(ClientSession(slot.session().await))
    }
}

fn requested_session_id(request: &Request) -> Option<Uuid> {
    request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
}

/// attach_session
///
/// Makes the client's portal session available to extractors without opening
/// it, and echoes its id on the response when a handler or guard used it.
pub async fn attach_session(
    State(registry): State<SessionRegistryState>,
    mut request: Request,
    next: Next,
) -> Response {
    let slot = SessionSlot {
        registry,
        requested: requested_session_id(&request),
        resolved: Arc::new(OnceCell::new()),
    };
    let resolved = slot.resolved.clone();
    request.extensions_mut().insert(slot);

    let mut response = next.run(request).await;
    let Some(session) = resolved.get() else {
        return response;
    };
    if let Ok(value) = HeaderValue::from_str(&session.id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(SESSION_HEADER), value);
    }
    response
}

/// The neutral waiting view: the session has not settled yet.
pub fn waiting_response() -> Response {
    (
        StatusCode::ACCEPTED,
        [(header::RETRY_AFTER, "1")],
        Json(json!({ "status": "loading" })),
    )
        .into_response()
}

fn apply(decision: GuardDecision) -> Result<(), Response> {
    match decision {
        GuardDecision::Wait => Err(waiting_response()),
        GuardDecision::Redirect(path) => Err(Redirect::to(path).into_response()),
        GuardDecision::Allow => Ok(()),
    }
}

/// require_role
///
/// Route guard for a role's screens. On `Allow` the required role is inserted
/// into the request extensions for the handlers below.
pub async fn require_role(
    State(required): State<Role>,
    session: ClientSession,
    mut request: Request,
    next: Next,
) -> Response {
    let snapshot = session.store.snapshot();
    if let Err(response) = apply(guard::evaluate(&snapshot, Some(required))) {
        return response;
    }
    request.extensions_mut().insert(required);
    next.run(request).await
}

/// require_identity
///
/// Route guard for screens that need a signed-in identity but no particular role.
pub async fn require_identity(session: ClientSession, request: Request, next: Next) -> Response {
    let snapshot = session.store.snapshot();
    match apply(guard::evaluate(&snapshot, None)) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}
