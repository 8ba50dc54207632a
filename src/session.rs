//! The session store: who is signed in, as what role, with which profile.
//!
//! A [`SessionStore`] owns one identity-provider connection and one background
//! listener. The listener is the only writer of identity, role and profile: it
//! reacts to the provider's session-change notifications, looks the profile up,
//! and publishes the result as one [`Session`] value. Operations (`login`,
//! `logout`, ...) talk to the backend and let the notification do the rest.
//! The one exception is the local merge after a confirmed profile write.

use chrono::Utc;
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};
use uuid::Uuid;

use crate::{
    error::{AuthError, CredentialError, ProfileWriteError},
    identity::{AuthState, IdentityState},
    models::{Identity, NewProfile, Profile, ProfilePatch, Role},
    repository::RepositoryState,
};

/// Session
///
/// The process-local view of the signed-in user.
///
/// `role` and `profile` are `Some` only when `identity` is `Some` and its
/// profile lookup succeeded. An identity without a resolvable profile keeps
/// `role: None`, which is the unknown role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub identity: Option<Identity>,
    pub role: Option<Role>,
    pub profile: Option<Profile>,
    /// True until the first session-change notification has been applied.
    pub loading: bool,
}

impl Session {
    /// The initial state: nothing known yet.
    pub fn loading() -> Self {
        Self {
            identity: None,
            role: None,
            profile: None,
            loading: true,
        }
    }

    /// A settled, signed-out session.
    pub fn anonymous() -> Self {
        Self {
            loading: false,
            ..Self::loading()
        }
    }

    /// A settled, signed-in session with a resolved profile.
    pub fn signed_in(identity: Identity, profile: Profile) -> Self {
        Self {
            identity: Some(identity),
            role: Some(profile.role),
            profile: Some(profile),
            loading: false,
        }
    }

    /// A settled session whose profile could not be resolved.
    pub fn without_profile(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            ..Self::anonymous()
        }
    }

    pub fn identity_id(&self) -> Option<Uuid> {
        self.identity.as_ref().map(|identity| identity.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Display name for headers and avatars.
    pub fn display_name(&self) -> Option<&str> {
        self.profile.as_ref().map(|profile| profile.name.as_str())
    }
}

/// SessionStore
///
/// Single source of truth for one client's sign-in state.
pub struct SessionStore {
    identity: IdentityState,
    repo: RepositoryState,
    state: watch::Sender<Session>,
    listener: JoinHandle<()>,
}

impl SessionStore {
    /// start
    ///
    /// Builds the store in the loading state and spawns its session-change
    /// listener. Must be called inside a Tokio runtime. The listener runs until
    /// the store is dropped.
    pub fn start(identity: IdentityState, repo: RepositoryState) -> Self {
        let (state, _) = watch::channel(Session::loading());
        let listener = tokio::spawn(listen(identity.subscribe(), repo.clone(), state.clone()));

        Self {
            identity,
            repo,
            state,
            listener,
        }
    }

    /// The current session value.
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Waits until the session satisfies `predicate` and returns that value.
    pub async fn wait_for(&self, predicate: impl FnMut(&Session) -> bool) -> Session {
        let mut rx = self.state.subscribe();
        match rx.wait_for(predicate).await {
            Ok(session) => session.clone(),
            // The sender lives in `self`, so this only happens during teardown.
            Err(_) => self.snapshot(),
        }
    }

    /// register
    ///
    /// Creates the credential, then the profile document `{email, role, name,
    /// created_at}`. Does not sign in. If the profile write fails the credential
    /// remains without a profile; nothing is rolled back.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: Role,
        name: &str,
    ) -> Result<Identity, CredentialError> {
        let identity = self.identity.create_credential(email, password).await?;
        tracing::info!(user_id = %identity.id, %role, "credential created");

        let profile = NewProfile {
            email: email.to_string(),
            role,
            name: name.to_string(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.repo.create_profile(identity.id, profile).await {
            tracing::error!(user_id = %identity.id, "profile creation failed after registration: {}", e);
            return Err(CredentialError::ProfileNotCreated(e));
        }

        Ok(identity)
    }

    /// login
    ///
    /// Authenticates only. Role and profile arrive through the listener.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.identity.authenticate(email, password).await?;
        tracing::info!(user_id = %identity.id, "signed in");
        Ok(identity)
    }

    /// logout
    ///
    /// Ends the external session. Local state is cleared by the resulting
    /// notification, never here.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.identity.sign_out().await?;
        tracing::info!("signed out");
        Ok(())
    }

    /// update_profile
    ///
    /// Merge-writes `patch` for the signed-in identity, then merges it into the
    /// cached profile. Without an identity this returns `Ok(())` and does nothing.
    /// On failure the cached profile is left unchanged.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<(), ProfileWriteError> {
        let Some(id) = self.snapshot().identity_id() else {
            return Ok(());
        };

        self.repo.merge_profile(id, &patch).await?;

        self.state.send_if_modified(|session| {
            if session.identity_id() != Some(id) {
                return false;
            }
            match session.profile.as_mut() {
                Some(profile) => {
                    profile.merge(&patch);
                    true
                }
                None => false,
            }
        });
        Ok(())
    }

    /// complete_profile
    ///
    /// Creates the missing profile document for a signed-in identity whose role
    /// is unknown, then publishes the new role and profile. Identities that
    /// already have a profile get `AlreadyExists`.
    pub async fn complete_profile(&self, role: Role, name: &str) -> Result<(), ProfileWriteError> {
        let session = self.snapshot();
        let Some(identity) = session.identity else {
            return Ok(());
        };
        if session.profile.is_some() {
            return Err(ProfileWriteError::AlreadyExists(identity.id));
        }

        let new_profile = NewProfile {
            email: identity.email.clone(),
            role,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.repo.create_profile(identity.id, new_profile.clone()).await?;
        tracing::info!(user_id = %identity.id, %role, "profile completed");

        self.state.send_if_modified(|session| {
            if session.identity_id() != Some(identity.id) || session.profile.is_some() {
                return false;
            }
            session.role = Some(role);
            session.profile = Some(new_profile.into());
            true
        });
        Ok(())
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// listen
///
/// Applies the provider's current state, then every subsequent change, in order.
async fn listen(
    mut auth: watch::Receiver<AuthState>,
    repo: RepositoryState,
    state: watch::Sender<Session>,
) {
    loop {
        let current = auth.borrow_and_update().clone();
        let next = resolve(current, &repo).await;
        state.send_if_modified(|session| apply(session, next));

        if auth.changed().await.is_err() {
            tracing::debug!("identity provider closed; session listener exiting");
            break;
        }
    }
}

/// apply
///
/// Publishes a resolved session. When the same identity is re-announced while a
/// profile write is in flight, the lookup can return the document from before
/// the write; a cached profile with a newer `updated_at` wins over it.
fn apply(session: &mut Session, next: Session) -> bool {
    let keep_cached = match (&session.profile, &next.profile) {
        (Some(cached), Some(fetched)) => {
            session.identity_id() == next.identity_id() && cached.updated_at > fetched.updated_at
        }
        _ => false,
    };

    if keep_cached {
        tracing::debug!(
            user_id = ?next.identity_id(),
            "fetched profile is older than the cached one; keeping the cache"
        );
        let changed = session.loading || session.identity != next.identity;
        session.identity = next.identity;
        session.loading = false;
        return changed;
    }

    if *session == next {
        return false;
    }
    *session = next;
    true
}

/// resolve
///
/// Turns one notification into the next session value. Performs at most one
/// profile lookup and never retries.
async fn resolve(auth: AuthState, repo: &RepositoryState) -> Session {
    let Some(identity) = auth else {
        return Session::anonymous();
    };

    match repo.read_profile(identity.id).await {
        Ok(Some(profile)) => Session::signed_in(identity, profile),
        Ok(None) => {
            tracing::warn!(user_id = %identity.id, "signed in without a profile document");
            Session::without_profile(identity)
        }
        Err(e) => {
            tracing::error!(user_id = %identity.id, "profile lookup failed: {}", e);
            Session::without_profile(identity)
        }
    }
}
