use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    error::{AuthError, CredentialError},
    models::Identity,
};

/// AuthState
///
/// What the identity provider currently reports: the signed-in identity, or `None`.
/// Every change is a session-change notification.
pub type AuthState = Option<Identity>;

// 1. IdentityProvider Contract
/// IdentityProvider
///
/// One client connection to the external identity provider. The connection is
/// stateful: a successful `authenticate` signs it in and `sign_out` signs it out,
/// and both are announced on the `subscribe` channel. Callers learn about the new
/// state only through that channel.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates a new email/password credential. Does not sign the connection in.
    async fn create_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, CredentialError>;

    /// Signs the connection in. On success a notification carrying the identity follows.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Terminates the external session. On success a `None` notification follows.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Session-change notifications. The receiver starts at the current state.
    fn subscribe(&self) -> watch::Receiver<AuthState>;
}

/// IdentityState
///
/// A shareable handle to one provider connection.
pub type IdentityState = Arc<dyn IdentityProvider>;

/// IdentityBackend
///
/// Opens provider connections. The portal opens one connection per browser
/// session so that each client has its own sign-in state.
pub trait IdentityBackend: Send + Sync {
    fn connect(&self) -> IdentityState;
}

/// IdentityBackendState
pub type IdentityBackendState = Arc<dyn IdentityBackend>;

// 2. The Real Implementation (Supabase GoTrue)
/// Claims
///
/// The subset of a Supabase access token the portal relies on.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the identity id.
    pub sub: Uuid,
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
}

/// Supabase access tokens are issued for this audience.
pub const TOKEN_AUDIENCE: &str = "authenticated";

/// verify_access_token
///
/// Decodes an HS256 access token with the project JWT secret. Expiry and audience
/// are always validated.
pub fn verify_access_token(token: &str, jwt_secret: &str) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.set_audience(&[TOKEN_AUDIENCE]);

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("rejected access token: {:?}", e.kind());
            AuthError::InvalidToken
        })
}

#[derive(Deserialize)]
struct SupabaseUser {
    id: Uuid,
    email: Option<String>,
}

/// The signup response is the user itself when email confirmation is on, and
/// `{ user, session }` when it is off.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignupResponse {
    Wrapped { user: SupabaseUser },
    Bare(SupabaseUser),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: SupabaseUser,
}

#[derive(Deserialize, Default)]
struct SupabaseErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// SupabaseIdentityBackend
///
/// Opens connections against a Supabase project's auth REST API.
#[derive(Clone)]
pub struct SupabaseIdentityBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    jwt_secret: String,
}

impl SupabaseIdentityBackend {
    pub fn new(base_url: &str, api_key: &str, jwt_secret: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            jwt_secret: jwt_secret.to_string(),
        }
    }
}

impl IdentityBackend for SupabaseIdentityBackend {
    fn connect(&self) -> IdentityState {
        let (auth, _) = watch::channel(None);
        Arc::new(SupabaseIdentityProvider {
            backend: self.clone(),
            access_token: Mutex::new(None),
            auth,
        })
    }
}

/// SupabaseIdentityProvider
///
/// A single signed-in (or anonymous) client of the Supabase auth API.
pub struct SupabaseIdentityProvider {
    backend: SupabaseIdentityBackend,
    access_token: Mutex<Option<String>>,
    auth: watch::Sender<AuthState>,
}

impl SupabaseIdentityProvider {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.backend.base_url, path)
    }

    fn current_token(&self) -> Option<String> {
        self.access_token
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn store_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.access_token.lock() {
            *guard = token;
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn create_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, CredentialError> {
        let response = self
            .backend
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.backend.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| CredentialError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let body: SupabaseErrorBody = response.json().await.unwrap_or_default();
            return Err(match body.error_code.as_deref() {
                Some("user_already_exists") | Some("email_exists") => CredentialError::EmailInUse,
                Some("weak_password") => CredentialError::WeakPassword,
                _ => CredentialError::Rejected(
                    body.msg
                        .or(body.error_description)
                        .unwrap_or_else(|| "signup rejected".to_string()),
                ),
            });
        }

        let user = match response
            .json::<SignupResponse>()
            .await
            .map_err(|e| CredentialError::Transport(e.to_string()))?
        {
            SignupResponse::Wrapped { user } | SignupResponse::Bare(user) => user,
        };

        Ok(Identity {
            id: user.id,
            email: user.email.unwrap_or_else(|| email.to_string()),
        })
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let response = self
            .backend
            .http
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.backend.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if response.status().is_client_error() {
            return Err(AuthError::InvalidCredentials);
        }
        if !response.status().is_success() {
            return Err(AuthError::Transport(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        // The token, not the response body, is the source of truth for the subject.
        let claims = verify_access_token(&token.access_token, &self.backend.jwt_secret)?;
        if claims.sub != token.user.id {
            return Err(AuthError::InvalidToken);
        }

        let identity = Identity {
            id: claims.sub,
            email: claims
                .email
                .or(token.user.email)
                .unwrap_or_else(|| email.to_string()),
        };

        self.store_token(Some(token.access_token));
        self.auth.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(token) = self.current_token() {
            let response = self
                .backend
                .http
                .post(self.endpoint("logout"))
                .header("apikey", &self.backend.api_key)
                .bearer_auth(token)
                .send()
                .await
                .map_err(|e| AuthError::Transport(e.to_string()))?;

            // 401 means the token already lapsed server-side, which is a sign-out too.
            if response.status().is_server_error() {
                return Err(AuthError::Transport(format!(
                    "logout endpoint returned {}",
                    response.status()
                )));
            }
        }

        self.store_token(None);
        self.auth.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.auth.subscribe()
    }
}

// 3. The Mock Implementation (For Tests and Local Runs)
#[derive(Clone)]
struct MockAccount {
    identity: Identity,
    password: String,
}

/// Minimum password length, mirroring the hosted providers' default rule.
pub const MIN_PASSWORD_LEN: usize = 6;

/// MockIdentityBackend
///
/// An in-process identity provider. All connections opened from one backend share
/// the same account table, so an account registered through one connection can
/// sign in through another.
#[derive(Clone, Default)]
pub struct MockIdentityBackend {
    accounts: Arc<Mutex<HashMap<String, MockAccount>>>,
    /// When true, every operation fails with a transport error.
    pub offline: bool,
}

impl MockIdentityBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Opens a connection with its concrete type, for tests that need to
    /// inspect or drive it directly.
    pub fn connect_mock(&self) -> Arc<MockIdentityProvider> {
        let (auth, _) = watch::channel(None);
        Arc::new(MockIdentityProvider {
            accounts: self.accounts.clone(),
            offline: self.offline,
            auth,
        })
    }
}

impl IdentityBackend for MockIdentityBackend {
    fn connect(&self) -> IdentityState {
        self.connect_mock()
    }
}

/// MockIdentityProvider
pub struct MockIdentityProvider {
    accounts: Arc<Mutex<HashMap<String, MockAccount>>>,
    offline: bool,
    auth: watch::Sender<AuthState>,
}

impl MockIdentityProvider {
    /// Announces `state` as if the provider had pushed it (token expiry, another tab...).
    pub fn push_state(&self, state: AuthState) {
        self.auth.send_replace(state);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn create_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, CredentialError> {
        if self.offline {
            return Err(CredentialError::Transport("mock provider offline".to_string()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(CredentialError::WeakPassword);
        }

        let key = email.trim().to_lowercase();
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| CredentialError::Transport("mock account table poisoned".to_string()))?;
        if accounts.contains_key(&key) {
            return Err(CredentialError::EmailInUse);
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.trim().to_string(),
        };
        accounts.insert(
            key,
            MockAccount {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );
        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if self.offline {
            return Err(AuthError::Transport("mock provider offline".to_string()));
        }

        let identity = {
            let accounts = self
                .accounts
                .lock()
                .map_err(|_| AuthError::Transport("mock account table poisoned".to_string()))?;
            match accounts.get(&email.trim().to_lowercase()) {
                Some(account) if account.password == password => account.identity.clone(),
                _ => return Err(AuthError::InvalidCredentials),
            }
        };

        self.auth.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.offline {
            return Err(AuthError::Transport("mock provider offline".to_string()));
        }
        self.auth.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.auth.subscribe()
    }
}
