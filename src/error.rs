use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// CredentialError
///
/// Registration-time failures. Raised while creating the external credential or,
/// after that succeeded, while writing the first profile document.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("email address is already registered")]
    EmailInUse,
    #[error("password does not meet the provider's strength rules")]
    WeakPassword,
    #[error("identity provider rejected the registration: {0}")]
    Rejected(String),
    #[error("identity provider unreachable: {0}")]
    Transport(String),
    /// The credential exists but its profile document does not. Not repaired.
    #[error("credential created but profile write failed: {0}")]
    ProfileNotCreated(#[source] ProfileWriteError),
}

/// AuthError
///
/// Sign-in and sign-out failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("identity provider returned an invalid access token")]
    InvalidToken,
    #[error("identity provider unreachable: {0}")]
    Transport(String),
}

/// ProfileLookupError
///
/// Post-authentication profile fetch failure. The session listener logs it and
/// leaves role and profile unset.
#[derive(Debug, Error)]
pub enum ProfileLookupError {
    #[error("profile store error: {0}")]
    Backend(String),
    #[error("stored role {0:?} is not a known role")]
    InvalidRole(String),
}

/// ProfileWriteError
///
/// Failures of profile creation and merge writes, and of the skill, project and
/// application records kept in the same store.
#[derive(Debug, Error)]
pub enum ProfileWriteError {
    #[error("no profile document for {0}")]
    NotFound(Uuid),
    #[error("profile document for {0} already exists")]
    AlreadyExists(Uuid),
    #[error("{0}")]
    Duplicate(String),
    #[error("profile store error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for ProfileLookupError {
    fn from(e: sqlx::Error) -> Self {
        ProfileLookupError::Backend(e.to_string())
    }
}

impl From<sqlx::Error> for ProfileWriteError {
    fn from(e: sqlx::Error) -> Self {
        ProfileWriteError::Backend(e.to_string())
    }
}

/// PortalError
///
/// The error returned by HTTP handlers. Every variant maps to a status code and a
/// `{"error": "..."}` JSON body.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    ProfileWrite(#[from] ProfileWriteError),
    #[error(transparent)]
    Lookup(#[from] ProfileLookupError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl PortalError {
    pub fn status(&self) -> StatusCode {
        match self {
            PortalError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Conflict(_) => StatusCode::CONFLICT,
            PortalError::Credential(CredentialError::EmailInUse) => StatusCode::CONFLICT,
            PortalError::Credential(CredentialError::WeakPassword)
            | PortalError::Credential(CredentialError::Rejected(_)) => StatusCode::BAD_REQUEST,
            PortalError::Credential(_) => StatusCode::BAD_GATEWAY,
            PortalError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            PortalError::Auth(_) => StatusCode::BAD_GATEWAY,
            PortalError::ProfileWrite(ProfileWriteError::NotFound(_)) => StatusCode::NOT_FOUND,
            PortalError::ProfileWrite(ProfileWriteError::AlreadyExists(_))
            | PortalError::ProfileWrite(ProfileWriteError::Duplicate(_)) => StatusCode::CONFLICT,
            PortalError::ProfileWrite(_) | PortalError::Lookup(_) | PortalError::Storage(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
