use crate::{models::Role, session::Session};

// --- Entry Points ---

pub const LANDING_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
/// "Complete your profile": where identities with an unknown role are sent.
pub const ONBOARDING_PATH: &str = "/onboarding";

/// GuardDecision
///
/// The outcome of evaluating one navigation against the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session state is not known yet; show the waiting indicator and do nothing else.
    Wait,
    /// Navigate elsewhere instead of rendering.
    Redirect(&'static str),
    /// Render the guarded screen.
    Allow,
}

/// dashboard_for
///
/// The landing screen after sign-in for a session's role. An unknown role goes to
/// onboarding, never to a role dashboard.
pub fn dashboard_for(role: Option<Role>) -> &'static str {
    match role {
        Some(role) => role.dashboard_path(),
        None => ONBOARDING_PATH,
    }
}

/// evaluate
///
/// Decides whether `session` may view a screen requiring `required` (or merely a
/// signed-in identity when `required` is `None`). Pure and uncached: callers
/// evaluate it on every navigation.
pub fn evaluate(session: &Session, required: Option<Role>) -> GuardDecision {
    if session.loading {
        return GuardDecision::Wait;
    }
    if session.identity.is_none() {
        return GuardDecision::Redirect(LOGIN_PATH);
    }
    match required {
        Some(required) if session.role != Some(required) => {
            GuardDecision::Redirect(dashboard_for(session.role))
        }
        _ => GuardDecision::Allow,
    }
}
