/// Router Module Index
///
/// Routing is segregated by who may reach a route. Access control is applied at
/// the module level with route layers, so a handler is never reachable without
/// its guard.

/// Routes reachable by anyone, signed in or not.
pub mod public;

/// Routes that need a signed-in identity but no particular role.
pub mod onboarding;

/// Routes below `/student` and `/faculty`, guarded by role.
pub mod role;
