use chrono::Utc;
use rit_links_in::{
    guard::{GuardDecision, LOGIN_PATH, ONBOARDING_PATH, dashboard_for, evaluate},
    models::{Identity, Profile, Role},
    session::Session,
};
use uuid::Uuid;

fn identity() -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: "user@rit.edu".to_string(),
    }
}

fn session_as(role: Role) -> Session {
    let profile = Profile {
        email: "user@rit.edu".to_string(),
        role,
        name: "User".to_string(),
        bio: None,
        department: None,
        skills: Vec::new(),
        photo_url: None,
        created_at: Utc::now(),
        updated_at: None,
    };
    Session::signed_in(identity(), profile)
}

#[test]
fn test_loading_session_waits_without_redirect() {
    let loading = Session::loading();
    for required in [None, Some(Role::Student), Some(Role::Faculty)] {
        assert_eq!(evaluate(&loading, required), GuardDecision::Wait);
    }
}

#[test]
fn test_anonymous_session_goes_to_login() {
    let anonymous = Session::anonymous();
    assert_eq!(
        evaluate(&anonymous, Some(Role::Student)),
        GuardDecision::Redirect(LOGIN_PATH)
    );
    assert_eq!(evaluate(&anonymous, None), GuardDecision::Redirect(LOGIN_PATH));
}

#[test]
fn test_matching_role_is_allowed() {
    assert_eq!(
        evaluate(&session_as(Role::Student), Some(Role::Student)),
        GuardDecision::Allow
    );
    assert_eq!(
        evaluate(&session_as(Role::Faculty), Some(Role::Faculty)),
        GuardDecision::Allow
    );
}

#[test]
fn test_role_mismatch_redirects_to_actual_dashboard() {
    assert_eq!(
        evaluate(&session_as(Role::Student), Some(Role::Faculty)),
        GuardDecision::Redirect("/student/dashboard")
    );
    assert_eq!(
        evaluate(&session_as(Role::Faculty), Some(Role::Student)),
        GuardDecision::Redirect("/faculty/dashboard")
    );
}

#[test]
fn test_unknown_role_goes_to_onboarding() {
    let unknown = Session::without_profile(identity());
    for required in Role::ALL {
        assert_eq!(
            evaluate(&unknown, Some(required)),
            GuardDecision::Redirect(ONBOARDING_PATH)
        );
    }
}

#[test]
fn test_identity_only_screens_allow_any_signed_in_session() {
    assert_eq!(
        evaluate(&Session::without_profile(identity()), None),
        GuardDecision::Allow
    );
    assert_eq!(evaluate(&session_as(Role::Faculty), None), GuardDecision::Allow);
}

#[test]
fn test_dashboard_for_each_role() {
    assert_eq!(dashboard_for(Some(Role::Student)), "/student/dashboard");
    assert_eq!(dashboard_for(Some(Role::Faculty)), "/faculty/dashboard");
    assert_eq!(dashboard_for(None), ONBOARDING_PATH);
}
