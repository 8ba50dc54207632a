use chrono::{TimeZone, Utc};
use rit_links_in::{
    error::ProfileWriteError,
    models::{DraftFieldsRequest, Profile, Role},
    profile::{NoticeKind, ProfileDraft, ProfileEditor, ProfileView, avatar_url},
};
use uuid::Uuid;

fn profile() -> Profile {
    Profile {
        email: "asha@rit.edu".to_string(),
        role: Role::Student,
        name: "Asha".to_string(),
        bio: Some("Robotics".to_string()),
        department: Some("ECE".to_string()),
        skills: vec!["Arduino".to_string()],
        photo_url: None,
        created_at: Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap(),
        updated_at: None,
    }
}

// --- Draft ---

#[test]
fn test_draft_is_seeded_from_profile() {
    let draft = ProfileDraft::from_profile(Some(&profile()));
    assert_eq!(draft.name, "Asha");
    assert_eq!(draft.email, "asha@rit.edu");
    assert_eq!(draft.bio, "Robotics");
    assert_eq!(draft.department, "ECE");
    assert_eq!(draft.skills, vec!["Arduino".to_string()]);

    assert_eq!(ProfileDraft::from_profile(None), ProfileDraft::default());
}

#[test]
fn test_add_skill_trims_and_is_idempotent() {
    let mut draft = ProfileDraft::from_profile(Some(&profile()));

    assert!(draft.add_skill("  Flutter "));
    assert!(!draft.add_skill("Flutter"), "duplicates are ignored");
    assert!(!draft.add_skill("Arduino"));
    assert_eq!(draft.skills, vec!["Arduino".to_string(), "Flutter".to_string()]);
}

#[test]
fn test_add_skill_ignores_blank_input() {
    let mut draft = ProfileDraft::default();
    assert!(!draft.add_skill(""));
    assert!(!draft.add_skill("   \t"));
    assert!(draft.skills.is_empty());
}

#[test]
fn test_remove_skill_by_value() {
    let mut draft = ProfileDraft::from_profile(Some(&profile()));
    draft.add_skill("ML");
    draft.add_skill("Flutter");

    assert!(draft.remove_skill("ML"));
    assert_eq!(draft.skills, vec!["Arduino".to_string(), "Flutter".to_string()]);
    assert!(!draft.remove_skill("ML"), "removing an absent skill changes nothing");
}

#[test]
fn test_apply_fields_only_touches_given_fields() {
    let mut draft = ProfileDraft::from_profile(Some(&profile()));
    draft.apply_fields(DraftFieldsRequest {
        bio: Some("Drones".to_string()),
        ..DraftFieldsRequest::default()
    });

    assert_eq!(draft.bio, "Drones");
    assert_eq!(draft.name, "Asha");
    assert_eq!(draft.department, "ECE");
}

#[test]
fn test_patch_carries_editable_fields_and_timestamp() {
    let mut draft = ProfileDraft::from_profile(Some(&profile()));
    draft.email = "changed@rit.edu".to_string();
    let patch = draft.to_patch();

    assert_eq!(patch.name.as_deref(), Some("Asha"));
    assert_eq!(patch.bio.as_deref(), Some("Robotics"));
    assert_eq!(patch.department.as_deref(), Some("ECE"));
    assert_eq!(patch.skills, Some(vec!["Arduino".to_string()]));
    assert!(patch.updated_at.is_some());
    assert!(patch.photo_url.is_none());
}

// --- Editor ---

#[test]
fn test_edit_mode_toggles() {
    let mut editor = ProfileEditor::default();
    assert!(!editor.is_editing());

    editor.begin_edit(Some(&profile()));
    assert!(editor.is_editing());
    assert_eq!(editor.draft().map(|d| d.name.as_str()), Some("Asha"));

    editor.cancel();
    assert!(!editor.is_editing());
    assert!(editor.draft().is_none());
}

#[test]
fn test_successful_submit_leaves_edit_mode_with_notice() {
    let mut editor = ProfileEditor::default();
    editor.begin_edit(Some(&profile()));

    editor.finish_submit(&Ok(()));
    assert!(!editor.is_editing());

    let notice = editor.take_notice().expect("notice missing");
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.message, "Profile updated successfully");
    assert!(editor.take_notice().is_none(), "notices are shown once");
}

#[test]
fn test_failed_submit_keeps_draft() {
    let mut editor = ProfileEditor::default();
    editor.begin_edit(Some(&profile()));
    editor.draft_mut().expect("draft").add_skill("ML");

    editor.finish_submit(&Err(ProfileWriteError::NotFound(Uuid::new_v4())));
    assert!(editor.is_editing());
    assert!(editor.draft().expect("draft").skills.contains(&"ML".to_string()));

    let notice = editor.take_notice().expect("notice missing");
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.message, "Failed to update profile");
}

// --- View ---

#[test]
fn test_profile_view_consumes_notice() {
    let mut editor = ProfileEditor::default();
    editor.begin_edit(Some(&profile()));
    editor.finish_submit(&Ok(()));

    let first = ProfileView::build(Role::Student, Some(&profile()), &mut editor);
    assert!(first.notice.is_some());
    assert!(!first.editing);
    assert_eq!(first.role_label, "Student");
    assert_eq!(first.member_since.as_deref(), Some("2025-04-01"));
    assert_eq!(first.last_updated, None);

    let second = ProfileView::build(Role::Student, Some(&profile()), &mut editor);
    assert!(second.notice.is_none());
}

#[test]
fn test_profile_view_hides_empty_optional_fields() {
    let mut p = profile();
    p.bio = Some(String::new());
    p.department = None;
    let view = ProfileView::build(Role::Student, Some(&p), &mut ProfileEditor::default());
    assert_eq!(view.bio, None);
    assert_eq!(view.department, None);
}

#[test]
fn test_avatar_fallback_encodes_name() {
    let mut p = profile();
    p.name = "Dr. R & D".to_string();
    let url = avatar_url(Some(&p));
    assert!(url.starts_with("https://ui-avatars.com/api/?name="));
    assert!(url.contains("Dr.+R+%26+D"));
    assert!(url.ends_with("&background=random"));
}
