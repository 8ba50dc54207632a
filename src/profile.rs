//! Profile screen state: edit mode, the draft being edited, and the one-shot
//! notice shown after a submit.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    error::ProfileWriteError,
    models::{DraftFieldsRequest, Profile, ProfilePatch, Role},
    session::SessionStore,
};

const AVATAR_SERVICE: &str = "https://ui-avatars.com/api/";

/// avatar_url
///
/// The stored photo when there is one, otherwise a generated avatar seeded by the
/// display name (`User` when unknown).
pub fn avatar_url(profile: Option<&Profile>) -> String {
    if let Some(photo) = profile.and_then(|p| p.photo_url.as_deref()) {
        return photo.to_string();
    }
    let name = profile
        .map(|p| p.name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or("User");
    generated_avatar(name)
}

fn generated_avatar(name: &str) -> String {
    match reqwest::Url::parse_with_params(AVATAR_SERVICE, &[("name", name), ("background", "random")])
    {
        Ok(url) => url.to_string(),
        Err(_) => format!("{AVATAR_SERVICE}?background=random"),
    }
}

/// ProfileDraft
///
/// Local copy of the editable profile fields, seeded when edit mode starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProfileDraft {
    pub name: String,
    pub email: String,
    pub bio: String,
    pub department: String,
    pub skills: Vec<String>,
}

impl ProfileDraft {
    pub fn from_profile(profile: Option<&Profile>) -> Self {
        match profile {
            Some(p) => Self {
                name: p.name.clone(),
                email: p.email.clone(),
                bio: p.bio.clone().unwrap_or_default(),
                department: p.department.clone().unwrap_or_default(),
                skills: p.skills.clone(),
            },
            None => Self::default(),
        }
    }

    /// Adds `skill` trimmed. Blank input and exact duplicates are ignored.
    /// Returns whether the list changed.
    pub fn add_skill(&mut self, skill: &str) -> bool {
        let skill = skill.trim();
        if skill.is_empty() || self.skills.iter().any(|s| s == skill) {
            return false;
        }
        self.skills.push(skill.to_string());
        true
    }

    /// Removes every entry equal to `skill`. Returns whether the list changed.
    pub fn remove_skill(&mut self, skill: &str) -> bool {
        let before = self.skills.len();
        self.skills.retain(|s| s != skill);
        self.skills.len() != before
    }

    pub fn apply_fields(&mut self, fields: DraftFieldsRequest) {
        if let Some(name) = fields.name {
            self.name = name;
        }
        if let Some(bio) = fields.bio {
            self.bio = bio;
        }
        if let Some(department) = fields.department {
            self.department = department;
        }
    }

    /// The write sent on submit. Email is display-only and never written.
    pub fn to_patch(&self) -> ProfilePatch {
        ProfilePatch {
            name: Some(self.name.clone()),
            bio: Some(self.bio.clone()),
            department: Some(self.department.clone()),
            skills: Some(self.skills.clone()),
            photo_url: None,
            updated_at: Some(Utc::now()),
        }
    }
}

/// NoticeKind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Notice
///
/// A transient toast. Rendered once, then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.to_string(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.to_string(),
        }
    }
}

/// ProfileEditor
///
/// Per-client profile screen state.
#[derive(Debug, Clone, Default)]
pub struct ProfileEditor {
    draft: Option<ProfileDraft>,
    notice: Option<Notice>,
}

impl ProfileEditor {
    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn draft(&self) -> Option<&ProfileDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut ProfileDraft> {
        self.draft.as_mut()
    }

    /// Enters edit mode with a draft seeded from `profile`. Re-entering reseeds.
    pub fn begin_edit(&mut self, profile: Option<&Profile>) {
        self.draft = Some(ProfileDraft::from_profile(profile));
    }

    pub fn cancel(&mut self) {
        self.draft = None;
    }

    /// Takes the pending notice, if any.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Records the outcome of a submit: leave edit mode on success only.
    pub fn finish_submit(&mut self, outcome: &Result<(), ProfileWriteError>) {
        match outcome {
            Ok(()) => {
                self.draft = None;
                self.notice = Some(Notice::success("Profile updated successfully"));
            }
            Err(e) => {
                tracing::error!("Error updating profile: {}", e);
                self.notice = Some(Notice::error("Failed to update profile"));
            }
        }
    }
}

/// submit
///
/// Writes `draft` through the session store.
pub async fn submit(store: &SessionStore, draft: &ProfileDraft) -> Result<(), ProfileWriteError> {
    store.update_profile(draft.to_patch()).await
}

/// ProfileView
///
/// The profile screen. `draft` is present in edit mode.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProfileView {
    pub role_label: String,
    pub editing: bool,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub department: Option<String>,
    pub skills: Vec<String>,
    pub avatar_url: String,
    pub member_since: Option<String>,
    pub last_updated: Option<String>,
    pub draft: Option<ProfileDraft>,
    pub notice: Option<Notice>,
}

impl ProfileView {
    pub fn build(role: Role, profile: Option<&Profile>, editor: &mut ProfileEditor) -> Self {
        let date = |d: chrono::DateTime<Utc>| d.format("%Y-%m-%d").to_string();
        Self {
            role_label: role.label().to_string(),
            editing: editor.is_editing(),
            name: profile.map(|p| p.name.clone()).unwrap_or_default(),
            email: profile.map(|p| p.email.clone()).unwrap_or_default(),
            bio: profile.and_then(|p| p.bio.clone()).filter(|b| !b.is_empty()),
            department: profile
                .and_then(|p| p.department.clone())
                .filter(|d| !d.is_empty()),
            skills: profile.map(|p| p.skills.clone()).unwrap_or_default(),
            avatar_url: avatar_url(profile),
            member_since: profile.map(|p| date(p.created_at)),
            last_updated: profile.and_then(|p| p.updated_at).map(date),
            draft: editor.draft().cloned(),
            notice: editor.take_notice(),
        }
    }
}
