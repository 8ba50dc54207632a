use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ProfileLookupError;

// --- Identity & Role ---

/// Identity
///
/// The external credential's identity as reported by the identity provider.
/// Created on registration and never modified by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Identity {
    // Opaque user id issued by the provider; also the profile document key.
    pub id: Uuid,
    pub email: String,
}

/// Role
///
/// The closed set of portal roles. Chosen once at registration and stored on the
/// profile document. A session whose role could not be resolved carries `None`
/// rather than either variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Student,
    Faculty,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Student, Role::Faculty];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
        }
    }

    /// Human-readable label used in headers ("Student" / "Faculty").
    pub fn label(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Faculty => "Faculty",
        }
    }

    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::Student => "/student/dashboard",
            Role::Faculty => "/faculty/dashboard",
        }
    }

    pub fn profile_path(self) -> &'static str {
        match self {
            Role::Student => "/student/profile",
            Role::Faculty => "/faculty/profile",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProfileLookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            other => Err(ProfileLookupError::InvalidRole(other.to_string())),
        }
    }
}

// --- Profile Documents ---

/// Profile
///
/// The profile document stored under the identity's key in the `users`
/// collection (`public.profiles` in Postgres). Merge-updated: fields missing from
/// a patch keep their stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Profile {
    pub email: String,
    pub role: Role,
    pub name: String,
    pub bio: Option<String>,
    pub department: Option<String>,
    pub skills: Vec<String>,
    // Public URL of an uploaded photo. Absent means the avatar fallback is used.
    pub photo_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Applies `patch` in place; `None` fields are left untouched.
    pub fn merge(&mut self, patch: &ProfilePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(bio) = &patch.bio {
            self.bio = Some(bio.clone());
        }
        if let Some(department) = &patch.department {
            self.department = Some(department.clone());
        }
        if let Some(skills) = &patch.skills {
            self.skills = skills.clone();
        }
        if let Some(photo_url) = &patch.photo_url {
            self.photo_url = Some(photo_url.clone());
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = Some(updated_at);
        }
    }
}

/// NewProfile
///
/// The document written right after a credential is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub email: String,
    pub role: Role,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<NewProfile> for Profile {
    fn from(new: NewProfile) -> Self {
        Profile {
            email: new.email,
            role: new.role,
            name: new.name,
            bio: None,
            department: None,
            skills: Vec::new(),
            photo_url: None,
            created_at: new.created_at,
            updated_at: None,
        }
    }
}

/// ProfilePatch
///
/// Partial update payload for a profile document.
///
/// Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// so only provided fields travel and only provided fields are written.
/// Email, role and creation time are not patchable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == ProfilePatch::default()
    }
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for `POST /register`.
/// The password is handed to the identity provider and never stored or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub name: String,
}

/// LoginRequest
///
/// Input payload for `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RoleQuery
///
/// `?role=` on `/login` and `/register`. Values other than the two roles are ignored.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct RoleQuery {
    pub role: Option<String>,
}

impl RoleQuery {
    /// The pre-selected role toggle, defaulting to student.
    pub fn preselected(&self) -> Role {
        self.role
            .as_deref()
            .and_then(|r| r.parse().ok())
            .unwrap_or_default()
    }
}

/// OnboardingRequest
///
/// Input payload for `POST /onboarding`, used by identities that have no profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OnboardingRequest {
    pub role: Role,
    pub name: String,
}

/// DraftFieldsRequest
///
/// Edits to the profile draft's free-text fields (`PUT /{role}/profile/draft`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DraftFieldsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// AddSkillRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AddSkillRequest {
    pub skill: String,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived profile photo upload URL.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "me.png")]
    pub filename: String,
    /// The MIME type the upload is constrained to.
    #[schema(example = "image/png")]
    pub file_type: String,
}

/// PresignedUrlResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to hand back once the upload finished.
    pub resource_key: String,
}

/// PhotoRequest
///
/// Records an uploaded object as the profile photo (`PUT /{role}/profile/photo`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PhotoRequest {
    pub resource_key: String,
}

/// AssistantRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AssistantRequest {
    pub text: String,
}

/// LocationQuery
///
/// `?location=` for shell renders triggered outside a screen.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct LocationQuery {
    pub location: Option<String>,
}

// --- Skills, Projects & Applications ---

/// SkillRecord
///
/// One skill a student has evidenced: level, project count, an optional GitHub
/// repository and an optional certificate. Stored under the student's id; the
/// skill name is also added to the profile's `skills` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SkillRecord {
    pub id: Uuid,
    pub name: String,
    pub level: String,
    pub projects_count: u32,
    pub github_repo: Option<String>,
    // Public URL of the uploaded certificate, if one was attached.
    pub certificate_url: Option<String>,
    pub verified: bool,
    pub score: u32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// SkillSummary
///
/// The part of a skill record shown next to a search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SkillSummary {
    pub name: String,
    pub score: u32,
    pub projects_count: u32,
    pub verified: bool,
}

/// StudentMatch
///
/// A student whose profile lists the searched skill, with that skill's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StudentMatch {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub skill: SkillSummary,
}

/// ProjectStatus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub enum ProjectStatus {
    #[default]
    Open,
    Closed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Open => "Open",
            ProjectStatus::Closed => "Closed",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = ProfileLookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(ProjectStatus::Open),
            "Closed" => Ok(ProjectStatus::Closed),
            other => Err(ProfileLookupError::Backend(format!("unknown project status {:?}", other))),
        }
    }
}

/// Project
///
/// A faculty project students can apply to. New projects are `Open`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub duration: String,
    pub max_students: u32,
    pub faculty_id: Uuid,
    pub faculty_name: String,
    pub status: ProjectStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ApplicationStatus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = ProfileLookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ApplicationStatus::Pending),
            "Accepted" => Ok(ApplicationStatus::Accepted),
            "Rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(ProfileLookupError::Backend(format!(
                "unknown application status {:?}",
                other
            ))),
        }
    }
}

/// Application
///
/// A student's application to a project. At most one per student and project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Application {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_title: String,
    pub student_id: Uuid,
    pub student_name: String,
    pub faculty_id: Uuid,
    pub status: ApplicationStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// AddSkillRecordRequest
///
/// Input payload for `POST /student/skills`. `certificate_key` is the key handed
/// out by `POST /student/skills/certificate/upload-url`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AddSkillRecordRequest {
    pub skill_name: String,
    pub skill_level: String,
    pub projects_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_key: Option<String>,
}

/// CreateProjectRequest
///
/// Input payload for `POST /faculty/projects/create`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_students: Option<u32>,
}

/// StudentSearchQuery
///
/// `?skill=&limit=` on `/faculty/students/search`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct StudentSearchQuery {
    pub skill: Option<String>,
    pub limit: Option<usize>,
}
