//! View models for the screens that carry no per-client state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    dashboard::{FacultyDashboard, StudentDashboard},
    guard::{LANDING_PATH, LOGIN_PATH, REGISTER_PATH},
    models::{Application, Project, Role, SkillRecord, StudentMatch},
    profile::ProfileView,
    shell::{PORTAL_TITLE, ShellView},
};

/// Link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Link {
    pub label: String,
    pub href: String,
}

impl Link {
    fn new(label: &str, href: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            href: href.into(),
        }
    }
}

/// Feature
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Feature {
    pub title: String,
    pub description: String,
}

/// LandingView
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LandingView {
    pub title: String,
    pub tagline: String,
    pub sign_in: Vec<Link>,
    pub features: Vec<Feature>,
    pub footer: String,
}

impl LandingView {
    pub fn build() -> Self {
        let feature = |title: &str, description: &str| Feature {
            title: title.to_string(),
            description: description.to_string(),
        };

        Self {
            title: PORTAL_TITLE.to_string(),
            tagline: "A verified skill-based student selection system for faculty projects at Rajalakshmi Institute of Technology.".to_string(),
            sign_in: Role::ALL
                .iter()
                .map(|role| Link::new(role.label(), login_link(*role)))
                .collect(),
            features: vec![
                feature(
                    "Skill Verification",
                    "Upload certifications and projects to verify your skills and increase your chances of selection.",
                ),
                feature(
                    "Project Matching",
                    "Faculty can find the most skilled students for their projects based on verified credentials.",
                ),
                feature(
                    "Seminar Management",
                    "Stay updated with ongoing seminars and register directly through the platform.",
                ),
            ],
            footer: "© 2025 RIT Links In. All rights reserved.".to_string(),
        }
    }
}

pub fn login_link(role: Role) -> String {
    format!("{}?role={}", LOGIN_PATH, role)
}

pub fn register_link(role: Role) -> String {
    format!("{}?role={}", REGISTER_PATH, role)
}

/// AuthMode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AuthMode {
    Login,
    Register,
}

/// AuthFormView
///
/// The login and register forms. `role` is the pre-selected toggle; `switch`
/// links to the other form with the same role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthFormView {
    pub mode: AuthMode,
    pub role: Role,
    pub roles: Vec<Role>,
    pub switch: Link,
}

impl AuthFormView {
    pub fn login(role: Role) -> Self {
        Self {
            mode: AuthMode::Login,
            role,
            roles: Role::ALL.to_vec(),
            switch: Link::new("Register", register_link(role)),
        }
    }

    pub fn register(role: Role) -> Self {
        Self {
            mode: AuthMode::Register,
            role,
            roles: Role::ALL.to_vec(),
            switch: Link::new("Login", login_link(role)),
        }
    }
}

/// OnboardingView
///
/// "Complete your profile": shown to a signed-in identity without a profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OnboardingView {
    pub email: String,
    pub roles: Vec<Role>,
    pub message: String,
}

impl OnboardingView {
    pub fn build(email: &str) -> Self {
        Self {
            email: email.to_string(),
            roles: Role::ALL.to_vec(),
            message: "We couldn't find your profile. Choose your role and name to continue.".to_string(),
        }
    }
}

/// NotFoundView
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NotFoundView {
    pub title: String,
    pub message: String,
    pub home: Link,
}

impl Default for NotFoundView {
    fn default() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "Oops! The page you're looking for doesn't exist or has been moved.".to_string(),
            home: Link::new("Back to Home", LANDING_PATH),
        }
    }
}

/// StudentDashboardPage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StudentDashboardPage {
    pub shell: ShellView,
    pub dashboard: StudentDashboard,
}

/// FacultyDashboardPage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FacultyDashboardPage {
    pub shell: ShellView,
    pub dashboard: FacultyDashboard,
}

/// ProfilePage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProfilePage {
    pub shell: ShellView,
    pub profile: ProfileView,
}

/// SkillsPage
///
/// "Add Skills and Project": the student's skill records, best score first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SkillsPage {
    pub shell: ShellView,
    pub records: Vec<SkillRecord>,
}

/// StudentProjectsPage
///
/// "My Projects": open projects to apply to and the student's applications.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StudentProjectsPage {
    pub shell: ShellView,
    pub open_projects: Vec<Project>,
    pub applications: Vec<Application>,
}

/// CreateProjectPage
///
/// "Add Projects": the faculty member's projects, newest first, next to the form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateProjectPage {
    pub shell: ShellView,
    pub projects: Vec<Project>,
}

/// StudentSearchPage
///
/// "Search Students". `skill` is `None` before the first search.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StudentSearchPage {
    pub shell: ShellView,
    pub skill: Option<String>,
    pub students: Vec<StudentMatch>,
}
