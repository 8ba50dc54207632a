use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    guard::LANDING_PATH,
    models::{Profile, Role},
    profile::avatar_url,
    session::SessionStore,
};

pub const PORTAL_TITLE: &str = "RIT Links In";

/// Sidebar widths in rem (expanded / collapsed).
const EXPANDED_WIDTH_REM: u8 = 16;
const COLLAPSED_WIDTH_REM: u8 = 5;

/// NavItem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub path: &'static str,
    pub label: &'static str,
}

const fn item(path: &'static str, label: &'static str) -> NavItem {
    NavItem { path, label }
}

const STUDENT_NAV: [NavItem; 7] = [
    item("/student/profile", "Profile"),
    item("/student/dashboard", "Dashboard"),
    item("/student/notifications", "Notifications"),
    item("/student/knowledge-base", "My Knowledge Base"),
    item("/student/projects", "My Projects"),
    item("/student/skills", "Add Skills and Project"),
    item("/student/settings", "Settings"),
];

const FACULTY_NAV: [NavItem; 7] = [
    item("/faculty/profile", "Profile"),
    item("/faculty/dashboard", "Dashboard"),
    item("/faculty/projects/create", "Add Projects"),
    item("/faculty/seminars/create", "Add Seminars"),
    item("/faculty/students/search", "Search Students"),
    item("/faculty/notifications", "Notifications"),
    item("/faculty/settings", "Settings"),
];

/// The sidebar entries for `role`, in display order.
pub fn nav_items(role: Role) -> &'static [NavItem] {
    match role {
        Role::Student => &STUDENT_NAV,
        Role::Faculty => &FACULTY_NAV,
    }
}

/// NavItemView
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavItemView {
    pub path: String,
    pub label: String,
    pub active: bool,
    pub show_label: bool,
}

/// ShellView
///
/// Everything the client needs to draw the sidebar and header around a screen.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ShellView {
    pub title: String,
    pub role: Role,
    pub expanded: bool,
    pub sidebar_width_rem: u8,
    pub items: Vec<NavItemView>,
    pub logout_label: Option<String>,
    pub avatar_url: String,
}

/// RoleShell
///
/// Per-client chrome state. The two role variants share all behavior and differ
/// only in `nav_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleShell {
    pub expanded: bool,
}

impl Default for RoleShell {
    fn default() -> Self {
        Self { expanded: true }
    }
}

impl RoleShell {
    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn sidebar_width_rem(&self) -> u8 {
        if self.expanded {
            EXPANDED_WIDTH_REM
        } else {
            COLLAPSED_WIDTH_REM
        }
    }

    /// The item whose path equals `location` exactly, if any.
    pub fn active_item(role: Role, location: &str) -> Option<&'static NavItem> {
        nav_items(role).iter().find(|item| item.path == location)
    }

    pub fn render(&self, role: Role, location: &str, profile: Option<&Profile>) -> ShellView {
        let items = nav_items(role)
            .iter()
            .map(|item| NavItemView {
                path: item.path.to_string(),
                label: item.label.to_string(),
                active: item.path == location,
                show_label: self.expanded,
            })
            .collect();

        ShellView {
            title: PORTAL_TITLE.to_string(),
            role,
            expanded: self.expanded,
            sidebar_width_rem: self.sidebar_width_rem(),
            items,
            logout_label: self.expanded.then(|| "Logout".to_string()),
            avatar_url: avatar_url(profile),
        }
    }
}

/// logout
///
/// Signs out and returns where to navigate next. A failure is logged and
/// swallowed, and the caller stays where it is (`None`).
pub async fn logout(store: &SessionStore) -> Option<&'static str> {
    match store.logout().await {
        Ok(()) => Some(LANDING_PATH),
        Err(e) => {
            tracing::error!("Logout error: {}", e);
            None
        }
    }
}
