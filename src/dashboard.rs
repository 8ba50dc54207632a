//! Dashboard view models. The figures are fixed sample data; only the faculty
//! request list carries state (per client, see `portal::PortalSession`).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{error::PortalError, models::Profile};

/// StatCard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StatCard {
    pub label: String,
    pub value: u32,
}

/// ProjectCard
///
/// A project the student is currently enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProjectCard {
    pub id: u32,
    pub title: String,
    pub technology: String,
    pub faculty: String,
    pub status: String,
}

/// SeminarCard
///
/// `organization` is shown to students, `attendees` to faculty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SeminarCard {
    pub id: u32,
    pub title: String,
    pub date: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<u32>,
}

/// RequestStatus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// RequestDecision
///
/// What a faculty member can do with a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    Accept,
    Reject,
}

impl RequestDecision {
    fn outcome(self) -> RequestStatus {
        match self {
            RequestDecision::Accept => RequestStatus::Accepted,
            RequestDecision::Reject => RequestStatus::Rejected,
        }
    }
}

/// ProjectRequest
///
/// A student's request to join one of the faculty member's projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProjectRequest {
    pub id: u32,
    pub title: String,
    pub student: String,
    pub skill: String,
    pub status: RequestStatus,
}

impl ProjectRequest {
    /// Moves a pending request to its decided status. Decided requests are final.
    pub fn decide(&mut self, decision: RequestDecision) -> Result<(), PortalError> {
        if self.status != RequestStatus::Pending {
            return Err(PortalError::Conflict(format!(
                "Request {} has already been {:?}",
                self.id, self.status
            )));
        }
        self.status = decision.outcome();
        Ok(())
    }
}

/// Applies `decision` to the request with `id` and returns its new state.
pub fn decide_request(
    requests: &mut [ProjectRequest],
    id: u32,
    decision: RequestDecision,
) -> Result<ProjectRequest, PortalError> {
    let request = requests
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| PortalError::NotFound(format!("Request {} not found", id)))?;
    request.decide(decision)?;
    Ok(request.clone())
}

/// The request list every faculty client starts with.
pub fn sample_requests() -> Vec<ProjectRequest> {
    vec![ProjectRequest {
        id: 1,
        title: "IOT-based Attendance System".to_string(),
        student: "Suresh".to_string(),
        skill: "Basics of Arduino".to_string(),
        status: RequestStatus::Pending,
    }]
}

fn stat(label: &str, value: u32) -> StatCard {
    StatCard {
        label: label.to_string(),
        value,
    }
}

fn seminar(id: u32, title: &str, date: &str, time: &str) -> SeminarCard {
    SeminarCard {
        id,
        title: title.to_string(),
        date: date.to_string(),
        time: time.to_string(),
        organization: None,
        attendees: None,
    }
}

fn project(id: u32, title: &str, technology: &str, faculty: &str) -> ProjectCard {
    ProjectCard {
        id,
        title: title.to_string(),
        technology: technology.to_string(),
        faculty: faculty.to_string(),
        status: "In Progress".to_string(),
    }
}

fn welcome(profile: Option<&Profile>, fallback: &str) -> String {
    let name = profile
        .map(|p| p.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback);
    format!("Welcome {}!", name)
}

/// StudentDashboard
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StudentDashboard {
    pub welcome: String,
    pub stats: Vec<StatCard>,
    pub current_projects: Vec<ProjectCard>,
    pub upcoming_seminars: Vec<SeminarCard>,
}

impl StudentDashboard {
    pub fn build(profile: Option<&Profile>) -> Self {
        let rit = |mut card: SeminarCard| {
            card.organization = Some("RIT".to_string());
            card
        };

        Self {
            welcome: welcome(profile, "Student"),
            stats: vec![
                stat("Total Project Enrollment", 3),
                stat("Total Seminar Enrollment", 2),
                stat("Total Skills", 5),
            ],
            current_projects: vec![
                project(1, "IOT-based Attendance System", "Arduino", "Santosh"),
                project(2, "Drones", "ML", "Ram"),
            ],
            upcoming_seminars: vec![
                rit(seminar(1, "Vega V-3 Workshop", "20 April 2025", "2:00 PM")),
                rit(seminar(2, "Introduction to Flutter", "30 April 2025", "1:30 PM")),
            ],
        }
    }
}

/// FacultyDashboard
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FacultyDashboard {
    pub welcome: String,
    pub stats: Vec<StatCard>,
    pub student_requests: Vec<ProjectRequest>,
    pub upcoming_seminars: Vec<SeminarCard>,
}

impl FacultyDashboard {
    pub fn build(profile: Option<&Profile>, requests: &[ProjectRequest]) -> Self {
        let attended = |mut card: SeminarCard, count: u32| {
            card.attendees = Some(count);
            card
        };

        Self {
            welcome: welcome(profile, "Faculty"),
            stats: vec![stat("Published Projects", 2), stat("Total Seminars", 3)],
            student_requests: requests.to_vec(),
            upcoming_seminars: vec![
                attended(seminar(1, "Vega V-3 Workshop", "20 April 2025", "2:00 PM"), 12),
                attended(seminar(2, "Introduction to Flutter", "30 April 2025", "1:30 PM"), 8),
            ],
        }
    }
}
