//! Faculty projects and student applications.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::PortalError,
    models::{Application, ApplicationStatus, CreateProjectRequest, Project, ProjectStatus},
};

/// Seats offered when the form leaves `max_students` out.
pub const DEFAULT_MAX_STUDENTS: u32 = 1;

/// new_project
///
/// Validates the form and builds an `Open` project owned by the caller. Title,
/// description and duration must be non-blank, at least one non-blank skill is
/// required, and `max_students` must be at least one.
pub fn new_project(
    request: &CreateProjectRequest,
    faculty_id: Uuid,
    faculty_name: &str,
) -> Result<Project, PortalError> {
    let title = request.title.trim();
    let description = request.description.trim();
    let duration = request.duration.trim();
    if title.is_empty() || description.is_empty() || duration.is_empty() {
        return Err(PortalError::BadRequest("Please fill in all fields".to_string()));
    }

    let mut required_skills: Vec<String> = Vec::new();
    for skill in request.required_skills.iter().map(|s| s.trim()) {
        if !skill.is_empty() && !required_skills.iter().any(|s| s == skill) {
            required_skills.push(skill.to_string());
        }
    }
    if required_skills.is_empty() {
        return Err(PortalError::BadRequest(
            "A project needs at least one required skill".to_string(),
        ));
    }

    let max_students = request.max_students.unwrap_or(DEFAULT_MAX_STUDENTS);
    if max_students == 0 {
        return Err(PortalError::BadRequest(
            "A project needs at least one student seat".to_string(),
        ));
    }

    Ok(Project {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: description.to_string(),
        required_skills,
        duration: duration.to_string(),
        max_students,
        faculty_id,
        faculty_name: faculty_name.to_string(),
        status: ProjectStatus::Open,
        created_at: Utc::now(),
    })
}

/// new_application
///
/// A pending application to `project`. Only open projects accept applications;
/// duplicates are rejected by the store.
pub fn new_application(
    project: &Project,
    student_id: Uuid,
    student_name: &str,
) -> Result<Application, PortalError> {
    if project.status != ProjectStatus::Open {
        return Err(PortalError::Conflict(
            "Project is not accepting applications".to_string(),
        ));
    }

    Ok(Application {
        id: Uuid::new_v4(),
        project_id: project.id,
        project_title: project.title.clone(),
        student_id,
        student_name: student_name.to_string(),
        faculty_id: project.faculty_id,
        status: ApplicationStatus::Pending,
        created_at: Utc::now(),
    })
}
