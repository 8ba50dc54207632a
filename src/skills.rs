//! Skill records and the score used to rank students for a skill.

use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::models::{AddSkillRecordRequest, SkillRecord, StudentMatch};

/// Points for a verified certificate.
pub const CERTIFICATE_POINTS: u32 = 40;
/// Points per project, up to [`MAX_PROJECT_POINTS`].
pub const POINTS_PER_PROJECT: u32 = 10;
pub const MAX_PROJECT_POINTS: u32 = 30;
/// Points for a link to a GitHub repository.
pub const GITHUB_POINTS: u32 = 30;

/// Search results returned when the caller gives no limit.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

// Anchored at the start only; anything may follow the repository name.
static GITHUB_REPO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://github\.com/[\w-]+/[\w-]+").expect("GitHub repository pattern is valid")
});

/// Whether `url` points at a GitHub repository (`https://github.com/owner/repo...`).
pub fn is_github_repo(url: &str) -> bool {
    GITHUB_REPO.is_match(url)
}

/// skill_score
///
/// 40 for a verified certificate, 10 per project capped at 30, and 30 for a
/// GitHub repository link. The maximum is 100.
pub fn skill_score(verified: bool, projects_count: u32, github_repo: Option<&str>) -> u32 {
    let certificate = if verified { CERTIFICATE_POINTS } else { 0 };
    let projects = projects_count
        .saturating_mul(POINTS_PER_PROJECT)
        .min(MAX_PROJECT_POINTS);
    let github = match github_repo {
        Some(url) if is_github_repo(url) => GITHUB_POINTS,
        _ => 0,
    };
    certificate + projects + github
}

/// Builds the stored record for a validated request.
///
/// Certificates are kept but not read, so records are never `verified` and the
/// certificate points are not awarded.
pub fn new_record(request: &AddSkillRecordRequest, certificate_url: Option<String>) -> SkillRecord {
    let github_repo = request
        .github_repo
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);
    let verified = false;

    SkillRecord {
        id: Uuid::new_v4(),
        name: request.skill_name.trim().to_string(),
        level: request.skill_level.trim().to_string(),
        projects_count: request.projects_count,
        score: skill_score(verified, request.projects_count, github_repo.as_deref()),
        github_repo,
        certificate_url,
        verified,
        created_at: Utc::now(),
    }
}

/// The profile's skill list with `skill` added, or `None` when it is already listed.
pub fn with_skill(skills: &[String], skill: &str) -> Option<Vec<String>> {
    if skills.iter().any(|existing| existing == skill) {
        return None;
    }
    let mut updated = skills.to_vec();
    updated.push(skill.to_string());
    Some(updated)
}

/// rank_students
///
/// Highest score first, then by name so equal scores come back in a stable
/// order, cut to `limit` entries.
pub fn rank_students(mut students: Vec<StudentMatch>, limit: usize) -> Vec<StudentMatch> {
    students.sort_by(|a, b| {
        b.skill
            .score
            .cmp(&a.skill.score)
            .then_with(|| a.name.cmp(&b.name))
    });
    students.truncate(limit);
    students
}
