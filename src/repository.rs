use crate::error::{ProfileLookupError, ProfileWriteError};
use crate::models::{
    Application, NewProfile, Profile, ProfilePatch, Project, ProjectStatus, Role, SkillRecord,
    SkillSummary, StudentMatch,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use uuid::Uuid;

/// ProfileRepository Trait
///
/// Defines the abstract contract for the profile document store (the `users`
/// collection) and the records hanging off it: skill records, projects and
/// applications. The session store and handlers only see this trait, so the
/// Postgres implementation and the in-memory one are interchangeable.
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn ProfileRepository>`)
/// shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Reads the profile keyed by `id`. `Ok(None)` means no document exists.
    async fn read_profile(&self, id: Uuid) -> Result<Option<Profile>, ProfileLookupError>;

    /// Creates the document for a freshly registered identity.
    async fn create_profile(&self, id: Uuid, profile: NewProfile) -> Result<(), ProfileWriteError>;

    /// Merge-writes `patch`; fields absent from the patch keep their stored value.
    async fn merge_profile(&self, id: Uuid, patch: &ProfilePatch) -> Result<(), ProfileWriteError>;

    // --- Skill records ---

    async fn add_skill_record(&self, user_id: Uuid, record: &SkillRecord)
    -> Result<(), ProfileWriteError>;

    /// A student's skill records, oldest first.
    async fn skill_records(&self, user_id: Uuid) -> Result<Vec<SkillRecord>, ProfileLookupError>;

    /// Students whose profile lists `skill` and who have a record for it, each
    /// with their best-scoring record. Unordered.
    async fn students_with_skill(&self, skill: &str)
    -> Result<Vec<StudentMatch>, ProfileLookupError>;

    // --- Projects & applications ---

    async fn create_project(&self, project: &Project) -> Result<(), ProfileWriteError>;

    async fn read_project(&self, id: Uuid) -> Result<Option<Project>, ProfileLookupError>;

    /// Open projects, newest first.
    async fn list_open_projects(&self) -> Result<Vec<Project>, ProfileLookupError>;

    /// A faculty member's projects, newest first.
    async fn projects_by_faculty(&self, faculty_id: Uuid)
    -> Result<Vec<Project>, ProfileLookupError>;

    /// Stores a new application. A second one for the same student and project
    /// is a `Duplicate`.
    async fn create_application(&self, application: &Application)
    -> Result<(), ProfileWriteError>;

    /// A student's applications, newest first.
    async fn applications_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Application>, ProfileLookupError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn ProfileRepository>;

/// ProfileRow
///
/// Raw `public.profiles` row. `role` stays a string here and is checked on the
/// way out, so a row with an unknown role surfaces as a lookup error.
#[derive(Debug, Clone, FromRow)]
struct ProfileRow {
    email: String,
    role: String,
    name: String,
    bio: Option<String>,
    department: Option<String>,
    skills: Vec<String>,
    photo_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = ProfileLookupError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            email: row.email,
            role: row.role.parse()?,
            name: row.name,
            bio: row.bio,
            department: row.department,
            skills: row.skills,
            photo_url: row.photo_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn count(value: i32) -> Result<u32, ProfileLookupError> {
    u32::try_from(value)
        .map_err(|_| ProfileLookupError::Backend(format!("negative count {} in store", value)))
}

fn count_column(value: u32) -> Result<i32, ProfileWriteError> {
    i32::try_from(value)
        .map_err(|_| ProfileWriteError::Backend(format!("count {} out of range", value)))
}

#[derive(Debug, Clone, FromRow)]
struct SkillRecordRow {
    id: Uuid,
    name: String,
    level: String,
    projects_count: i32,
    github_repo: Option<String>,
    certificate_url: Option<String>,
    verified: bool,
    score: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<SkillRecordRow> for SkillRecord {
    type Error = ProfileLookupError;

    fn try_from(row: SkillRecordRow) -> Result<Self, Self::Error> {
        Ok(SkillRecord {
            id: row.id,
            name: row.name,
            level: row.level,
            projects_count: count(row.projects_count)?,
            github_repo: row.github_repo,
            certificate_url: row.certificate_url,
            verified: row.verified,
            score: count(row.score)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct StudentMatchRow {
    id: Uuid,
    name: String,
    email: String,
    department: Option<String>,
    skill_name: String,
    score: i32,
    projects_count: i32,
    verified: bool,
}

impl TryFrom<StudentMatchRow> for StudentMatch {
    type Error = ProfileLookupError;

    fn try_from(row: StudentMatchRow) -> Result<Self, Self::Error> {
        Ok(StudentMatch {
            id: row.id,
            name: row.name,
            email: row.email,
            department: row.department,
            skill: SkillSummary {
                name: row.skill_name,
                score: count(row.score)?,
                projects_count: count(row.projects_count)?,
                verified: row.verified,
            },
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct ProjectRow {
    id: Uuid,
    title: String,
    description: String,
    required_skills: Vec<String>,
    duration: String,
    max_students: i32,
    faculty_id: Uuid,
    faculty_name: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = ProfileLookupError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            title: row.title,
            description: row.description,
            required_skills: row.required_skills,
            duration: row.duration,
            max_students: count(row.max_students)?,
            faculty_id: row.faculty_id,
            faculty_name: row.faculty_name,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct ApplicationRow {
    id: Uuid,
    project_id: Uuid,
    project_title: String,
    student_id: Uuid,
    student_name: String,
    faculty_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = ProfileLookupError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        Ok(Application {
            id: row.id,
            project_id: row.project_id,
            project_title: row.project_title,
            student_id: row.student_id,
            student_name: row.student_name,
            faculty_id: row.faculty_id,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

fn rows_into<R, T>(rows: Vec<R>) -> Result<Vec<T>, ProfileLookupError>
where
    T: TryFrom<R, Error = ProfileLookupError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Schema for the profile store; mirrored by `migrations/0001_profiles.sql`.
const PROFILES_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id          UUID PRIMARY KEY,
        email       TEXT NOT NULL,
        role        TEXT NOT NULL,
        name        TEXT NOT NULL,
        bio         TEXT,
        department  TEXT,
        skills      TEXT[] NOT NULL DEFAULT '{}',
        photo_url   TEXT,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ
    )
"#;

// Mirrored by `migrations/0002_skills_projects.sql`.
const SKILL_RECORDS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS skill_records (
        id              UUID PRIMARY KEY,
        user_id         UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        name            TEXT NOT NULL,
        level           TEXT NOT NULL,
        projects_count  INTEGER NOT NULL CHECK (projects_count >= 0),
        github_repo     TEXT,
        certificate_url TEXT,
        verified        BOOLEAN NOT NULL DEFAULT FALSE,
        score           INTEGER NOT NULL CHECK (score >= 0),
        created_at      TIMESTAMPTZ NOT NULL
    )
"#;

const PROJECTS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS projects (
        id              UUID PRIMARY KEY,
        title           TEXT NOT NULL,
        description     TEXT NOT NULL,
        required_skills TEXT[] NOT NULL,
        duration        TEXT NOT NULL,
        max_students    INTEGER NOT NULL CHECK (max_students >= 1),
        faculty_id      UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        faculty_name    TEXT NOT NULL,
        status          TEXT NOT NULL,
        created_at      TIMESTAMPTZ NOT NULL
    )
"#;

const APPLICATIONS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS applications (
        id            UUID PRIMARY KEY,
        project_id    UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        project_title TEXT NOT NULL,
        student_id    UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        student_name  TEXT NOT NULL,
        faculty_id    UUID NOT NULL,
        status        TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL,
        UNIQUE (project_id, student_id)
    )
"#;

const PROJECT_COLUMNS: &str = "id, title, description, required_skills, duration, max_students, \
    faculty_id, faculty_name, status, created_at";

/// PostgresRepository
///
/// The concrete implementation of `ProfileRepository`, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// ensure_schema
    ///
    /// Creates the tables when missing, in dependency order. Used by the local setup.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for schema in [
            PROFILES_SCHEMA,
            SKILL_RECORDS_SCHEMA,
            PROJECTS_SCHEMA,
            APPLICATIONS_SCHEMA,
        ] {
            sqlx::query(schema).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for PostgresRepository {
    /// read_profile
    ///
    /// Single-row lookup by primary key.
    async fn read_profile(&self, id: Uuid) -> Result<Option<Profile>, ProfileLookupError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT email, role, name, bio, department, skills, photo_url, created_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    /// create_profile
    ///
    /// Inserts the registration document. A conflicting key is reported, not overwritten.
    async fn create_profile(&self, id: Uuid, profile: NewProfile) -> Result<(), ProfileWriteError> {
        let result = sqlx::query(
            r#"
            INSERT INTO profiles (id, email, role, name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(&profile.email)
        .bind(profile.role.as_str())
        .bind(&profile.name)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ProfileWriteError::AlreadyExists(id));
        }
        Ok(())
    }

    /// merge_profile
    ///
    /// Uses `COALESCE` per column so a `None` patch field leaves the stored value in place.
    async fn merge_profile(&self, id: Uuid, patch: &ProfilePatch) -> Result<(), ProfileWriteError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET name = COALESCE($2, name),
                bio = COALESCE($3, bio),
                department = COALESCE($4, department),
                skills = COALESCE($5, skills),
                photo_url = COALESCE($6, photo_url),
                updated_at = COALESCE($7, updated_at)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.bio)
        .bind(&patch.department)
        .bind(&patch.skills)
        .bind(&patch.photo_url)
        .bind(patch.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(%id, "merge_profile: no document to merge into");
            return Err(ProfileWriteError::NotFound(id));
        }
        Ok(())
    }

    async fn add_skill_record(
        &self,
        user_id: Uuid,
        record: &SkillRecord,
    ) -> Result<(), ProfileWriteError> {
        sqlx::query(
            r#"
            INSERT INTO skill_records
                (id, user_id, name, level, projects_count, github_repo, certificate_url,
                 verified, score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(user_id)
        .bind(&record.name)
        .bind(&record.level)
        .bind(count_column(record.projects_count)?)
        .bind(&record.github_repo)
        .bind(&record.certificate_url)
        .bind(record.verified)
        .bind(count_column(record.score)?)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn skill_records(&self, user_id: Uuid) -> Result<Vec<SkillRecord>, ProfileLookupError> {
        let rows = sqlx::query_as::<_, SkillRecordRow>(
            r#"
            SELECT id, name, level, projects_count, github_repo, certificate_url, verified,
                   score, created_at
            FROM skill_records
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows_into(rows)
    }

    /// students_with_skill
    ///
    /// `DISTINCT ON` keeps each student's best record for the skill.
    async fn students_with_skill(
        &self,
        skill: &str,
    ) -> Result<Vec<StudentMatch>, ProfileLookupError> {
        let rows = sqlx::query_as::<_, StudentMatchRow>(
            r#"
            SELECT DISTINCT ON (p.id)
                   p.id, p.name, p.email, p.department, r.name AS skill_name, r.score,
                   r.projects_count, r.verified
            FROM profiles p
            JOIN skill_records r ON r.user_id = p.id AND r.name = $1
            WHERE p.role = $2 AND $1 = ANY(p.skills)
            ORDER BY p.id, r.score DESC, r.created_at
            "#,
        )
        .bind(skill)
        .bind(Role::Student.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows_into(rows)
    }

    async fn create_project(&self, project: &Project) -> Result<(), ProfileWriteError> {
        sqlx::query(
            r#"
            INSERT INTO projects
                (id, title, description, required_skills, duration, max_students,
                 faculty_id, faculty_name, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.required_skills)
        .bind(&project.duration)
        .bind(count_column(project.max_students)?)
        .bind(project.faculty_id)
        .bind(&project.faculty_name)
        .bind(project.status.as_str())
        .bind(project.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn read_project(&self, id: Uuid) -> Result<Option<Project>, ProfileLookupError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Project::try_from).transpose()
    }

    async fn list_open_projects(&self) -> Result<Vec<Project>, ProfileLookupError> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects WHERE status = $1 ORDER BY created_at DESC",
            PROJECT_COLUMNS
        ))
        .bind(ProjectStatus::Open.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows_into(rows)
    }

    async fn projects_by_faculty(
        &self,
        faculty_id: Uuid,
    ) -> Result<Vec<Project>, ProfileLookupError> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {} FROM projects WHERE faculty_id = $1 ORDER BY created_at DESC",
            PROJECT_COLUMNS
        ))
        .bind(faculty_id)
        .fetch_all(&self.pool)
        .await?;
        rows_into(rows)
    }

    /// create_application
    ///
    /// The `(project_id, student_id)` unique key turns a second application into
    /// a no-op insert, reported as `Duplicate`.
    async fn create_application(
        &self,
        application: &Application,
    ) -> Result<(), ProfileWriteError> {
        let result = sqlx::query(
            r#"
            INSERT INTO applications
                (id, project_id, project_title, student_id, student_name, faculty_id,
                 status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (project_id, student_id) DO NOTHING
            "#,
        )
        .bind(application.id)
        .bind(application.project_id)
        .bind(&application.project_title)
        .bind(application.student_id)
        .bind(&application.student_name)
        .bind(application.faculty_id)
        .bind(application.status.as_str())
        .bind(application.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(duplicate_application());
        }
        Ok(())
    }

    async fn applications_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Application>, ProfileLookupError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT id, project_id, project_title, student_id, student_name, faculty_id,
                   status, created_at
            FROM applications
            WHERE student_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        rows_into(rows)
    }
}

fn duplicate_application() -> ProfileWriteError {
    ProfileWriteError::Duplicate("You have already applied for this project".to_string())
}

/// The in-memory counterparts of the tables next to `profiles`.
#[derive(Default)]
struct Records {
    skills: HashMap<Uuid, Vec<SkillRecord>>,
    projects: Vec<Project>,
    applications: Vec<Application>,
}

/// InMemoryRepository
///
/// A `HashMap`-backed profile store for tests and local runs without a database.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    profiles: Arc<Mutex<HashMap<Uuid, Profile>>>,
    records: Arc<Mutex<Records>>,
    /// When true, lookups fail with a backend error.
    pub fail_reads: bool,
    /// When true, creates and merges fail with a backend error.
    pub fail_writes: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same table, with every lookup failing.
    pub fn failing_reads(self) -> Self {
        Self {
            fail_reads: true,
            ..self
        }
    }

    /// The same table, with every create and merge failing.
    pub fn failing_writes(self) -> Self {
        Self {
            fail_writes: true,
            ..self
        }
    }

    /// Seeds a document directly, bypassing the write path.
    pub fn insert(&self, id: Uuid, profile: Profile) {
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.insert(id, profile);
        }
    }

    /// Reads a document directly, bypassing the failure switches.
    pub fn get(&self, id: Uuid) -> Option<Profile> {
        self.profiles
            .lock()
            .ok()
            .and_then(|profiles| profiles.get(&id).cloned())
    }

    /// Seeds a project directly, bypassing the write path.
    pub fn insert_project(&self, project: Project) {
        if let Ok(mut records) = self.records.lock() {
            records.projects.push(project);
        }
    }

    fn poisoned<E>(_: E) -> ProfileWriteError {
        ProfileWriteError::Backend("in-memory profile table poisoned".to_string())
    }

    fn check_read(&self) -> Result<(), ProfileLookupError> {
        if self.fail_reads {
            return Err(ProfileLookupError::Backend("simulated read failure".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), ProfileWriteError> {
        if self.fail_writes {
            return Err(ProfileWriteError::Backend("simulated write failure".to_string()));
        }
        Ok(())
    }

    fn read_records(&self) -> Result<std::sync::MutexGuard<'_, Records>, ProfileLookupError> {
        self.check_read()?;
        self.records
            .lock()
            .map_err(|_| ProfileLookupError::Backend("in-memory record tables poisoned".to_string()))
    }

    fn write_records(&self) -> Result<std::sync::MutexGuard<'_, Records>, ProfileWriteError> {
        self.check_write()?;
        self.records.lock().map_err(Self::poisoned)
    }
}

fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn read_profile(&self, id: Uuid) -> Result<Option<Profile>, ProfileLookupError> {
        if self.fail_reads {
            return Err(ProfileLookupError::Backend("simulated read failure".to_string()));
        }
        let profiles = self
            .profiles
            .lock()
            .map_err(|_| ProfileLookupError::Backend("in-memory profile table poisoned".to_string()))?;
        Ok(profiles.get(&id).cloned())
    }

    async fn create_profile(&self, id: Uuid, profile: NewProfile) -> Result<(), ProfileWriteError> {
        if self.fail_writes {
            return Err(ProfileWriteError::Backend("simulated write failure".to_string()));
        }
        let mut profiles = self.profiles.lock().map_err(Self::poisoned)?;
        if profiles.contains_key(&id) {
            return Err(ProfileWriteError::AlreadyExists(id));
        }
        profiles.insert(id, profile.into());
        Ok(())
    }

    async fn merge_profile(&self, id: Uuid, patch: &ProfilePatch) -> Result<(), ProfileWriteError> {
        if self.fail_writes {
            return Err(ProfileWriteError::Backend("simulated write failure".to_string()));
        }
        let mut profiles = self.profiles.lock().map_err(Self::poisoned)?;
        let profile = profiles.get_mut(&id).ok_or(ProfileWriteError::NotFound(id))?;
        profile.merge(patch);
        Ok(())
    }

    async fn add_skill_record(
        &self,
        user_id: Uuid,
        record: &SkillRecord,
    ) -> Result<(), ProfileWriteError> {
        let mut records = self.write_records()?;
        records.skills.entry(user_id).or_default().push(record.clone());
        Ok(())
    }

    async fn skill_records(&self, user_id: Uuid) -> Result<Vec<SkillRecord>, ProfileLookupError> {
        let records = self.read_records()?;
        Ok(records.skills.get(&user_id).cloned().unwrap_or_default())
    }

    async fn students_with_skill(
        &self,
        skill: &str,
    ) -> Result<Vec<StudentMatch>, ProfileLookupError> {
        let students: Vec<(Uuid, Profile)> = {
            self.check_read()?;
            let profiles = self.profiles.lock().map_err(|_| {
                ProfileLookupError::Backend("in-memory profile table poisoned".to_string())
            })?;
            profiles
                .iter()
                .filter(|(_, p)| p.role == Role::Student && p.skills.iter().any(|s| s == skill))
                .map(|(id, p)| (*id, p.clone()))
                .collect()
        };

        let records = self.read_records()?;
        let matches = students
            .into_iter()
            .filter_map(|(id, profile)| {
                let best = records
                    .skills
                    .get(&id)?
                    .iter()
                    .filter(|record| record.name == skill)
                    .max_by_key(|record| record.score)?;
                Some(StudentMatch {
                    id,
                    name: profile.name,
                    email: profile.email,
                    department: profile.department,
                    skill: SkillSummary {
                        name: best.name.clone(),
                        score: best.score,
                        projects_count: best.projects_count,
                        verified: best.verified,
                    },
                })
            })
            .collect();
        Ok(matches)
    }

    async fn create_project(&self, project: &Project) -> Result<(), ProfileWriteError> {
        let mut records = self.write_records()?;
        records.projects.push(project.clone());
        Ok(())
    }

    async fn read_project(&self, id: Uuid) -> Result<Option<Project>, ProfileLookupError> {
        let records = self.read_records()?;
        Ok(records.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_open_projects(&self) -> Result<Vec<Project>, ProfileLookupError> {
        let records = self.read_records()?;
        let open = records
            .projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Open)
            .cloned()
            .collect();
        Ok(newest_first(open, |p: &Project| p.created_at))
    }

    async fn projects_by_faculty(
        &self,
        faculty_id: Uuid,
    ) -> Result<Vec<Project>, ProfileLookupError> {
        let records = self.read_records()?;
        let owned = records
            .projects
            .iter()
            .filter(|p| p.faculty_id == faculty_id)
            .cloned()
            .collect();
        Ok(newest_first(owned, |p: &Project| p.created_at))
    }

    async fn create_application(
        &self,
        application: &Application,
    ) -> Result<(), ProfileWriteError> {
        let mut records = self.write_records()?;
        let exists = records.applications.iter().any(|a| {
            a.project_id == application.project_id && a.student_id == application.student_id
        });
        if exists {
            return Err(duplicate_application());
        }
        records.applications.push(application.clone());
        Ok(())
    }

    async fn applications_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Application>, ProfileLookupError> {
        let records = self.read_records()?;
        let mine = records
            .applications
            .iter()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        Ok(newest_first(mine, |a: &Application| a.created_at))
    }
}
