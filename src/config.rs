use std::{env, time::Duration};

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SYNC_TIMEOUT_MS: u64 = 5000;
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 1800;
const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and
/// pulled into handlers via FromRef.
///
/// The database and identity backends are optional locally: when their URLs are
/// absent the service runs on the in-memory backends.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string for the profile store.
    pub db_url: Option<String>,
    // Supabase project URL (identity REST API and storage gateway).
    pub supabase_url: Option<String>,
    // Supabase anon/service key sent as the `apikey` header.
    pub supabase_key: String,
    // Secret used to verify access tokens issued by the identity provider.
    pub jwt_secret: String,
    // S3-compatible storage endpoint URL (MinIO in local, Supabase in prod).
    pub s3_endpoint: String,
    // Base URL public objects are read from (`{base}/{bucket}/{key}`).
    pub storage_public_base: String,
    // S3 region (often a stub for local/Supabase).
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    // Bucket holding profile photos.
    pub s3_bucket: String,
    // Address the HTTP server binds to.
    pub bind_addr: String,
    // How long POST /login waits for the session listener before redirecting.
    pub session_sync_timeout: Duration,
    // Portal sessions unused for this long are evicted.
    pub session_idle_ttl: Duration,
    // Runtime environment marker.
    pub env: Env,
}

/// Env
///
/// Switches between local conveniences (MinIO, in-memory backends, pretty logs)
/// and production infrastructure (Supabase, Postgres, JSON logs).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking values for test setup. No external backends configured.
    fn default() -> Self {
        Self {
            db_url: None,
            supabase_url: None,
            supabase_key: "local-anon-key".to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            storage_public_base: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "rit-links-test".to_string(),
            bind_addr: DEFAULT_ADDR.to_string(),
            session_sync_timeout: Duration::from_millis(DEFAULT_SYNC_TIMEOUT_MS),
            session_idle_ttl: Duration::from_secs(DEFAULT_SESSION_IDLE_TTL_SECS),
            env: Env::Local,
        }
    }
}

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("FATAL: {} required in prod", name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn sync_timeout() -> Duration {
    let millis = env::var("SESSION_SYNC_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SYNC_TIMEOUT_MS);
    Duration::from_millis(millis)
}

fn idle_ttl() -> Duration {
    let secs = env::var("SESSION_IDLE_TTL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_SESSION_IDLE_TTL_SECS);
    Duration::from_secs(secs)
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (call `dotenv` first).
    ///
    /// # Panics
    /// Panics if a variable required in production is missing, so the service never
    /// starts half-configured.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("PORTAL_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let session_sync_timeout = sync_timeout();
        let session_idle_ttl = idle_ttl();

        match env {
            Env::Local => {
                let defaults = Self::default();
                Self {
                    env: Env::Local,
                    db_url: optional("DATABASE_URL"),
                    supabase_url: optional("SUPABASE_URL"),
                    supabase_key: env::var("SUPABASE_KEY").unwrap_or(defaults.supabase_key),
                    jwt_secret: env::var("SUPABASE_JWT_SECRET").unwrap_or(defaults.jwt_secret),
                    // Local storage (MinIO) uses known default credentials.
                    s3_bucket: "rit-links-uploads".to_string(),
                    bind_addr,
                    session_sync_timeout,
                    session_idle_ttl,
                    ..defaults
                }
            }
            Env::Production => {
                let project_url = required("SUPABASE_URL");
                // Supabase exposes its Storage API through an S3 gateway; public
                // objects are served from the object API instead.
                let base = project_url.trim_end_matches('/');
                let s3_endpoint = format!("{}/storage/v1/s3", base);
                let storage_public_base = format!("{}/storage/v1/object/public", base);

                Self {
                    env: Env::Production,
                    db_url: Some(required("DATABASE_URL")),
                    supabase_url: Some(project_url),
                    supabase_key: required("SUPABASE_KEY"),
                    jwt_secret: required("SUPABASE_JWT_SECRET"),
                    s3_endpoint,
                    storage_public_base,
                    s3_region: "stub".to_string(),
                    s3_key: required("S3_ACCESS_KEY"),
                    s3_secret: required("S3_SECRET_KEY"),
                    s3_bucket: env::var("S3_BUCKET_NAME")
                        .unwrap_or_else(|_| "rit-links-uploads".to_string()),
                    bind_addr,
                    session_sync_timeout,
                    session_idle_ttl,
                }
            }
        }
    }
}
