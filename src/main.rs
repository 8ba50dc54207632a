use rit_links_in::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    identity::{IdentityBackendState, MockIdentityBackend, SupabaseIdentityBackend},
    portal,
    repository::{InMemoryRepository, PostgresRepository, RepositoryState},
    storage::{S3StorageClient, StorageService, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, connects the backends, and serves
/// the portal.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast in production)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins over the defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rit_links_in=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Profile store: Postgres when configured, otherwise in memory.
    let repo: RepositoryState = match &config.db_url {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");
            let repo = PostgresRepository::new(pool);
            repo.ensure_schema()
                .await
                .expect("FATAL: Failed to prepare the profiles table.");
            Arc::new(repo)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; profiles are kept in memory");
            Arc::new(InMemoryRepository::new())
        }
    };

    // 4. Identity backend: Supabase when configured, otherwise in-process.
    let identity: IdentityBackendState = match &config.supabase_url {
        Some(url) => Arc::new(SupabaseIdentityBackend::new(
            url,
            &config.supabase_key,
            &config.jwt_secret,
        )),
        None => {
            tracing::warn!("SUPABASE_URL not set; using the in-process identity provider");
            Arc::new(MockIdentityBackend::new())
        }
    };

    // 5. Storage (S3/MinIO)
    let s3_client = S3StorageClient::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
        &config.storage_public_base,
    )
    .await;

    // LOCAL-ONLY: create the MinIO bucket for the Dockerized setup.
    if config.env == Env::Local {
        s3_client.ensure_bucket_exists().await;
    }
    let storage = Arc::new(s3_client) as StorageState;

    // 6. State, router, server
    let bind_addr = config.bind_addr.clone();
    let idle_ttl = config.session_idle_ttl;
    let state = AppState::new(identity, repo, storage, config);
    // Runs for the life of the process; the handle only matters to tests.
    let _sweeper = portal::spawn_eviction(&state.sessions, idle_ttl);
    let app = create_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: Failed to bind {}: {}", bind_addr, e));

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
    }
}
