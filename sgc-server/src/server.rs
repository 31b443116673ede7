use crate::auth::{AuthService, JwtService, PasswordService};
use crate::config::ServerConfig;
use crate::db::PgQualityStore;
use anyhow::{Context, Result};
use database_layer::connection::DatabasePool;
use document_storage::{FileSystemBackend, MemoryBackend, ObjectStore, StorageBackend};
use quality_service::{MemoryStore, QualityService, QualityStore};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Main SGC server state
#[derive(Clone)]
pub struct SgcServer {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Quality management rules and persistence
    pub service: QualityService,
    /// Accounts, sign-in and tokens
    pub auth: AuthService,
    /// PostgreSQL pool when running against a database
    pub database: Option<DatabasePool>,
    started_at: Instant,
}

impl SgcServer {
    /// Build the server from configuration, connecting to the configured
    /// database and storage directory
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let (store, database): (Arc<dyn QualityStore>, Option<DatabasePool>) =
            match &config.database_url {
                Some(url) => {
                    let pool = DatabasePool::new(url, &config.database)
                        .await
                        .context("Failed to connect to PostgreSQL")?;
                    if config.run_migrations {
                        pool.migrate().await.context("Failed to run migrations")?;
                    }
                    (Arc::new(PgQualityStore::new(pool.clone())), Some(pool))
                }
                None => {
                    warn!("No database_url configured; data lives in memory and is lost on restart");
                    (Arc::new(MemoryStore::new()), None)
                }
            };

        let backend: Arc<dyn StorageBackend> = match &config.storage_dir {
            Some(dir) => {
                let backend = FileSystemBackend::new(dir);
                backend
                    .initialize()
                    .await
                    .with_context(|| format!("Failed to prepare storage directory {}", dir.display()))?;
                Arc::new(backend)
            }
            None => {
                warn!("No storage_dir configured; uploaded files live in memory");
                Arc::new(MemoryBackend::new())
            }
        };

        Self::with_parts(config, store, backend, database)
    }

    /// Server backed entirely by memory; used by tests and demos
    pub fn in_memory(config: ServerConfig) -> Result<Self> {
        Self::with_parts(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryBackend::new()),
            None,
        )
    }

    pub fn with_parts(
        config: ServerConfig,
        store: Arc<dyn QualityStore>,
        backend: Arc<dyn StorageBackend>,
        database: Option<DatabasePool>,
    ) -> Result<Self> {
        let objects = ObjectStore::new(backend, config.public_url());
        let service = QualityService::new(store, objects);

        let tokens = JwtService::new(&config.jwt_secret, config.jwt_issuer.clone(), config.token_ttl_secs);
        let auth = AuthService::new(service.clone(), PasswordService::new()?, Arc::new(tokens));

        info!(
            store = service.store().backend_name(),
            storage = service.objects().backend_name(),
            "Quality service initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            service,
            auth,
            database,
            started_at: Instant::now(),
        })
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Release pooled connections
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.database {
            pool.close().await;
        }
    }
}
