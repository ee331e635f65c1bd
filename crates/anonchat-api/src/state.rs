//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the CLI commands
//! and the REST API handlers. Services are generic over store traits, but
//! AppState pins them to the SQLite implementations. Everything is built
//! once at process start and passed down explicitly -- no module-level
//! singletons.

use std::path::Path;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, warn};

use anonchat_core::ai::BoxAiProvider;
use anonchat_core::history::ConversationService;
use anonchat_core::limiter::RateLimiter;
use anonchat_infra::config::load_service_config;
use anonchat_infra::data_dir::resolve_data_dir;
use anonchat_infra::llm::gemini::GeminiProvider;
use anonchat_infra::sqlite::audit::SqliteExchangeLog;
use anonchat_infra::sqlite::conversation::SqliteConversationStore;
use anonchat_infra::sqlite::pool::DatabasePool;
use anonchat_infra::sqlite::rate_limit::SqliteRateLimitStore;
use anonchat_types::config::ServiceConfig;

/// Concrete type aliases for the service generics pinned to the SQLite
/// implementations.
pub type ConcreteRateLimiter = RateLimiter<SqliteRateLimitStore>;

pub type ConcreteConversationService =
    ConversationService<SqliteConversationStore, SqliteExchangeLog>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<ConcreteRateLimiter>,
    pub conversations: Arc<ConcreteConversationService>,
    /// Absent when no Gemini API key is configured; chat then answers 503.
    pub ai: Option<Arc<BoxAiProvider>>,
    pub config: Arc<ServiceConfig>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state from the environment: resolve the
    /// data directory, load config, connect to the database, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_service_config(&data_dir).await;

        let ai = match gemini_api_key() {
            Some(key) => Some(BoxAiProvider::new(GeminiProvider::new(key, config.ai.clone()))),
            None => {
                warn!("No GEMINI_API_KEY or GOOGLE_API_KEY set; chat endpoint will be unavailable");
                None
            }
        };

        Self::init_at(&data_dir, config, ai).await
    }

    /// Wire services against an explicit data directory, config, and
    /// provider. `init` delegates here; tests call it directly with a
    /// temp directory and a scripted provider.
    pub async fn init_at(
        data_dir: &Path,
        config: ServiceConfig,
        ai: Option<BoxAiProvider>,
    ) -> anyhow::Result<Self> {
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("anonchat.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let limiter = RateLimiter::new(SqliteRateLimitStore::new(db_pool.clone()));

        let conversations = ConversationService::new(
            SqliteConversationStore::new(db_pool.clone()),
            SqliteExchangeLog::new(db_pool.clone()),
        );

        Ok(Self {
            limiter: Arc::new(limiter),
            conversations: Arc::new(conversations),
            ai: ai.map(Arc::new),
            config: Arc::new(config),
            db_pool,
        })
    }

    /// Startup admin routine: clear every rate-limit record (full quota
    /// reset on restart -- an operational policy, not a bug) and purge
    /// sessions and audit entries past the retention window.
    pub async fn run_startup_maintenance(&self) -> anyhow::Result<()> {
        let cleared = self.limiter.reset_all().await?;
        let report = self
            .conversations
            .purge_older_than(self.config.retention.days)
            .await?;

        info!(
            rate_limits_cleared = cleared,
            sessions_purged = report.sessions,
            audit_entries_purged = report.audit_entries,
            "startup maintenance completed"
        );

        Ok(())
    }
}

/// Gemini API key from the environment; `GEMINI_API_KEY` wins over the
/// legacy `GOOGLE_API_KEY`.
fn gemini_api_key() -> Option<SecretString> {
    for var in ["GEMINI_API_KEY", "GOOGLE_API_KEY"] {
        if let Ok(key) = std::env::var(var) {
            if !key.is_empty() {
                return Some(SecretString::from(key));
            }
        }
    }
    None
}
