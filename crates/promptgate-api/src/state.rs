//! Application state wiring all services together.
//!
//! Core services are generic over repository/provider/tokenizer traits;
//! AppState pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use promptgate_core::catalog::ModelCatalog;
use promptgate_core::service::ChatService;
use promptgate_core::usage::ledger::UsageLedger;
use promptgate_infra::config::{load_config, resolve_data_dir};
use promptgate_infra::llm::OpenAiProvider;
use promptgate_infra::sqlite::pool::DatabasePool;
use promptgate_infra::sqlite::{SqliteApiKeyStore, SqliteUsageRepository};
use promptgate_infra::tokenizer::{preload_encodings, TiktokenTokenizer};
use promptgate_types::config::GatewayConfig;

/// The chat pipeline pinned to SQLite, tiktoken, and the OpenAI provider.
pub type ConcreteChatService =
    ChatService<SqliteUsageRepository, OpenAiProvider, TiktokenTokenizer>;

/// Shared application state for the REST API.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub catalog: Arc<ModelCatalog>,
    pub ledger: Arc<UsageLedger<SqliteUsageRepository>>,
    pub api_keys: Arc<SqliteApiKeyStore>,
    pub config: Arc<GatewayConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to the database, load
    /// configuration, and wire the pipeline.
    ///
    /// Requires the provider API key env var (default `OPENAI_API_KEY`)
    /// to be set.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;
        let db_pool = DatabasePool::open(data_dir.join("promptgate.db")).await?;

        let config = Arc::new(load_config(&data_dir).await);

        // Encoding tables take a moment to load; do it before traffic.
        preload_encodings();

        let catalog = Arc::new(ModelCatalog::builtin());
        let ledger = Arc::new(UsageLedger::new(SqliteUsageRepository::new(db_pool.clone())));
        let provider = Arc::new(OpenAiProvider::from_env(&config.provider)?);
        let tokenizer = Arc::new(TiktokenTokenizer::new());

        let chat_service = Arc::new(ChatService::new(
            catalog.clone(),
            ledger.clone(),
            config.quota.clone(),
            provider,
            tokenizer,
            config.reserved_output_tokens,
        ));

        Ok(Self {
            chat_service,
            catalog,
            ledger,
            api_keys: Arc::new(SqliteApiKeyStore::new(db_pool.clone())),
            config,
            data_dir,
            db_pool,
        })
    }
}

/// Open the database pool for the default data directory. Used by CLI
/// commands that need storage but not the full pipeline.
pub async fn open_default_pool() -> anyhow::Result<DatabasePool> {
    let data_dir = resolve_data_dir();
    tokio::fs::create_dir_all(&data_dir).await?;
    let pool = DatabasePool::open(data_dir.join("promptgate.db")).await?;
    Ok(pool)
}
