//! SQLite persistence layer.

pub mod api_key;
pub mod pool;
pub mod usage;

pub use api_key::SqliteApiKeyStore;
pub use pool::DatabasePool;
pub use usage::SqliteUsageRepository;
