//! Persistence Layer
//!
//! The whole application state is one JSON document ([`AppDatabase`]) stored
//! under the fixed key [`DB_KEY`]. Every consumer goes through the typed
//! repositories in [`repository`]; they in turn go through
//! [`LocalStore::update`], which serialises read-modify-write cycles inside
//! the process.
//!
//! # Backends
//! - [`local_store::JsonFileStore`]: `<data_dir>/<key>.json`, replaced atomically
//! - [`local_store::MemoryStore`]: in-process map for tests
//!
//! # Schema evolution
//! There is no version field. Missing fields take their defaults; a document
//! that is not valid JSON for [`AppDatabase`] is reported as
//! [`StoreError::Corrupt`] instead of being overwritten.
//!
//! [`AppDatabase`]: crate::domain::entities::database::AppDatabase
//! [`DB_KEY`]: crate::domain::entities::database::DB_KEY

pub mod local_store;
pub mod repository;

pub use local_store::{JsonFileStore, KeyValueBackend, LocalStore, MemoryStore};

use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Store error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored state under '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Open the file-backed store under `data_dir`, seeding it on first use
///
/// # Errors
/// Returns error if the directory cannot be created or an existing document
/// cannot be parsed
pub fn init_store(data_dir: &Path) -> Result<Arc<LocalStore>, StoreError> {
    info!("Initializing local store in {}", data_dir.display());

    let backend = JsonFileStore::open(data_dir)?;
    let store = Arc::new(LocalStore::new(Box::new(backend)));

    // Force seeding so the first request does not pay for it
    let db = store.load()?;
    info!(
        "✓ Local store ready: {} signals, {} posts, {} ticker messages",
        db.signals.len(),
        db.posts.len(),
        db.ticker_messages.len()
    );

    Ok(store)
}
