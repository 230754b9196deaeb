pub mod app;
pub mod clock;
pub mod errors;
pub mod handlers;
pub mod journal;
pub mod models;
pub mod range;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use errors::{JournalError, StorageError};
pub use journal::Journal;
pub use state::AppState;
pub use storage::{resolve_data_dir, JsonFileStore, KeyValueStore, MemoryStore};
