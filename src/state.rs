use crate::journal::Journal;
use crate::storage::JsonFileStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub journal: Arc<Mutex<Journal<JsonFileStore>>>,
}

impl AppState {
    pub fn new(journal: Journal<JsonFileStore>) -> Self {
        Self {
            journal: Arc::new(Mutex::new(journal)),
        }
    }
}
