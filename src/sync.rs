pub mod engine;
pub mod storage;

pub use engine::{SyncEngine, SyncJob};
pub use storage::{LoadoutStorage, MySqlStorage, StorageError};
