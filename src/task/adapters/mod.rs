//! Adapter implementations for task catalogue ports.

pub mod channel;
pub mod document;
pub mod file;
pub mod memory;
pub mod migration;

pub use channel::ChannelEventListener;
pub use document::{DocumentBackend, DocumentStorage};
pub use file::{DEFAULT_FILE_CAPACITY, FileDocument, FileStorage};
pub use memory::{InMemoryStorage, MemoryDocument};
pub use migration::{MigrationError, MigrationRegistry, NormalizeTaskRecords, SchemaMigration};
