//! Taskflow: a client-side task catalogue.
//!
//! The crate keeps a collection of tasks with categories, tags, priorities
//! and due dates, persists it through a pluggable storage adapter, and
//! derives search results, statistics and navigation context from it.
//!
//! # Architecture
//!
//! Taskflow follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and change events
//! - **Adapters**: Concrete implementations of ports (memory, files, channels)
//!
//! # Modules
//!
//! - [`task`]: Task records, storage, bulk operations and insights

pub mod task;
