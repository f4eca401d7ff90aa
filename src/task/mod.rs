//! Task catalogue.
//!
//! Tasks, categories and preferences live in memory and are written through
//! a [`ports::StorageAdapter`] on every mutation. The module follows
//! hexagonal architecture:
//!
//! - Domain types, filtering and sorting in [`domain`]
//! - Storage and event contracts in [`ports`]
//! - In-memory, file and channel implementations in [`adapters`]
//! - The [`services::TaskService`] facade and its collaborators in [`services`]
//! - Tunable limits in [`config`]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
