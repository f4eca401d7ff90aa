//! Unit tests for the task module.
//!
//! Tests are organised by collaborator: domain values, the filter engine,
//! the repository's draft-then-persist semantics, bulk handling, the
//! service facade, and overlapping calls against slow storage.

mod support;
