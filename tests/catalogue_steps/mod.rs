//! Step definitions for task catalogue scenarios.

pub mod world;

mod given;
mod then;
mod when;
