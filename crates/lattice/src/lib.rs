//! Lattice - typed, mirrored relations between issues.
//!
//! Issues are stored as independent rows with no cross-row transactions.
//! [`graph::RelationGraph`] keeps both endpoints of every relation in step
//! and scrubs a deleted issue from all of its neighbours. The crate ships a
//! library, a `lattice` CLI, and the pieces the `lattice-http` server builds on.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod access;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod id_generation;
pub mod relation;
pub mod storage;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

// Output formatting for the CLI
pub mod output;
