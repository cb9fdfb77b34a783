//! mapform-sim: deterministic fault injection for the sync protocol.
//!
//! The simulator drives a real [`mapform_core::session::ProjectEditor`]
//! over a transport that delays, drops, duplicates, and reorders
//! settlements, against a real SQLite store — then compares what the editor
//! shows with what the store holds.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod driver;
pub mod rng;
pub mod transport;
