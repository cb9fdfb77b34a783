//! mapform-core: domain model, ordered-collection engine, optimistic state
//! store, gesture recognition, and SQLite persistence for mapform.
//!
//! The crate is organized around the sync protocol that every reorderable
//! collection (pages, layer stacks, views) shares:
//!
//! - [`gesture`] turns pointer events into discrete reorder intents
//! - [`order`] computes new orderings as pure functions
//! - [`optimistic`] keeps the client view current while mutations are in
//!   flight
//! - [`action`] defines the request/settlement boundary and its validation
//! - [`db`] persists everything and executes requests
//! - [`session`] wires the above into an editing session per project
//!
//! # Conventions
//!
//! - **Errors**: typed [`error::StoreError`] at the store boundary,
//!   `anyhow::Result` with context at I/O edges.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).

pub mod action;
pub mod config;
pub mod db;
pub mod error;
pub mod gesture;
pub mod lock;
pub mod model;
pub mod optimistic;
pub mod order;
pub mod paths;
pub mod session;
