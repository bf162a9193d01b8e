#![forbid(unsafe_code)]
//! trove-core library.
//!
//! Data model, collaborator contracts, and configuration shared by the trove
//! retrieval and deduplication engine. The algorithmic core lives in
//! `trove-search`; this crate defines what crosses its boundaries: documents,
//! payload snapshots, the four backend traits, typed filters, and errors.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at collaborator boundaries;
//!   `anyhow::Result` only for configuration loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`,
//!   `trace!`).

pub mod backend;
pub mod config;
pub mod error;
pub mod model;
