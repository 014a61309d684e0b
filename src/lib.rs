//! Twinfix: facilities issue tracker.
//!
//! This crate tracks issues reported against physical facilities, records
//! an append-only history of their status changes, derives fix metrics when
//! an issue is fixed, and answers proximity and statistics queries.
//!
//! # Architecture
//!
//! Twinfix follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `SQLite` implementations of the ports
//!
//! # Modules
//!
//! - [`issue`]: Issue lifecycle, status history, proximity and statistics
//! - [`user`]: User directory
//! - [`http`]: JSON API over the services
//! - [`database`]: `SQLite` pooling and migrations
//! - [`config`] and [`telemetry`]: Service start-up concerns

pub mod config;
pub mod database;
pub mod http;
pub mod issue;
pub mod telemetry;
pub mod user;
