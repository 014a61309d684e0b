//! Issue lifecycle tracking for Twinfix.
//!
//! Issues are reported against a location, move through a closed set of
//! statuses, and keep an append-only history of every status change.
//! Entering the `fixed` status records who fixed the issue and how long it
//! took. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
