//! Adapter implementations of the user repository port.

pub mod memory;
pub mod sqlite;
