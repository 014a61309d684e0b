//! Adapter implementations of the issue repository port.

pub mod memory;
pub mod sqlite;
