//! Unit tests for the issue lifecycle module.

mod domain_tests;
mod sqlite_tests;
mod support;
