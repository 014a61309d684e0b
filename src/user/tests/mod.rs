//! Unit tests for the user directory.

mod directory_tests;
