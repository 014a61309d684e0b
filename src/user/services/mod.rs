//! Application services for the user directory.

mod directory;

pub use directory::{
    CreateUserRequest, UserDirectoryError, UserDirectoryResult, UserDirectoryService,
};
