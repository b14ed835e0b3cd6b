//! Customer store adapters. Implement CustomerRepoPort.

pub mod json_repo;
pub mod sqlite_repo;

pub use json_repo::JsonRepo;
pub use sqlite_repo::SqliteRepo;
