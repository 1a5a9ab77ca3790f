//! Repository implementations for SQLite storage

pub mod user;

pub use user::SqliteUserRepository;
