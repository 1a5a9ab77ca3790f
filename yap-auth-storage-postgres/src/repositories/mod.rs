//! Repository implementations for PostgreSQL storage

pub mod user;

pub use user::PostgresUserRepository;
