//! Core functionality for yap-auth
//!
//! This crate contains the pieces every backend and the top-level `yap-auth` crate share:
//!
//! - [`User`], [`UserProfile`] and the registration types in [`user`]
//! - the [`Error`] taxonomy in [`error`]
//! - [`PasswordHasher`] for one-way credential hashing
//! - [`Claims`] and the [`TokenFactory`] that signs and validates session tokens
//! - the [`UserRepository`] trait and the [`InMemoryUserRepository`] backend
//!
//! Relational backends live in their own crates and implement [`UserRepository`].
pub mod crypto;
pub mod error;
pub mod id;
pub mod repositories;
pub mod token;
pub mod user;
pub mod validation;

pub use crypto::PasswordHasher;
pub use error::Error;
pub use repositories::{InMemoryUserRepository, UserRepository};
pub use token::{Claims, JwtAlgorithm, JwtConfig, TokenFactory};
pub use user::{Gender, NewUser, NewUserBuilder, StoredUser, User, UserId, UserProfile};
