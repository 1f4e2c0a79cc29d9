//! # RentNest Shared Library
//!
//! This crate contains the domain types, validation rules, authentication
//! primitives and storage layer used by the RentNest API server.
//!
//! ## Module Organization
//!
//! - `models`: User and Property documents, input casting and validation
//! - `auth`: Password hashing, JWT tokens, authorization checks
//! - `db`: Storage abstraction with MongoDB and in-memory backends

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the RentNest shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
