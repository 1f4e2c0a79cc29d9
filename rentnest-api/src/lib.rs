//! # RentNest API Server Library
//!
//! This library provides the core functionality for the RentNest API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `bootstrap`: Admin seeding and port binding at startup
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with the API error envelope
//! - `middleware`: Security headers and static asset serving
//! - `routes`: API route handlers
//! - `upload`: Listing submissions and image uploads

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod upload;
