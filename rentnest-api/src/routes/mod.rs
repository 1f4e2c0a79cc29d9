/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Registration, login, profiles and the admin user directory
/// - `properties`: Property listing search and CRUD

pub mod health;
pub mod properties;
pub mod users;
