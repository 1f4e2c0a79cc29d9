/// Middleware modules for the API server
///
/// This module contains custom middleware for:
/// - Security headers
/// - Static asset serving (model content types, non-API fallback)

pub mod security;
pub mod static_files;
