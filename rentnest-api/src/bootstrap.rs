/// Startup tasks: admin seeding and port binding
///
/// Both run once from `main` before the server starts accepting requests.
/// Failures here are fatal; `main` logs them and exits with status 1.

use rentnest_shared::{
    auth::password::{hash_password, PasswordError},
    db::{Store, StoreError},
    models::user::{CreateUser, User, UserRole},
};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::AdminConfig;

/// How many successive ports are tried after the configured one
pub const MAX_PORT_RETRIES: u16 = 5;

/// Startup failures
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing failed: {0}")]
    Password(#[from] PasswordError),

    /// Every port in the retry window was taken
    #[error("No available port between {first} and {last}")]
    NoFreePort { first: u16, last: u16 },

    /// Binding failed for a reason other than the port being taken
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Creates the admin account unless a user with its email already exists
///
/// Returns `true` when an account was created.
pub async fn seed_admin(store: &dyn Store, admin: &AdminConfig) -> Result<bool, BootstrapError> {
    if store.find_user_by_email(&admin.email).await?.is_some() {
        debug!(email = %admin.email, "Admin account already exists");
        return Ok(false);
    }

    let user = User::new(CreateUser {
        name: admin.name.clone(),
        email: admin.email.clone(),
        password_hash: hash_password(&admin.password)?,
        role: UserRole::Admin,
        phone: None,
        is_verified: true,
    });

    match store.insert_user(user).await {
        Ok(user) => {
            info!(email = %user.email, "Seeded admin account");
            Ok(true)
        }
        // Another instance seeded it between the lookup and the insert
        Err(StoreError::Duplicate { .. }) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Binds `host:port`, moving to the next port while the current one is in use
///
/// Tries the configured port plus up to [`MAX_PORT_RETRIES`] successors.
/// Errors other than "address in use" are returned immediately.
pub async fn bind_with_retry(host: &str, port: u16) -> Result<TcpListener, BootstrapError> {
    let last = port.saturating_add(MAX_PORT_RETRIES);

    for candidate in port..=last {
        let addr = format!("{}:{}", host, candidate);

        match TcpListener::bind(&addr).await {
            Ok(listener) => {
                if candidate != port {
                    info!(port = candidate, "Bound to fallback port");
                }
                return Ok(listener);
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                warn!(port = candidate, "Port in use, trying next port");
            }
            Err(source) => return Err(BootstrapError::Bind { addr, source }),
        }
    }

    Err(BootstrapError::NoFreePort { first: port, last })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentnest_shared::db::memory::MemoryStore;

    #[tokio::test]
    async fn test_seed_admin_is_idempotent() {
        let store = MemoryStore::new();
        let admin = AdminConfig::default();

        assert!(seed_admin(&store, &admin).await.unwrap());
        assert!(!seed_admin(&store, &admin).await.unwrap());

        let users = store.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, UserRole::Admin);
        assert!(users[0].is_verified);
        assert_eq!(users[0].email, "admin@rentnest.local");
    }

    #[test]
    fn test_no_free_port_message() {
        let err = BootstrapError::NoFreePort {
            first: 5000,
            last: 5005,
        };
        assert_eq!(err.to_string(), "No available port between 5000 and 5005");
    }
}
