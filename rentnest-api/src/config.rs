/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `HOST`: Host to bind to (default: 0.0.0.0)
/// - `PORT`: First port to try (default: 5000)
/// - `MONGO_URI`: MongoDB connection string, or `memory://` for the in-memory store
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 characters)
/// - `JWT_EXPIRE`: Token lifetime such as `30d`, `12h` or `3600` (default: 30d)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `APP_ENV`: `production` enables HSTS
/// - `UPLOAD_DIR`: Where uploaded images are written (default: uploads)
/// - `PUBLIC_DIR`: Static frontend assets (default: public)
/// - `MODELS_DIR`: 3D model assets (default: models)
/// - `ADMIN_PASSWORD`: Password for the seeded admin account
/// - `RUST_LOG`: Log filter (default: rentnest_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use rentnest_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use rentnest_shared::auth::jwt::parse_expiry;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Connection string that selects the in-memory store
pub const MEMORY_URI: &str = "memory://";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Image upload limits and location
    pub uploads: UploadConfig,

    /// Static asset directories
    pub assets: AssetConfig,

    /// Seeded administrator account
    pub admin: AdminConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// First port to try
    pub port: u16,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// MongoDB connection string
    pub uri: String,
}

impl DatabaseConfig {
    /// Whether the in-memory store was requested
    pub fn is_memory(&self) -> bool {
        self.uri.starts_with(MEMORY_URI)
    }
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in seconds
    pub expires_in_seconds: i64,
}

impl JwtConfig {
    pub fn lifetime(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.expires_in_seconds)
    }
}

/// Image upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded images are written to, served at `/uploads`
    pub dir: PathBuf,

    /// Maximum size of one image in bytes
    pub max_file_size: usize,

    /// Maximum number of images per request
    pub max_files: usize,
}

impl UploadConfig {
    /// Largest request body accepted on upload routes
    pub fn max_body_size(&self) -> usize {
        self.max_file_size * self.max_files + 1024 * 1024
    }

    /// File size limit in whole megabytes, as shown to clients
    pub fn max_file_size_mb(&self) -> usize {
        self.max_file_size / (1024 * 1024)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            max_file_size: 10 * 1024 * 1024,
            max_files: 10,
        }
    }
}

/// Static asset directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Frontend files served for non-API paths
    pub public_dir: PathBuf,

    /// 3D model files served at `/models`
    pub models_dir: PathBuf,
}

/// Seeded administrator account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            name: "Administrator".to_string(),
            email: "admin@rentnest.local".to_string(),
            password: "Admin@12345".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("PORT must be a valid port number: {}", e))?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = env::var("APP_ENV")
            .map(|value| value.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let uri = env::var("MONGO_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017/rentnest".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expires_in = parse_expiry(&env::var("JWT_EXPIRE").unwrap_or_else(|_| "30d".to_string()))?;

        let uploads = UploadConfig {
            dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| UploadConfig::default().dir),
            ..Default::default()
        };

        let assets = AssetConfig {
            public_dir: PathBuf::from(env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".to_string())),
            models_dir: PathBuf::from(env::var("MODELS_DIR").unwrap_or_else(|_| "models".to_string())),
        };

        let mut admin = AdminConfig::default();
        if let Ok(password) = env::var("ADMIN_PASSWORD") {
            admin.password = password;
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig { uri },
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_in_seconds: expires_in.num_seconds(),
            },
            uploads,
            assets,
            admin,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
