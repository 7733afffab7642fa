use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub firebase: FirebaseConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Identity provider settings. Tokens are standard RS256 JWTs minted by
/// Firebase Auth; `project_id` doubles as the expected audience.
#[derive(Debug, Deserialize, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    #[serde(default = "default_jwks_url")]
    pub jwks_url: String,
}

fn default_jwks_url() -> String {
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com"
        .to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub uploads_dir: String,
    pub firebase: Option<FirebaseStorageConfig>,
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: "uploads".to_string(),
            firebase: None,
            cloudinary: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FirebaseStorageConfig {
    pub enabled: bool,
    pub bucket: String,
    pub service_account_email: String,
    /// PEM-encoded RSA private key of the service account.
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CloudinaryConfig {
    pub enabled: bool,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.base_url", "http://localhost:5000")?
            .set_default("database.max_connections", 10)?
            .set_default("storage.uploads_dir", "uploads")?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with LEARNLY__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("LEARNLY").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                base_url: "http://localhost:5000".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://learnly.db".to_string(),
                max_connections: 10,
            },
            firebase: FirebaseConfig {
                project_id: "learnly-dev".to_string(),
                jwks_url: default_jwks_url(),
            },
            admin: AdminConfig {
                api_key: "change-me-in-production".to_string(),
            },
            storage: StorageConfig::default(),
        }
    }
}
