use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Endpoint accepting JSON mail submissions. Emails are only logged when unset.
    #[serde(default)]
    pub mail_relay_url: Option<String>,

    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    #[serde(default)]
    pub admin_email: Option<String>,

    #[serde(default)]
    pub admin_password: Option<String>,

    #[serde(default = "default_password_cost")]
    pub password_cost: u32,

    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    jwt_secret: Option<String>,
    listen_addr: Option<String>,
    log_dir: Option<String>,
    mail_relay_url: Option<String>,
    mail_from: Option<String>,
    admin_email: Option<String>,
    admin_password: Option<String>,
    password_cost: Option<u32>,
    secure_cookies: Option<bool>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_mail_from() -> String {
    "no-reply@marketplace.local".to_string()
}

fn default_password_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_secure_cookies() -> bool {
    true
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let path = Path::new(path_str);
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            }
            _ => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        Self::merge(env_config, file_config)
    }

    fn merge(env_config: PartialServerConfig, file_config: PartialServerConfig) -> Result<Self, String> {
        Ok(ServerConfig {
            database_url: env_config.database_url.or(file_config.database_url)
                .ok_or("DATABASE_URL is required")?,
            jwt_secret: env_config.jwt_secret.or(file_config.jwt_secret)
                .ok_or("JWT_SECRET is required")?,
            listen_addr: env_config.listen_addr.or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            log_dir: env_config.log_dir.or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            mail_relay_url: env_config.mail_relay_url.or(file_config.mail_relay_url),
            mail_from: env_config.mail_from.or(file_config.mail_from)
                .unwrap_or_else(default_mail_from),
            admin_email: env_config.admin_email.or(file_config.admin_email),
            admin_password: env_config.admin_password.or(file_config.admin_password),
            password_cost: env_config.password_cost.or(file_config.password_cost)
                .unwrap_or_else(default_password_cost),
            secure_cookies: env_config.secure_cookies.or(file_config.secure_cookies)
                .unwrap_or_else(default_secure_cookies),
        })
    }

    /// Minimal configuration for an in-process server, used by tests and tooling.
    pub fn for_database(database_url: &str, jwt_secret: &str) -> Self {
        ServerConfig {
            database_url: database_url.to_string(),
            jwt_secret: jwt_secret.to_string(),
            listen_addr: default_listen_addr(),
            log_dir: default_log_dir(),
            mail_relay_url: None,
            mail_from: default_mail_from(),
            admin_email: None,
            admin_password: None,
            password_cost: default_password_cost(),
            secure_cookies: default_secure_cookies(),
        }
    }
}
