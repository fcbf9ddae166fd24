use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Mount prefix stripped from request paths before route matching.
    /// Empty when the app is served from the domain root.
    pub base_path: String,
    pub max_request_size_bytes: usize,
    /// On-disk directory whose templates override the built-in ones.
    pub template_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub throttle_limit: u32,
    pub throttle_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub max_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("SERVER_PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SERVER_BASE_PATH") {
            self.server.base_path = v;
        }
        if let Ok(v) = env::var("SERVER_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes =
                v.parse().unwrap_or(self.server.max_request_size_bytes);
        }
        if let Ok(v) = env::var("SERVER_TEMPLATE_DIR") {
            self.server.template_dir = v;
        }

        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs =
                v.parse().unwrap_or(self.database.connect_timeout_secs);
        }

        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.session.cookie_name = v;
        }
        if let Ok(v) = env::var("SESSION_TTL_SECS") {
            self.session.ttl_secs = v.parse().unwrap_or(self.session.ttl_secs);
        }

        if let Ok(v) = env::var("SECURITY_THROTTLE_LIMIT") {
            self.security.throttle_limit = v.parse().unwrap_or(self.security.throttle_limit);
        }
        if let Ok(v) = env::var("SECURITY_THROTTLE_WINDOW_SECS") {
            self.security.throttle_window_secs =
                v.parse().unwrap_or(self.security.throttle_window_secs);
        }

        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.uploads.dir = v;
        }
        if let Ok(v) = env::var("UPLOAD_MAX_SIZE_BYTES") {
            self.uploads.max_size_bytes = v.parse().unwrap_or(self.uploads.max_size_bytes);
        }
        if let Ok(v) = env::var("UPLOAD_ALLOWED_EXTENSIONS") {
            self.uploads.allowed_extensions =
                v.split(',').map(|s| s.trim().to_lowercase()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                base_path: String::new(),
                max_request_size_bytes: 1024 * 1024, // 1MB of form data
                template_dir: "templates".to_string(),
            },
            database: DatabaseConfig {
                max_connections: 10,
                connect_timeout_secs: 30,
            },
            session: SessionConfig {
                cookie_name: "storefront_session".to_string(),
                ttl_secs: 60 * 60 * 24, // 1 day
            },
            security: SecurityConfig {
                throttle_limit: 100,
                throttle_window_secs: 60,
            },
            uploads: UploadConfig {
                dir: "uploads/products".to_string(),
                max_size_bytes: 5 * 1024 * 1024,
                allowed_extensions: vec![
                    "jpg".to_string(),
                    "jpeg".to_string(),
                    "png".to_string(),
                    "webp".to_string(),
                ],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                base_path: String::new(),
                max_request_size_bytes: 512 * 1024,
                template_dir: "templates".to_string(),
            },
            database: DatabaseConfig {
                max_connections: 50,
                connect_timeout_secs: 5,
            },
            session: SessionConfig {
                cookie_name: "storefront_session".to_string(),
                ttl_secs: 60 * 60 * 4,
            },
            security: SecurityConfig {
                throttle_limit: 30,
                throttle_window_secs: 60,
            },
            uploads: UploadConfig {
                dir: "uploads/products".to_string(),
                max_size_bytes: 2 * 1024 * 1024,
                allowed_extensions: vec![
                    "jpg".to_string(),
                    "jpeg".to_string(),
                    "png".to_string(),
                    "webp".to_string(),
                ],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert!(config.is_development());
        assert_eq!(config.security.throttle_limit, 100);
        assert!(config.server.base_path.is_empty());
        assert_eq!(config.server.template_dir, "templates");
    }

    #[test]
    fn production_tightens_limits() {
        let config = AppConfig::production();
        assert!(!config.is_development());
        assert!(config.security.throttle_limit < AppConfig::development().security.throttle_limit);
        assert!(config.session.ttl_secs < AppConfig::development().session.ttl_secs);
    }
}
