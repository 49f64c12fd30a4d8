use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::backend::BackendEndpoint;
use crate::error::AdminError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub backend: BackendConfig,
    pub admin: AdminConfig,
    pub server: ServerConfig,
    pub public: PublicConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub request_timeout_secs: u64,
    pub storage_bucket: String,
    pub testimonials_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub login_route: String,
    pub dashboard_route: String,
    pub require_delete_confirmation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicConfig {
    pub default_language: String,
    pub max_limit: Option<i32>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Backend overrides (SUPABASE_* kept as fallbacks for existing .env files)
        if let Some(v) = first_var(&["PORTFOLIO_BACKEND_URL", "SUPABASE_URL"]) {
            self.backend.url = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = first_var(&["PORTFOLIO_BACKEND_ANON_KEY", "SUPABASE_ANON_KEY"]) {
            self.backend.anon_key = Some(v);
        }
        if let Ok(v) = env::var("PORTFOLIO_REQUEST_TIMEOUT_SECS") {
            self.backend.request_timeout_secs = v.parse().unwrap_or(self.backend.request_timeout_secs);
        }
        if let Ok(v) = env::var("PORTFOLIO_STORAGE_BUCKET") {
            self.backend.storage_bucket = v;
        }
        if let Ok(v) = env::var("PORTFOLIO_TESTIMONIALS_PREFIX") {
            self.backend.testimonials_prefix = v.trim_matches('/').to_string();
        }

        // Admin overrides
        if let Ok(v) = env::var("ADMIN_LOGIN_ROUTE") {
            self.admin.login_route = v;
        }
        if let Ok(v) = env::var("ADMIN_DASHBOARD_ROUTE") {
            self.admin.dashboard_route = v;
        }
        if let Ok(v) = env::var("ADMIN_REQUIRE_DELETE_CONFIRMATION") {
            self.admin.require_delete_confirmation = v.parse().unwrap_or(self.admin.require_delete_confirmation);
        }

        // Server overrides
        if let Some(v) = first_var(&["PORTFOLIO_PORT", "PORT"]) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SERVER_ENABLE_CORS") {
            self.server.enable_cors = v.parse().unwrap_or(self.server.enable_cors);
        }
        if let Ok(v) = env::var("SERVER_CORS_ORIGINS") {
            self.server.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Public content overrides
        if let Ok(v) = env::var("PUBLIC_DEFAULT_LANGUAGE") {
            self.public.default_language = v;
        }
        if let Ok(v) = env::var("PUBLIC_MAX_LIMIT") {
            self.public.max_limit = v.parse().ok();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            backend: BackendConfig {
                url: None,
                anon_key: None,
                request_timeout_secs: 30,
                storage_bucket: "Recognition".to_string(),
                testimonials_prefix: "Testimonials".to_string(),
            },
            admin: AdminConfig {
                login_route: "/admin/login".to_string(),
                dashboard_route: "/admin/dashboard".to_string(),
                require_delete_confirmation: true,
            },
            server: ServerConfig {
                port: 3000,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            public: PublicConfig {
                default_language: "en".to_string(),
                max_limit: Some(1000),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            backend: BackendConfig {
                request_timeout_secs: 15,
                ..Self::development().backend
            },
            server: ServerConfig {
                port: 3000,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            public: PublicConfig {
                default_language: "en".to_string(),
                max_limit: Some(500),
            },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            backend: BackendConfig {
                request_timeout_secs: 10,
                ..Self::development().backend
            },
            server: ServerConfig {
                port: 3000,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            public: PublicConfig {
                default_language: "en".to_string(),
                max_limit: Some(100),
            },
            ..Self::development()
        }
    }

    /// Backend location and key, failing when either is missing.
    pub fn backend_endpoint(&self) -> Result<BackendEndpoint, AdminError> {
        let url = self.backend.url.clone().ok_or_else(|| {
            AdminError::config("Missing required environment variable: PORTFOLIO_BACKEND_URL (or SUPABASE_URL)")
        })?;
        let anon_key = self.backend.anon_key.clone().ok_or_else(|| {
            AdminError::config("Missing required environment variable: PORTFOLIO_BACKEND_ANON_KEY (or SUPABASE_ANON_KEY)")
        })?;
        BackendEndpoint::parse(&url, anon_key)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs)
    }
}

fn first_var(keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| env::var(key).ok())
        .filter(|v| !v.trim().is_empty())
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.admin.login_route, "/admin/login");
        assert_eq!(config.public.max_limit, Some(1000));
        assert_eq!(config.backend.storage_bucket, "Recognition");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.public.max_limit, Some(100));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.admin.require_delete_confirmation);
    }

    #[test]
    fn test_missing_backend_is_config_error() {
        let config = AppConfig::development();
        let err = config.backend_endpoint().unwrap_err();
        assert!(matches!(err, AdminError::Config(_)));
        assert!(err.to_string().contains("PORTFOLIO_BACKEND_URL"));
    }

    #[test]
    fn test_backend_endpoint_when_configured() {
        let mut config = AppConfig::development();
        config.backend.url = Some("https://example.supabase.co".to_string());
        config.backend.anon_key = Some("anon".to_string());
        let endpoint = config.backend_endpoint().unwrap();
        assert_eq!(endpoint.rest_url("awards"), "https://example.supabase.co/rest/v1/awards");
    }
}
