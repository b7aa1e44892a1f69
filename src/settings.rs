use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelaySettings {
    #[serde(default)]
    pub application: ApplicationSettings,
    #[serde(default)]
    pub auth_server: AuthServerSettings,
    #[serde(default)]
    pub identity_store: IdentityStoreSettings,
    #[serde(default)]
    pub cookies: CookieSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthServerSettings {
    /// Base URL of the authorization server; `authorize` and `token` are
    /// resolved against it.
    pub base_url: String,
    /// Bound on each outbound call to the token endpoint
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityStoreSettings {
    pub base_url: String,
    pub branch: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieSettings {
    /// Secure attribute on both relay cookies. Only turn off for plain-HTTP
    /// local development.
    pub secure: bool,
    /// Max-Age of the verifier cookie, sized to the authorization-server
    /// round trip rather than left unbounded
    pub verifier_ttl_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5656/db/main/ext/auth".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for IdentityStoreSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5656".to_string(),
            branch: "main".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true,
            verifier_ttl_minutes: 10,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RelaySettings {
    /// Load settings from `Settings.toml` and environment variables
    ///
    /// Priority, highest to lowest: environment variables, `Settings.toml`
    /// in the current directory, built-in defaults. A `.env` file in the
    /// current directory is folded into the process environment first.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::init_logging(&settings.logging);
        Ok(settings)
    }

    /// Load base settings from `Settings.toml` or fall back to defaults
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::path::PathBuf::from("Settings.toml");
        if config_path.exists() {
            let toml_content = fs::read_to_string(&config_path)?;
            let settings = basic_toml::from_str(&toml_content)?;
            println!("✓ Loaded base settings from {}", config_path.display());
            Ok(settings)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides to settings
    fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_auth_server_env_overrides(&mut settings.auth_server);
        Self::apply_identity_store_env_overrides(&mut settings.identity_store);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
    }

    pub fn apply_auth_server_env_overrides(auth_settings: &mut AuthServerSettings) {
        if let Ok(base_url) = std::env::var("AUTH_SERVER_URL") {
            auth_settings.base_url = base_url;
        }
        Self::apply_numeric_env_override(
            "AUTH_SERVER_TIMEOUT_SECONDS",
            &mut auth_settings.timeout_seconds,
        );
    }

    pub fn apply_identity_store_env_overrides(store_settings: &mut IdentityStoreSettings) {
        if let Ok(base_url) = std::env::var("IDENTITY_STORE_URL") {
            store_settings.base_url = base_url;
        }
        if let Ok(branch) = std::env::var("IDENTITY_STORE_BRANCH") {
            store_settings.branch = branch;
        }
        Self::apply_numeric_env_override(
            "IDENTITY_STORE_TIMEOUT_SECONDS",
            &mut store_settings.timeout_seconds,
        );
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = cookie_secure;
            }
        }
        Self::apply_numeric_env_override(
            "VERIFIER_TTL_MINUTES",
            &mut cookie_settings.verifier_ttl_minutes,
        );
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Helper function to apply numeric environment variable overrides
    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Initialize the logger from the resolved logging level. Repeated
    /// initialization (tests) is ignored.
    fn init_logging(logging: &LoggingSettings) {
        let env = env_logger::Env::default().default_filter_or(&logging.level);
        let _ = env_logger::Builder::from_env(env).try_init();
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_are_local_development_values() {
        let settings = RelaySettings::default();
        assert_eq!(settings.get_bind_address(), "127.0.0.1:3000");
        assert_eq!(settings.auth_server.timeout_seconds, 10);
        assert_eq!(settings.identity_store.branch, "main");
        assert!(settings.cookies.secure);
        assert_eq!(settings.cookies.verifier_ttl_minutes, 10);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_partial_settings_file_keeps_defaults_for_missing_sections() {
        let toml = r#"
            [auth_server]
            base_url = "https://auth.example.com"
            timeout_seconds = 5
        "#;
        let settings: RelaySettings = basic_toml::from_str(toml).unwrap();
        assert_eq!(settings.auth_server.base_url, "https://auth.example.com");
        assert_eq!(settings.auth_server.timeout_seconds, 5);
        assert_eq!(settings.application.port, 3000);
        assert!(settings.cookies.secure);
    }

    #[test]
    #[serial]
    fn test_auth_server_env_overrides() {
        std::env::set_var("AUTH_SERVER_URL", "https://auth.override.example.com");
        std::env::set_var("AUTH_SERVER_TIMEOUT_SECONDS", "3");

        let mut settings = RelaySettings::default();
        RelaySettings::apply_auth_server_env_overrides(&mut settings.auth_server);

        assert_eq!(
            settings.auth_server.base_url,
            "https://auth.override.example.com"
        );
        assert_eq!(settings.auth_server.timeout_seconds, 3);

        std::env::remove_var("AUTH_SERVER_URL");
        std::env::remove_var("AUTH_SERVER_TIMEOUT_SECONDS");
    }

    #[test]
    #[serial]
    fn test_identity_store_env_overrides() {
        std::env::set_var("IDENTITY_STORE_URL", "http://store.internal:5656");
        std::env::set_var("IDENTITY_STORE_BRANCH", "staging");

        let mut settings = RelaySettings::default();
        RelaySettings::apply_identity_store_env_overrides(&mut settings.identity_store);

        assert_eq!(settings.identity_store.base_url, "http://store.internal:5656");
        assert_eq!(settings.identity_store.branch, "staging");

        std::env::remove_var("IDENTITY_STORE_URL");
        std::env::remove_var("IDENTITY_STORE_BRANCH");
    }

    #[test]
    #[serial]
    fn test_invalid_numeric_override_is_ignored() {
        std::env::set_var("AUTH_SERVER_TIMEOUT_SECONDS", "not-a-number");

        let mut settings = RelaySettings::default();
        RelaySettings::apply_auth_server_env_overrides(&mut settings.auth_server);
        assert_eq!(settings.auth_server.timeout_seconds, 10);

        std::env::remove_var("AUTH_SERVER_TIMEOUT_SECONDS");
    }
}
