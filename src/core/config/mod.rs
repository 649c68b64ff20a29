use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "bankstats.toml";
pub const ENV_PREFIX: &str = "BANKSTATS_";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub database: DatabaseConfig,
    pub auth: AuthSettings,
    pub upload: UploadConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Signing secret for session tokens; a random one is generated per process when unset.
    pub jwt_secret: Option<String>,
    pub session_hours: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database_url: "postgres://localhost/bankstats".to_string(),
            database: DatabaseConfig { max_connections: 10 },
            auth: AuthSettings {
                jwt_secret: None,
                session_hours: 24,
            },
            upload: UploadConfig {
                max_bytes: 10 * 1024 * 1024,
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then `bankstats.toml` in the working directory, then the environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.auth.session_hours, 24);
        assert_eq!(config.upload.max_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bankstats.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nhost = \"127.0.0.1\"\nport = 9100\n\n[auth]\nsession_hours = 8\n"
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9100");
        assert_eq!(config.auth.session_hours, 8);
        assert_eq!(config.database.max_connections, 10);
    }
}
