//! Application configuration management.

use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;

/// Application configuration.
///
/// Built once at startup and shared read-only with every component.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Access policy for mutating routes.
    #[serde(default)]
    pub access: AccessConfig,
    /// Upload limits and defaults.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Directory listing cache.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Storage backends.
    #[serde(default)]
    pub backends: BackendsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Access policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// The single client address allowed to upload and manage folders.
    ///
    /// When unset every mutating request is denied.
    #[serde(default)]
    pub allowed_address: Option<String>,
    /// Resolve the caller from `X-Forwarded-For` (reverse proxy deployments).
    ///
    /// Only honored for requests whose socket peer is in `trusted_proxies`.
    #[serde(default)]
    pub trust_forwarded_header: bool,
    /// Proxy addresses whose `X-Forwarded-For` entries are believed.
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allowed_address: None,
            trust_forwarded_header: false,
            trusted_proxies: Vec::new(),
        }
    }
}

/// Upload configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Backend ids written to when the client does not pick one.
    ///
    /// Empty means every configured backend.
    #[serde(default)]
    pub default_destinations: Vec<String>,
    /// Directory holding uploads while they are received.
    ///
    /// The system temporary directory when unset.
    #[serde(default)]
    pub spool_dir: Option<String>,
}

impl UploadConfig {
    /// Default max file size: 700MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 700 * 1024 * 1024;
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            default_destinations: Vec::new(),
            spool_dir: None,
        }
    }
}

fn default_max_file_size() -> u64 {
    UploadConfig::DEFAULT_MAX_FILE_SIZE
}

/// Listing cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for cached listings. Zero disables caching.
    #[serde(default)]
    pub ttl_secs: u64,
    /// Maximum number of cached (backend, folder) listings.
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 0,
            max_capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> u64 {
    256
}

/// Storage backend configuration. Each section is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendsConfig {
    /// Timeout applied to every backend operation, in seconds.
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
    /// Local disk directory.
    #[serde(default)]
    pub local: Option<LocalBackendConfig>,
    /// Remote FTP server.
    #[serde(default)]
    pub ftp: Option<FtpBackendConfig>,
    /// WebDAV file-sync service (Nextcloud).
    #[serde(default)]
    pub webdav: Option<WebdavBackendConfig>,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_backend_timeout(),
            local: None,
            ftp: None,
            webdav: None,
        }
    }
}

fn default_backend_timeout() -> u64 {
    30
}

/// Local disk backend.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalBackendConfig {
    /// Backend id, also the URL prefix of its media.
    #[serde(default = "default_local_id")]
    pub id: String,
    /// Directory holding the media files.
    pub root: String,
}

fn default_local_id() -> String {
    "local".to_string()
}

/// FTP backend.
#[derive(Debug, Clone, Deserialize)]
pub struct FtpBackendConfig {
    /// Backend id, also the URL prefix of its media.
    #[serde(default = "default_ftp_id")]
    pub id: String,
    /// Server endpoint, e.g. `ftp://192.168.1.20:21`.
    pub endpoint: String,
    /// Login user.
    #[serde(default)]
    pub user: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Remote directory holding the media files.
    #[serde(default = "default_remote_root")]
    pub root: String,
}

fn default_ftp_id() -> String {
    "media".to_string()
}

/// WebDAV backend.
#[derive(Debug, Clone, Deserialize)]
pub struct WebdavBackendConfig {
    /// Backend id, also the URL prefix of its media.
    #[serde(default = "default_webdav_id")]
    pub id: String,
    /// Server endpoint, e.g. `https://cloud.example.com`.
    pub endpoint: String,
    /// Login user name.
    #[serde(default)]
    pub username: String,
    /// Login password or app token.
    #[serde(default)]
    pub password: String,
    /// DAV directory holding the media files,
    /// e.g. `/remote.php/dav/files/alice/Photos`.
    #[serde(default = "default_remote_root")]
    pub root: String,
}

fn default_webdav_id() -> String {
    "nextcloud".to_string()
}

fn default_remote_root() -> String {
    "/".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("GALLERIA")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("upload.default_destinations")
                    .with_list_parse_key("access.trusted_proxies"),
            );

        Self::from_builder(builder)
    }

    /// Builds the configuration from an already assembled set of sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the sources cannot be merged or deserialized.
    pub fn from_builder(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn load_toml(toml: &str) -> AppConfig {
        AppConfig::from_builder(
            config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
        .expect("config should load")
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = load_toml("");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.access.allowed_address.is_none());
        assert!(!config.access.trust_forwarded_header);
        assert!(config.access.trusted_proxies.is_empty());
        assert_eq!(config.upload.max_file_size, 700 * 1024 * 1024);
        assert!(config.upload.spool_dir.is_none());
        assert_eq!(config.cache.ttl_secs, 0);
        assert_eq!(config.backends.timeout_secs, 30);
        assert!(config.backends.local.is_none());
    }

    #[test]
    fn test_backend_sections() {
        let config = load_toml(
            r#"
            [access]
            allowed_address = "192.168.1.50"
            trust_forwarded_header = true
            trusted_proxies = ["172.17.0.1"]

            [backends.local]
            root = "/srv/media"

            [backends.ftp]
            endpoint = "ftp://192.168.1.20:21"
            user = "gallery"
            password = "secret"
            root = "/uploads"

            [backends.webdav]
            id = "cloud"
            endpoint = "https://cloud.example.com"
            username = "alice"
            password = "token"
            root = "/remote.php/dav/files/alice/Photos"
            "#,
        );

        assert_eq!(config.access.allowed_address.as_deref(), Some("192.168.1.50"));
        assert!(config.access.trust_forwarded_header);
        assert_eq!(config.access.trusted_proxies, vec!["172.17.0.1".to_string()]);

        let local = config.backends.local.expect("local backend");
        assert_eq!(local.id, "local");
        assert_eq!(local.root, "/srv/media");

        let ftp = config.backends.ftp.expect("ftp backend");
        assert_eq!(ftp.id, "media");
        assert_eq!(ftp.root, "/uploads");

        let webdav = config.backends.webdav.expect("webdav backend");
        assert_eq!(webdav.id, "cloud");
        assert_eq!(webdav.username, "alice");
    }

    #[test]
    fn test_upload_overrides() {
        let config = load_toml(
            r#"
            [upload]
            max_file_size = 1024
            default_destinations = ["local", "nextcloud"]
            "#,
        );
        assert_eq!(config.upload.max_file_size, 1024);
        assert_eq!(config.upload.default_destinations, vec!["local", "nextcloud"]);
    }
}
