//! Storage backend configuration types.

use std::path::PathBuf;
use std::time::Duration;

use galleria_shared::BackendsConfig;
use serde::{Deserialize, Serialize};

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Local disk directory.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// Remote FTP server.
    Ftp {
        /// Server endpoint, e.g. `ftp://host:21`.
        endpoint: String,
        /// Login user.
        user: String,
        /// Login password.
        password: String,
        /// Remote root directory.
        root: String,
    },
    /// WebDAV file-sync service such as Nextcloud.
    Webdav {
        /// Server endpoint URL.
        endpoint: String,
        /// Login user name.
        username: String,
        /// Login password or app token.
        password: String,
        /// DAV root directory.
        root: String,
    },
    /// In-process store (development and tests).
    Memory,
}

/// The transport family of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local disk.
    Local,
    /// FTP server.
    Ftp,
    /// WebDAV service.
    Webdav,
    /// In-process memory.
    Memory,
}

impl BackendKind {
    /// Whether the backend lives on this host.
    ///
    /// Local kinds skip the connection handshake and report folder
    /// conflicts strictly; remote kinds create folders best-effort and may
    /// succeed silently when the folder already exists.
    #[must_use]
    pub const fn is_local(self) -> bool {
        matches!(self, Self::Local | Self::Memory)
    }

    /// Name used in logs and API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Ftp => "ftp",
            Self::Webdav => "webdav",
            Self::Memory => "memory",
        }
    }
}

impl StorageProvider {
    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Create FTP provider.
    #[must_use]
    pub fn ftp(
        endpoint: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        root: impl Into<String>,
    ) -> Self {
        Self::Ftp {
            endpoint: endpoint.into(),
            user: user.into(),
            password: password.into(),
            root: root.into(),
        }
    }

    /// Create WebDAV provider.
    #[must_use]
    pub fn webdav(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        root: impl Into<String>,
    ) -> Self {
        Self::Webdav {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            root: root.into(),
        }
    }

    /// Create in-process memory provider.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory
    }

    /// Get the transport family.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::LocalFs { .. } => BackendKind::Local,
            Self::Ftp { .. } => BackendKind::Ftp,
            Self::Webdav { .. } => BackendKind::Webdav,
            Self::Memory => BackendKind::Memory,
        }
    }
}

/// Configuration of one backend instance.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend id, also the URL prefix of its media.
    pub id: String,
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Timeout for each backend operation.
    pub timeout: Duration,
}

impl BackendConfig {
    /// Default operation timeout: 30 seconds.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a backend config with the default timeout.
    #[must_use]
    pub fn new(id: impl Into<String>, provider: StorageProvider) -> Self {
        Self {
            id: id.into(),
            provider,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set the operation timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the backend list from application settings.
    ///
    /// Order is local, FTP, WebDAV; it is also the merge order of the catalog.
    #[must_use]
    pub fn from_settings(settings: &BackendsConfig) -> Vec<Self> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let mut configs = Vec::new();

        if let Some(local) = &settings.local {
            configs.push(Self::new(&local.id, StorageProvider::local_fs(&local.root)));
        }
        if let Some(ftp) = &settings.ftp {
            configs.push(Self::new(
                &ftp.id,
                StorageProvider::ftp(&ftp.endpoint, &ftp.user, &ftp.password, &ftp.root),
            ));
        }
        if let Some(webdav) = &settings.webdav {
            configs.push(Self::new(
                &webdav.id,
                StorageProvider::webdav(
                    &webdav.endpoint,
                    &webdav.username,
                    &webdav.password,
                    &webdav.root,
                ),
            ));
        }

        configs
            .into_iter()
            .map(|config| config.with_timeout(timeout))
            .collect()
    }
}
