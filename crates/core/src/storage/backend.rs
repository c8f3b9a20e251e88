//! Backend adapters implemented with Apache OpenDAL.

use bytes::Bytes;
use futures::Stream;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use opendal::layers::TimeoutLayer;
use opendal::{Operator, services};
use tracing::{debug, warn};

use super::config::{BackendConfig, BackendKind, StorageProvider};
use super::error::StorageError;
use super::path;
use super::range::ByteRange;

/// A stream of file content. Owns its backend session.
pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// Size and modification time of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Content length in bytes.
    pub size: u64,
    /// Backend-reported modification time, unparsed.
    pub modified: Option<String>,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl EntryMeta {
    fn from_opendal(meta: &opendal::Metadata) -> Self {
        Self {
            size: meta.content_length(),
            modified: meta.last_modified().map(|ts| ts.to_string()),
            is_dir: meta.is_dir(),
        }
    }
}

/// One directory entry as returned by a backend listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Final path component, without trailing `/`.
    pub name: String,
    /// Path relative to the backend root (directories end with `/`).
    pub path: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Metadata, when the listing already carried a modification time.
    pub meta: Option<EntryMeta>,
}

/// One configured storage backend.
///
/// Holds immutable configuration only. Every operation batch goes through
/// [`Backend::connect`], which hands out a session scoped to the caller.
#[derive(Debug)]
pub struct Backend {
    config: BackendConfig,
    /// Operator reused by in-process stores, whose content lives in it.
    shared: Option<Operator>,
}

impl Backend {
    /// Create a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: BackendConfig) -> Result<Self, StorageError> {
        let operator = create_operator(&config)?;
        let shared = config.provider.kind().is_local().then_some(operator);
        Ok(Self { config, shared })
    }

    /// Backend id, also the URL prefix of its media.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Transport family.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.config.provider.kind()
    }

    /// Open a session.
    ///
    /// Remote backends get a fresh operator and a handshake; sessions are
    /// never pooled across requests. The session is released when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the backend is unreachable or
    /// rejects the credentials.
    pub async fn connect(&self) -> Result<BackendSession, StorageError> {
        let operator = match &self.shared {
            Some(operator) => operator.clone(),
            None => {
                let operator = create_operator(&self.config)?;
                operator
                    .check()
                    .await
                    .map_err(|e| StorageError::connection(self.id(), e))?;
                operator
            }
        };

        debug!(backend = %self.id(), kind = self.kind().as_str(), "Backend session opened");

        Ok(BackendSession {
            backend: self.id().to_string(),
            kind: self.kind(),
            operator,
        })
    }
}

/// Create OpenDAL operator from provider config.
fn create_operator(config: &BackendConfig) -> Result<Operator, StorageError> {
    let timeout = TimeoutLayer::new()
        .with_timeout(config.timeout)
        .with_io_timeout(config.timeout);

    let operator = match &config.provider {
        StorageProvider::LocalFs { root } => {
            let builder = services::Fs::default().root(
                root.to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?,
            );
            Operator::new(builder)
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .layer(timeout)
                .finish()
        }
        StorageProvider::Ftp {
            endpoint,
            user,
            password,
            root,
        } => {
            let builder = services::Ftp::default()
                .endpoint(endpoint)
                .user(user)
                .password(password)
                .root(root);
            Operator::new(builder)
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .layer(timeout)
                .finish()
        }
        StorageProvider::Webdav {
            endpoint,
            username,
            password,
            root,
        } => {
            let builder = services::Webdav::default()
                .endpoint(endpoint)
                .username(username)
                .password(password)
                .root(root);
            Operator::new(builder)
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .layer(timeout)
                .finish()
        }
        StorageProvider::Memory => Operator::new(services::Memory::default())
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .layer(timeout)
            .finish(),
    };

    Ok(operator)
}

/// A connected backend session exposing the uniform capability set.
pub struct BackendSession {
    backend: String,
    kind: BackendKind,
    operator: Operator,
}

impl BackendSession {
    /// Backend id of this session.
    #[must_use]
    pub fn backend_id(&self) -> &str {
        &self.backend
    }

    fn map_err(&self, path: &str, err: &opendal::Error) -> StorageError {
        StorageError::from_opendal(&self.backend, path, err)
    }

    /// List the entries of a directory, in backend order.
    ///
    /// The directory itself is not part of the result.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if a non-root directory is missing.
    pub async fn list(&self, dir: &str) -> Result<Vec<RawEntry>, StorageError> {
        let dir = path::dir_path(dir)?;
        if !path::is_root(&dir) && !self.stat(&dir).await?.is_dir {
            return Err(StorageError::not_found(dir));
        }

        let entries = self
            .operator
            .list(&dir)
            .await
            .map_err(|e| self.map_err(&dir, &e))?;

        let listed = dir.trim_matches('/');
        Ok(entries
            .into_iter()
            .filter(|entry| entry.path().trim_matches('/') != listed)
            .map(|entry| {
                let meta = entry.metadata();
                RawEntry {
                    name: path::file_name(entry.path()).to_string(),
                    path: entry.path().to_string(),
                    is_dir: meta.is_dir(),
                    meta: meta
                        .last_modified()
                        .is_some()
                        .then(|| EntryMeta::from_opendal(meta)),
                }
            })
            .collect())
    }

    /// Size and modification time of one entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the entry is missing.
    pub async fn stat(&self, path: &str) -> Result<EntryMeta, StorageError> {
        let meta = self
            .operator
            .stat(path)
            .await
            .map_err(|e| self.map_err(path, &e))?;
        Ok(EntryMeta::from_opendal(&meta))
    }

    /// Whether an entry exists.
    pub async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Open a byte stream over a file, optionally limited to `range`.
    ///
    /// Consumes the session: the returned stream owns it and releases it
    /// when dropped. The first chunk is read before returning so a missing
    /// file fails here. Later transport failures surface as stream errors.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the file is missing.
    pub async fn open_read_stream(
        self,
        path: &str,
        range: Option<ByteRange>,
    ) -> Result<ByteStream, StorageError> {
        let path = path::file_path(path)?;
        let reader = self
            .operator
            .reader(&path)
            .await
            .map_err(|e| self.map_err(&path, &e))?;

        let reads = match range {
            Some(range) => reader.into_bytes_stream(range.start..=range.end).await,
            None => reader.into_bytes_stream(..).await,
        }
        .map_err(|e| self.map_err(&path, &e))?;

        let session = self;
        let mut body = reads
            .map_err(move |e| StorageError::from_io(&session.backend, &path, &e))
            .boxed();

        match body.try_next().await? {
            Some(first) => Ok(stream::once(async move { Ok(first) }).chain(body).boxed()),
            None => Ok(stream::empty().boxed()),
        }
    }

    /// Write `chunks` to `path`, replacing any existing file.
    ///
    /// Parent directories are created first. A failing chunk aborts the
    /// write.
    pub async fn write<S>(&self, path: &str, mut chunks: S) -> Result<(), StorageError>
    where
        S: Stream<Item = Result<Bytes, StorageError>> + Unpin,
    {
        let path = path::file_path(path)?;
        if let Some(parent) = path::parent_dir(&path) {
            self.operator
                .create_dir(&parent)
                .await
                .map_err(|e| self.map_err(&parent, &e))?;
        }

        let mut writer = self
            .operator
            .writer(&path)
            .await
            .map_err(|e| self.map_err(&path, &e))?;

        while let Some(chunk) = chunks.next().await {
            let written = match chunk {
                Ok(chunk) => writer.write(chunk).await.map_err(|e| self.map_err(&path, &e)),
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                if let Err(abort_err) = writer.abort().await {
                    warn!(backend = %self.backend, path = %path, error = %abort_err, "Failed to abort write");
                }
                return Err(e);
            }
        }

        writer.close().await.map_err(|e| self.map_err(&path, &e))?;
        Ok(())
    }

    /// Create a directory.
    ///
    /// Local kinds fail with [`StorageError::AlreadyExists`] when the target
    /// exists. Remote kinds issue the create and may succeed silently.
    pub async fn make_directory(&self, dir: &str) -> Result<(), StorageError> {
        let dir = path::dir_path(dir)?;
        if path::is_root(&dir) {
            return Err(StorageError::invalid_path(dir));
        }
        if self.kind.is_local() && self.exists(&dir).await? {
            return Err(StorageError::already_exists(dir));
        }

        self.operator
            .create_dir(&dir)
            .await
            .map_err(|e| self.map_err(&dir, &e))
    }

    /// Remove a directory, with its content when `recursive`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the directory is missing.
    #[allow(deprecated)]
    pub async fn remove_directory(&self, dir: &str, recursive: bool) -> Result<(), StorageError> {
        let dir = path::dir_path(dir)?;
        if path::is_root(&dir) {
            return Err(StorageError::invalid_path(dir));
        }
        if !self.exists(&dir).await? {
            return Err(StorageError::not_found(dir));
        }

        let result = if recursive {
            self.operator.remove_all(&dir).await
        } else {
            self.operator.delete(&dir).await
        };
        result.map_err(|e| self.map_err(&dir, &e))
    }
}

impl Drop for BackendSession {
    fn drop(&mut self) {
        debug!(backend = %self.backend, "Backend session released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn memory_backend() -> Backend {
        Backend::from_config(BackendConfig::new("mem", StorageProvider::memory()))
            .expect("memory backend")
    }

    fn body(parts: &[&'static [u8]]) -> ByteStream {
        stream::iter(parts.iter().map(|p| Ok(Bytes::from_static(*p))).collect::<Vec<_>>()).boxed()
    }

    async fn collect(stream: ByteStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.expect("stream ok");
        chunks.concat()
    }

    #[tokio::test]
    async fn test_write_then_list_and_stat() {
        let backend = memory_backend();
        let session = backend.connect().await.expect("connect");

        session
            .write("Holiday/beach.jpg", body(&[b"abc", b"de"]))
            .await
            .expect("write");

        let meta = session.stat("Holiday/beach.jpg").await.expect("stat");
        assert_eq!(meta.size, 5);
        assert!(!meta.is_dir);

        let root = session.list("").await.expect("list root");
        assert!(root.iter().any(|e| e.is_dir && e.name == "Holiday"));

        let entries = session.list("Holiday").await.expect("list dir");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "beach.jpg");
        assert_eq!(entries[0].path, "Holiday/beach.jpg");
    }

    #[tokio::test]
    async fn test_failed_chunk_aborts_write() {
        let backend = memory_backend();
        let session = backend.connect().await.expect("connect");

        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Err(StorageError::validation("client went away")),
        ])
        .boxed();
        let err = session.write("clip.mp4", chunks).await.unwrap_err();

        assert!(matches!(err, StorageError::Validation(_)));
        assert!(!session.exists("clip.mp4").await.expect("stat"));
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let backend = Backend::from_config(BackendConfig::new(
            "local",
            StorageProvider::local_fs(root.path()),
        ))
        .expect("local backend");
        let session = backend.connect().await.expect("connect");
        let err = session.list("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_open_read_stream_with_range() {
        let backend = memory_backend();
        let session = backend.connect().await.expect("connect");
        let data: Vec<u8> = (0..=255).collect();
        session
            .write("clip.mp4", stream::iter(vec![Ok(Bytes::from(data.clone()))]).boxed())
            .await
            .expect("write");

        let full = session
            .open_read_stream("clip.mp4", None)
            .await
            .expect("open");
        assert_eq!(collect(full).await, data);

        let session = backend.connect().await.expect("connect");
        let partial = session
            .open_read_stream("clip.mp4", Some(ByteRange { start: 10, end: 19 }))
            .await
            .expect("open range");
        assert_eq!(collect(partial).await, data[10..20].to_vec());
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let backend = memory_backend();
        let session = backend.connect().await.expect("connect");
        let result = session.open_read_stream("missing.jpg", None).await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_open_empty_file() {
        let backend = memory_backend();
        let session = backend.connect().await.expect("connect");
        session.write("empty.jpg", body(&[])).await.expect("write");

        let stream = session
            .open_read_stream("empty.jpg", None)
            .await
            .expect("open");
        assert!(collect(stream).await.is_empty());
    }

    #[tokio::test]
    async fn test_local_make_directory_conflict() {
        let root = tempfile::tempdir().expect("tempdir");
        let backend = Backend::from_config(BackendConfig::new(
            "local",
            StorageProvider::local_fs(root.path()),
        ))
        .expect("local backend");
        let session = backend.connect().await.expect("connect");

        session.make_directory("Trips").await.expect("first create");
        let err = session.make_directory("Trips").await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_remove_directory_recursive() {
        let root = tempfile::tempdir().expect("tempdir");
        let backend = Backend::from_config(BackendConfig::new(
            "local",
            StorageProvider::local_fs(root.path()),
        ))
        .expect("local backend");
        let session = backend.connect().await.expect("connect");

        session
            .write("Trips/2024/a.jpg", body(&[b"x"]))
            .await
            .expect("write");
        session
            .remove_directory("Trips", true)
            .await
            .expect("remove");
        assert!(!root.path().join("Trips").exists());

        let err = session.remove_directory("Trips", true).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_root_directory_is_protected() {
        let backend = memory_backend();
        let session = backend.connect().await.expect("connect");
        assert!(matches!(
            session.make_directory("/").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            session.remove_directory("", true).await,
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_ftp_fails_to_connect() {
        let config = BackendConfig::new(
            "media",
            StorageProvider::ftp("ftp://127.0.0.1:1", "user", "pass", "/"),
        )
        .with_timeout(Duration::from_secs(2));
        let backend = Backend::from_config(config).expect("ftp backend builds");
        let err = backend.connect().await.err().expect("connect should fail");
        assert!(matches!(err, StorageError::Connection { .. }));
    }
}
