//! Gallery URL resolution and media streaming.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::MediaKind;
use crate::storage::{Backend, BackendRegistry, ByteRange, ByteStream, StorageError, path};

/// Content type used when the extension maps to nothing known.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Whether the stream covers the whole file or one byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// Entire file (HTTP 200).
    Full,
    /// One inclusive byte range (HTTP 206).
    Partial(ByteRange),
}

/// An opened media stream and the headers describing it.
pub struct MediaStream {
    /// Full or partial content.
    pub status: StreamStatus,
    /// Size of the whole file in bytes.
    pub total_size: u64,
    /// MIME type guessed from the file extension.
    pub content_type: String,
    /// File content. Holds the backend session until dropped.
    pub body: ByteStream,
}

impl MediaStream {
    /// Number of bytes the body yields.
    #[must_use]
    pub const fn content_length(&self) -> u64 {
        match self.status {
            StreamStatus::Full => self.total_size,
            StreamStatus::Partial(range) => range.byte_count(),
        }
    }

    /// `Content-Range` header value for partial content.
    #[must_use]
    pub fn content_range(&self) -> Option<String> {
        match self.status {
            StreamStatus::Full => None,
            StreamStatus::Partial(range) => Some(format!(
                "bytes {}-{}/{}",
                range.start, range.end, self.total_size
            )),
        }
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("status", &self.status)
            .field("total_size", &self.total_size)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Maps gallery URLs to backend files and streams them.
#[derive(Clone)]
pub struct StreamingGateway {
    registry: Arc<BackendRegistry>,
}

impl StreamingGateway {
    /// Create a gateway over the configured backends.
    #[must_use]
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve the backend id and decoded path of a gallery URL.
    ///
    /// Only files the catalog would list are served: unknown backends,
    /// unsafe paths and non-media files are all reported as missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`].
    pub fn resolve(
        &self,
        backend_id: &str,
        raw_path: &str,
    ) -> Result<(Arc<Backend>, String), StorageError> {
        let not_found = || StorageError::not_found(format!("{backend_id}/{raw_path}"));

        let backend = self.registry.get(backend_id).ok_or_else(not_found)?;
        let path = path::file_path(raw_path).map_err(|_| not_found())?;
        if MediaKind::from_filename(path::file_name(&path)).is_none() {
            return Err(not_found());
        }
        Ok((backend, path))
    }

    /// Open `path` on `backend`, honouring an optional `Range` header.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if the file is missing
    /// - [`StorageError::RangeNotSatisfiable`] if the range does not fit
    /// - [`StorageError::Connection`] if the backend is unreachable
    pub async fn open(
        &self,
        backend: &Backend,
        path: &str,
        range_header: Option<&str>,
    ) -> Result<MediaStream, StorageError> {
        let session = backend.connect().await?;

        let meta = session.stat(path).await?;
        if meta.is_dir {
            return Err(StorageError::not_found(path));
        }
        let total_size = meta.size;

        let status = match range_header {
            Some(header) => StreamStatus::Partial(ByteRange::parse(header, total_size)?),
            None => StreamStatus::Full,
        };
        let range = match status {
            StreamStatus::Full => None,
            StreamStatus::Partial(range) => Some(range),
        };

        let body = session.open_read_stream(path, range).await?;
        debug!(
            backend = %backend.id(),
            path = %path,
            size = total_size,
            range = ?range,
            "Streaming media"
        );

        Ok(MediaStream {
            status,
            total_size,
            content_type: content_type(path),
            body,
        })
    }

    /// Resolve a gallery URL and open it.
    ///
    /// # Errors
    ///
    /// See [`StreamingGateway::resolve`] and [`StreamingGateway::open`].
    pub async fn stream(
        &self,
        backend_id: &str,
        raw_path: &str,
        range_header: Option<&str>,
    ) -> Result<MediaStream, StorageError> {
        let (backend, path) = self.resolve(backend_id, raw_path)?;
        self.open(&backend, &path, range_header).await
    }
}

/// MIME type of a file, from its extension.
#[must_use]
pub fn content_type(path: &str) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BackendConfig, StorageProvider};
    use bytes::Bytes;
    use futures::TryStreamExt;
    use rstest::rstest;

    async fn gateway_with(files: &[(&str, usize)]) -> StreamingGateway {
        let registry = Arc::new(
            BackendRegistry::from_configs(vec![BackendConfig::new(
                "local",
                StorageProvider::memory(),
            )])
            .unwrap(),
        );
        let session = registry.get("local").unwrap().connect().await.unwrap();
        for (path, len) in files {
            let data: Vec<u8> = (0..*len).map(|i| (i % 251) as u8).collect();
            session
                .write(path, futures::stream::iter([Ok(Bytes::from(data))]))
                .await
                .unwrap();
        }
        StreamingGateway::new(registry)
    }

    async fn body(stream: MediaStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.body.try_collect().await.unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn test_range_request_is_partial() {
        let gateway = gateway_with(&[("clip.mp4", 1000)]).await;

        let stream = gateway
            .stream("local", "clip.mp4", Some("bytes=0-99"))
            .await
            .expect("stream");

        assert_eq!(stream.status, StreamStatus::Partial(ByteRange { start: 0, end: 99 }));
        assert_eq!(stream.total_size, 1000);
        assert_eq!(stream.content_length(), 100);
        assert_eq!(stream.content_range().as_deref(), Some("bytes 0-99/1000"));
        assert_eq!(stream.content_type, "video/mp4");

        let data = body(stream).await;
        assert_eq!(data.len(), 100);
        assert_eq!(data[99], 99);
    }

    #[tokio::test]
    async fn test_full_request() {
        let gateway = gateway_with(&[("Holiday/beach.jpg", 300)]).await;

        let stream = gateway
            .stream("local", "Holiday/beach.jpg", None)
            .await
            .expect("stream");

        assert_eq!(stream.status, StreamStatus::Full);
        assert_eq!(stream.content_length(), 300);
        assert!(stream.content_range().is_none());
        assert_eq!(stream.content_type, "image/jpeg");
        assert_eq!(body(stream).await.len(), 300);
    }

    #[tokio::test]
    async fn test_range_beyond_file_is_unsatisfiable() {
        let gateway = gateway_with(&[("clip.mp4", 500)]).await;

        let err = gateway
            .stream("local", "clip.mp4", Some("bytes=900-999"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::RangeNotSatisfiable { size: 500 }));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let gateway = gateway_with(&[]).await;
        let err = gateway.stream("local", "gone.jpg", None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[rstest]
    #[case("s3", "beach.jpg")]
    #[case("local", "../beach.jpg")]
    #[case("local", "notes.txt")]
    #[case("local", "")]
    fn test_resolve_rejects(#[case] backend: &str, #[case] raw_path: &str) {
        let gateway = StreamingGateway::new(Arc::new(
            BackendRegistry::from_configs(vec![BackendConfig::new(
                "local",
                StorageProvider::memory(),
            )])
            .unwrap(),
        ));
        let err = gateway.resolve(backend, raw_path).unwrap_err();
        assert!(err.is_not_found());
    }

    #[rstest]
    #[case("a.png", "image/png")]
    #[case("a.WEBP", "image/webp")]
    #[case("a.mov", "video/quicktime")]
    #[case("a.unknownext", DEFAULT_CONTENT_TYPE)]
    fn test_content_type(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(content_type(path), expected);
    }
}
