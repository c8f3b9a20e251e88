//! Backend adapters over Apache OpenDAL.
//!
//! One uniform capability set over every storage system the gallery reads:
//! - Local disk directory
//! - Remote FTP server
//! - WebDAV file-sync service (Nextcloud)
//! - In-process memory (development and tests)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ Backend::connect()  ->  BackendSession (dropped = released)     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ list(dir)                 │ open_read_stream(path, range)       │
//! │ stat(path)                │ write(path, chunks)                 │
//! │ make_directory(dir)       │ remove_directory(dir, recursive)    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │            Apache OpenDAL: fs / ftp / webdav / memory           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod config;
mod error;
pub mod path;
mod range;
mod registry;

pub use backend::{Backend, BackendSession, ByteStream, EntryMeta, RawEntry};
pub use config::{BackendConfig, BackendKind, StorageProvider};
pub use error::StorageError;
pub use range::ByteRange;
pub use registry::{ALL_BACKENDS, BackendRegistry};
