//! Upload and folder manager.
//!
//! Uploads are received under a size limit and written to one or more
//! backends. Folder creation and deletion fan out to the selected backends
//! and report the outcome per backend.

pub mod service;
pub mod types;

pub use service::{UploadService, sanitize_filename};
pub use types::{FolderFailure, FolderReport, ReceivedFile, UploadRequest, UploadResult};
