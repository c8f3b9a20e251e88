//! Shared errors and configuration for Galleria.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;

pub use config::{
    AccessConfig, AppConfig, BackendsConfig, CacheConfig, FtpBackendConfig, LocalBackendConfig,
    ServerConfig, UploadConfig, WebdavBackendConfig,
};
pub use error::{AppError, AppResult};
