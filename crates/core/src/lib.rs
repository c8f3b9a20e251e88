//! Core media logic for Galleria.
//!
//! This crate contains the storage and media logic with ZERO web framework
//! dependencies. Backend adapters, catalog building, streaming and uploads
//! live here; HTTP concerns live in `galleria-api`.
//!
//! # Modules
//!
//! - `storage` - Backend adapters over local disk, FTP and WebDAV
//! - `catalog` - Media listing, filtering and ordering
//! - `streaming` - Gallery URL resolution and byte-range streaming
//! - `upload` - Uploads and folder management
//! - `access` - Single-address access policy

pub mod access;
pub mod catalog;
pub mod storage;
pub mod streaming;
pub mod upload;
