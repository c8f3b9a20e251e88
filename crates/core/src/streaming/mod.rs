//! Streaming gateway.
//!
//! Turns a gallery URL into a backend byte stream, with single byte-range
//! support for seeking in videos.

pub mod gateway;

pub use gateway::{DEFAULT_CONTENT_TYPE, MediaStream, StreamStatus, StreamingGateway, content_type};
