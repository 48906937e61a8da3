//! # AudioBookShelf Provider
//!
//! Implements the `BookService` trait against the backend that brokers
//! access to an AudioBookShelf server.
//!
//! ## Overview
//!
//! This module provides:
//! - Book detail lookup, decoding raw ABS library items into `BookDetail`
//! - Progress reports (`PATCH .../progress`)
//! - Stream, cover and ebook URL construction
//! - Mapping of backend status codes to typed errors

pub mod connector;
pub mod error;
pub mod types;

pub use connector::AbsBookService;
pub use error::{AbsError, Result};
