//! # Core Runtime Module
//!
//! Foundational infrastructure shared by the player crates:
//! - Logging and tracing setup
//! - Configuration with fail-fast validation
//! - The domain event bus
//!
//! ## Overview
//!
//! Nothing here knows about playback rules. The playback session and the
//! service façade build on these pieces to log, configure and publish events
//! the same way.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
