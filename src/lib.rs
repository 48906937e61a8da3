//! Workspace placeholder crate.
//!
//! Re-exports the player façade so host applications can depend on
//! `fumiki-workspace` and pick features (`desktop-shims`, `playback`) instead
//! of wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;

#[cfg(all(feature = "playback", not(feature = "desktop-shims")))]
pub use core_playback::*;
