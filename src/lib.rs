//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-blob`, `core-sync`,
//! `provider-google-drive`). Host applications can depend on
//! `drive-replica-workspace` and enable the documented features without
//! needing to wire each crate individually.

#[cfg(feature = "service")]
pub use core_blob as blob;
#[cfg(feature = "service")]
pub use core_service as service;
#[cfg(feature = "service")]
pub use core_sync as sync;

#[cfg(feature = "google-drive")]
pub use bridge_desktop as desktop;
#[cfg(feature = "google-drive")]
pub use provider_google_drive as google_drive;
