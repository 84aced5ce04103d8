//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the drive replica:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! Every other core crate relies on the conventions established here: a
//! validated [`ReplicaConfig`](config::ReplicaConfig) carrying the injected
//! collaborators, and `tracing` as the single logging facade.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ReplicaConfig, ReplicaConfigBuilder};
pub use error::{Error, Result};
