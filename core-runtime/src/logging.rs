//! # Logging & Tracing Infrastructure
//!
//! Structured logging for the replica built on the `tracing` crate:
//! - Pretty, JSON and compact output formats
//! - Module-level filtering with quiet transport crates
//! - Span events for sync passes
//! - Redaction helper for credentials and email addresses
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::time::LogLevel;
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! #[tokio::main]
//! async fn main() -> core_runtime::Result<()> {
//!     let config = LoggingConfig::default()
//!         .with_format(LogFormat::Pretty)
//!         .with_level(LogLevel::Debug);
//!
//!     init_logging(config)?;
//!
//!     tracing::info!("Replica started");
//!     Ok(())
//! }
//! ```
//!
//! Setting `RUST_LOG` has no effect; pass a directive string through
//! [`LoggingConfig::with_filter`] instead.

use crate::error::{Error, Result};
use bridge_traits::time::LogLevel;
use std::io;
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::{Layer, Layered, SubscriberExt},
    registry::Registry,
    util::SubscriberInitExt,
};

/// Crates of this workspace that follow the configured level.
const WORKSPACE_TARGETS: &[&str] = &[
    "drive_replica_workspace",
    "bridge_traits",
    "bridge_desktop",
    "core_runtime",
    "core_blob",
    "core_sync",
    "core_service",
    "provider_google_drive",
];

/// Dependencies that only report warnings and above by default.
const QUIET_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "reqwest", "rustls"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Minimum log level for workspace crates
    pub level: LogLevel,
    /// Custom filter string (e.g., "core_sync=trace,provider_google_drive=debug")
    pub filter: Option<String>,
    /// Emit span enter/exit events
    pub enable_spans: bool,
    /// Display target module in logs
    pub display_target: bool,
    /// Display thread info
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set minimum log level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set custom filter string, replacing the default directives
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Enable or disable span events
    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    /// Enable or disable target display
    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    /// Enable or disable thread info
    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Initialize the logging system
///
/// This should be called once during application startup. Subsequent calls
/// will return an error.
///
/// # Errors
///
/// Returns an error if:
/// - A global subscriber is already installed
/// - The filter directives are invalid
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    match config.format {
        LogFormat::Pretty => install_pretty(&config, filter),
        LogFormat::Json => install_json(&config, filter),
        LogFormat::Compact => install_compact(&config, filter),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = match &config.filter {
        Some(custom_filter) => custom_filter.clone(),
        None => default_directives(config.level),
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

fn default_directives(level: LogLevel) -> String {
    let level = level.as_str();

    WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .chain(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)))
        .collect::<Vec<_>>()
        .join(",")
}

fn span_events(config: &LoggingConfig) -> FmtSpan {
    if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

type FilteredRegistry = Layered<EnvFilter, Registry>;

/// Install `layer` behind `filter` as the global subscriber
fn install<L>(filter: EnvFilter, layer: L) -> Result<()>
where
    L: Layer<FilteredRegistry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn install_pretty(config: &LoggingConfig, filter: EnvFilter) -> Result<()> {
    let layer = fmt::layer()
        .pretty()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_span_events(span_events(config))
        .with_writer(io::stdout);
    install(filter, layer)
}

fn install_compact(config: &LoggingConfig, filter: EnvFilter) -> Result<()> {
    let layer = fmt::layer()
        .compact()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_span_events(span_events(config))
        .with_writer(io::stdout);
    install(filter, layer)
}

// JSON lines carry the span stack as fields instead of enter/exit events.
fn install_json(config: &LoggingConfig, filter: EnvFilter) -> Result<()> {
    let layer = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(config.enable_spans)
        .with_span_list(config.enable_spans)
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stdout);
    install(filter, layer)
}

/// Helper function to redact sensitive field values
///
/// ```ignore
/// use tracing::debug;
/// use core_runtime::logging::redact_if_sensitive;
///
/// debug!(authorization = %redact_if_sensitive("authorization", &header), "Sending request");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const SENSITIVE_FIELDS: &[&str] = &[
        "token",
        "password",
        "secret",
        "api_key",
        "authorization",
        "bearer",
    ];

    let field_lower = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|&f| field_lower.contains(f)) {
        return "[REDACTED]".to_string();
    }

    match value.find('@') {
        // Likely an email: keep the first character only
        Some(at_pos) if value[at_pos..].contains('.') => {
            let first = value.chars().next().filter(|_| at_pos > 0);
            format!("{}***@[REDACTED]", first.map(String::from).unwrap_or_default())
        }
        _ => value.to_string(),
    }
}
