//! Canopy Telemetry - logging and request correlation.
//!
//! This crate provides:
//! - Subscriber setup with pretty, compact, JSON and full formats
//! - Output to stdout, stderr or daily-rotated files
//! - A request context whose span correlates log lines from one call
//!
//! With the `config` feature, a [`LogConfig`] can be built from the
//! `[logging]` section of the Canopy configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use canopy_telemetry::{LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), canopy_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("canopy_index=debug");
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new().with_operation("create_file");
//! let _entered = ctx.span().entered();
//! tracing::info!("handling request");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
