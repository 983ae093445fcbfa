//! Herald Runtime - configuration, logging and the message loop.
//!
//! This crate provides:
//! - Layered configuration (`herald.toml`, `HERALD_*` environment variables)
//! - Logging setup driven by that configuration
//! - [`HeraldRuntime`], which feeds a stream of messages to a
//!   [`Dispatcher`](herald_framework::Dispatcher) and shuts down cleanly
//!
//! ```ignore
//! use herald_runtime::HeraldRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HeraldRuntime::builder()
//!         .command(Command::from_fn(ping)?)
//!         .build()?;
//!
//!     // Runs until the stream ends, Ctrl+C, or the shutdown token fires
//!     runtime.run(incoming_messages()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{BotConfig, ConfigError, ConfigLoader, ConfigResult, HeraldConfig, LoggingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{HeraldRuntime, RuntimeBuilder, RuntimeStats};

// Re-export tracing for use by bot crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for bot code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
