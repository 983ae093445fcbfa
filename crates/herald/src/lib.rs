//! # Herald
//!
//! Prefix-command dispatching for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────────────────────────┐
//! │   Runtime   │────▶│ Dispatcher                           │
//! │  (stream of │     │  prefix ─▶ tokenize ─▶ global checks │──▶ Command "ping"
//! │   messages) │     │                 │                    │──▶ Command "help"
//! └─────────────┘     │                 └──▶ error handler   │
//!                     └──────────────────────────────────────┘
//! ```
//!
//! - **Core**: the [`Message`](herald_core::Message) trait a chat transport implements
//! - **Framework**: tokenizer, checks, commands and the dispatcher
//! - **Runtime**: configuration, logging and the message loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! async fn ping(msg: BoxedMessage, _args: Args) -> CommandResult<()> {
//!     msg.reply("pong").await?;
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HeraldRuntime::builder()
//!         .command(Command::from_fn(ping)?)
//!         .error_handler(reply_with_error)
//!         .build()?;
//!
//!     runtime.run(my_transport.messages()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: load `herald.toml`
//! - `yaml-config`: load `herald.yaml`
//! - `json-log`: JSON log output

pub use herald_core as core;
pub use herald_framework as framework;
pub use herald_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use herald_runtime::{HeraldConfig, HeraldRuntime, RuntimeStats};

    // Commands and routing
    pub use herald_framework::{
        Args, Command, CommandError, CommandResult, Dispatch, Dispatcher, reply_with_error,
        rethrow,
    };

    // Built-in checks
    pub use herald_framework::check::{allow_authors, boxed, guild_only, guild_owner_only};

    // Message types for transports and handlers
    pub use herald_core::{ApiError, ApiResult, Author, BoxedMessage, Guild, Message};
}
