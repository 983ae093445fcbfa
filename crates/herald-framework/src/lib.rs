//! # Herald Framework
//!
//! Command routing for chat bots.
//!
//! This layer provides:
//! - A tokenizer for command lines with double quotes and backslash escapes
//! - Ordered check chains gating messages and commands
//! - Async command handlers receiving the message and positional arguments
//! - The [`Dispatcher`], which ties prefix, checks, commands and the error
//!   handler together
//!
//! The framework never talks to a chat transport. It consumes
//! [`herald_core::Message`] values and replies through them.

pub mod check;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod split;

#[cfg(test)]
mod testkit;

pub use check::{BoxedCheck, Check, Checks, IntoCheckOutcome};
pub use command::{Command, CommandBuilder};
pub use dispatcher::{
    BoxedErrorHandler, Dispatch, Dispatcher, DispatcherBuilder, ErrorHandler, reply_with_error,
    rethrow,
};
pub use error::{BoxError, CommandError, CommandResult};
pub use handler::{Args, BoxFuture, BoxedHandler, Handler, IntoHandlerResult, into_handler};
pub use herald_core::{BoxedMessage, Message};
pub use split::{split_command_line, tokenize};
