//! Message dispatcher for the Herald framework.
//!
//! The [`Dispatcher`] owns the command prefix, a global check chain, the
//! command registry and an error handler. Every incoming message goes through
//! the same steps:
//!
//! 1. Messages from bots, or without the prefix, are ignored
//! 2. The content is split into a verb and tokenized arguments
//! 3. Global checks run in order; a failing check drops the message silently
//! 4. Commands are scanned in registration order; every command named after
//!    the verb whose own checks pass is invoked, so duplicate names all fire
//! 5. Errors raised by checks or handlers are passed to the error handler
//!    together with the message
//!
//! ```rust,ignore
//! use herald_framework::{Command, Dispatcher, reply_with_error};
//!
//! let dispatcher = Dispatcher::builder()
//!     .prefix("!")
//!     .error_handler(reply_with_error)
//!     .command(Command::from_fn(hello)?)
//!     .build()?;
//!
//! // From the transport's message event:
//! dispatcher.handle_incoming_message(message).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use herald_core::BoxedMessage;
use tracing::{Instrument, Level, debug, span, trace, warn};

use crate::check::{BoxedCheck, Check, Checks};
use crate::command::Command;
use crate::error::{CommandError, CommandResult};
use crate::handler::{Args, BoxFuture};
use crate::split::{split_command_line, tokenize};

// ============================================================================
// Error handler
// ============================================================================

/// Receives every error raised while dispatching a message.
///
/// Returning `Ok` swallows the error and lets dispatch continue with the next
/// command. Returning `Err` aborts the dispatch and hands the error to the
/// caller of [`Dispatcher::handle_incoming_message`].
pub trait ErrorHandler: Send + Sync + 'static {
    /// Handles an error raised for `message`.
    fn handle(&self, message: BoxedMessage, error: CommandError)
    -> BoxFuture<'static, CommandResult<()>>;
}

impl<F, Fut> ErrorHandler for F
where
    F: Fn(BoxedMessage, CommandError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult<()>> + Send + 'static,
{
    fn handle(
        &self,
        message: BoxedMessage,
        error: CommandError,
    ) -> BoxFuture<'static, CommandResult<()>> {
        Box::pin((self)(message, error))
    }
}

/// A type-erased error handler.
pub type BoxedErrorHandler = Arc<dyn ErrorHandler>;

/// The default error handler: hands the error straight back.
pub async fn rethrow(_message: BoxedMessage, error: CommandError) -> CommandResult<()> {
    Err(error)
}

/// An error handler that replies with the error text and swallows the error.
pub async fn reply_with_error(message: BoxedMessage, error: CommandError) -> CommandResult<()> {
    message.reply(&error.to_string()).await?;
    Ok(())
}

// ============================================================================
// Dispatcher
// ============================================================================

/// What happened to a dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Sent by a bot or missing the prefix.
    Ignored,
    /// Dropped by the global check chain.
    Rejected,
    /// Routed to the registry; `matched` commands were invoked.
    Routed {
        /// Number of commands invoked.
        matched: usize,
    },
}

#[derive(Clone)]
struct DispatcherInner {
    prefix: String,
    checks: Checks,
    commands: Vec<Command>,
    error_handler: BoxedErrorHandler,
}

/// Routes incoming messages to commands.
///
/// `Dispatcher` is cheap to clone and `Send + Sync`, so one instance can serve
/// concurrent dispatches from many tasks.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// Creates a dispatcher with the given prefix and the default error handler.
    pub fn new(prefix: impl Into<String>) -> CommandResult<Self> {
        Self::builder().prefix(prefix).build()
    }

    /// Creates a dispatcher builder.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    fn inner_mut(&mut self) -> &mut DispatcherInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Returns the command prefix.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Returns the registered commands in registration order.
    pub fn commands(&self) -> &[Command] {
        &self.inner.commands
    }

    /// Returns the number of global checks.
    pub fn check_count(&self) -> usize {
        self.inner.checks.len()
    }

    /// Appends a global check.
    pub fn add_check<C: Check>(&mut self, check: C) {
        self.inner_mut().checks.add(check);
    }

    /// Appends several global checks, keeping their order.
    pub fn add_checks<I>(&mut self, checks: I)
    where
        I: IntoIterator<Item = BoxedCheck>,
    {
        self.inner_mut().checks.extend(checks);
    }

    /// Registers a command.
    pub fn add_command(&mut self, command: Command) {
        self.inner_mut().commands.push(command);
    }

    /// Registers several commands, keeping their order.
    pub fn add_commands<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = Command>,
    {
        self.inner_mut().commands.extend(commands);
    }

    /// Formats one help line per registered command.
    pub fn help(&self) -> String {
        self.inner
            .commands
            .iter()
            .map(|cmd| cmd.help_line(&self.inner.prefix))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Dispatches one incoming message.
    ///
    /// This is the entry point a transport's message event should call. The
    /// same message dispatched twice runs twice; there is no deduplication.
    ///
    /// # Errors
    ///
    /// Whatever the error handler returns. With the default handler that is
    /// the first error raised by a check or handler, after which no further
    /// commands run for this message.
    pub async fn handle_incoming_message(&self, message: BoxedMessage) -> CommandResult<Dispatch> {
        if message.author().bot {
            trace!(author = %message.author().id, "Ignoring message from bot");
            return Ok(Dispatch::Ignored);
        }

        let Some((verb, rest)) = split_command_line(message.content(), &self.inner.prefix) else {
            trace!("Ignoring message without prefix");
            return Ok(Dispatch::Ignored);
        };

        let span = span!(Level::DEBUG, "dispatch", verb = %verb);
        let args = tokenize(rest);
        self.route(&message, verb, args).instrument(span).await
    }

    async fn route(
        &self,
        message: &BoxedMessage,
        verb: &str,
        args: Vec<String>,
    ) -> CommandResult<Dispatch> {
        match self.inner.checks.perform(&**message) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Global checks rejected message");
                return Ok(Dispatch::Rejected);
            }
            Err(source) => {
                warn!(error = %source, "Global check raised an error");
                self.report(message, CommandError::Check {
                    command: None,
                    source,
                })
                .await?;
                return Ok(Dispatch::Rejected);
            }
        }

        let mut matched = 0;
        for command in &self.inner.commands {
            if command.name() != verb {
                continue;
            }

            match command.perform_checks(&**message) {
                Ok(true) => {}
                Ok(false) => {
                    trace!(command = command.name(), "Command checks did not pass, skipping");
                    continue;
                }
                Err(source) => {
                    warn!(command = command.name(), error = %source, "Command check raised an error");
                    self.report(message, CommandError::Check {
                        command: Some(command.name().to_string()),
                        source,
                    })
                    .await?;
                    continue;
                }
            }

            matched += 1;
            debug!(command = command.name(), argc = args.len(), "Command matched");
            if let Err(error) = command
                .invoke(Arc::clone(message), Args::new(args.clone()))
                .await
            {
                debug!(command = command.name(), %error, "Command failed");
                self.report(message, error).await?;
            }
        }

        if matched == 0 {
            trace!("No command matched");
        }
        Ok(Dispatch::Routed { matched })
    }

    async fn report(&self, message: &BoxedMessage, error: CommandError) -> CommandResult<()> {
        self.inner
            .error_handler
            .handle(Arc::clone(message), error)
            .await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("prefix", &self.inner.prefix)
            .field("check_count", &self.inner.checks.len())
            .field("commands", &self.inner.commands)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// DispatcherBuilder
// ============================================================================

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    prefix: Option<String>,
    checks: Checks,
    commands: Vec<Command>,
    error_handler: Option<BoxedErrorHandler>,
}

impl DispatcherBuilder {
    /// Sets the command prefix. Required.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Replaces the default error handler.
    pub fn error_handler<E: ErrorHandler>(mut self, handler: E) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Appends a global check.
    pub fn check<C: Check>(mut self, check: C) -> Self {
        self.checks.add(check);
        self
    }

    /// Appends several global checks, keeping their order.
    pub fn checks<I>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = BoxedCheck>,
    {
        self.checks.extend(checks);
        self
    }

    /// Registers a command.
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Registers several commands, keeping their order.
    pub fn commands<I>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = Command>,
    {
        self.commands.extend(commands);
        self
    }

    /// Builds the dispatcher.
    ///
    /// # Errors
    ///
    /// [`CommandError::InvalidPrefix`] when the prefix is missing, empty or
    /// contains whitespace.
    pub fn build(self) -> CommandResult<Dispatcher> {
        let prefix = self.prefix.unwrap_or_default();
        if prefix.is_empty() || prefix.contains(char::is_whitespace) {
            return Err(CommandError::InvalidPrefix { prefix });
        }

        Ok(Dispatcher {
            inner: Arc::new(DispatcherInner {
                prefix,
                checks: self.checks,
                commands: self.commands,
                error_handler: self.error_handler.unwrap_or_else(|| Arc::new(rethrow)),
            }),
        })
    }
}
