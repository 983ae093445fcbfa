//! Commands.
//!
//! A [`Command`] binds a name to a [`Handler`], an optional usage string and
//! an ordered chain of per-command [`Checks`].
//!
//! ```rust,ignore
//! use herald_framework::{Args, BoxedMessage, Command, check};
//!
//! async fn hello(msg: BoxedMessage, args: Args) {
//!     let who = args.get(0).unwrap_or("world");
//!     let _ = msg.reply(&format!("Hello, {who}!")).await;
//! }
//!
//! // Named after the handler: "hello"
//! let cmd = Command::from_fn(hello)?;
//!
//! let cmd = Command::builder()
//!     .name("hidden")
//!     .usage("<secret>")
//!     .check(check::guild_owner_only())
//!     .handler(hidden)
//!     .build()?;
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use herald_core::{BoxedMessage, Message};
use tracing::trace;

use crate::check::{BoxedCheck, Check, Checks};
use crate::error::{BoxError, CommandError, CommandResult};
use crate::handler::{Args, BoxedHandler, Handler, into_handler};

/// Internal data for a Command.
///
/// Wrapped in an `Arc` for cheap cloning; `Arc::make_mut` gives
/// copy-on-write semantics when checks are appended.
#[derive(Clone)]
struct CommandInner {
    name: String,
    usage: Option<String>,
    checks: Checks,
    handler: BoxedHandler,
}

/// A named, checkable unit of behavior.
#[derive(Clone)]
pub struct Command {
    inner: Arc<CommandInner>,
}

impl Command {
    /// Creates a command with an explicit name.
    ///
    /// An empty name, or one containing a space, falls back to the handler's
    /// own name.
    pub fn new<H: Handler>(name: impl Into<String>, handler: H) -> CommandResult<Self> {
        Self::builder().name(name).handler(handler).build()
    }

    /// Creates a command named after its handler function.
    pub fn from_fn<H: Handler>(handler: H) -> CommandResult<Self> {
        Self::builder().handler(handler).build()
    }

    /// Creates a command builder.
    pub fn builder() -> CommandBuilder {
        CommandBuilder::default()
    }

    fn inner_mut(&mut self) -> &mut CommandInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Returns the command name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the usage string, or `""` when none was given.
    pub fn usage(&self) -> &str {
        self.inner.usage.as_deref().unwrap_or("")
    }

    /// Returns the number of per-command checks.
    pub fn check_count(&self) -> usize {
        self.inner.checks.len()
    }

    /// Appends a check.
    pub fn add_check<C: Check>(&mut self, check: C) {
        self.inner_mut().checks.add(check);
    }

    /// Appends several checks, keeping their order.
    pub fn add_checks<I>(&mut self, checks: I)
    where
        I: IntoIterator<Item = BoxedCheck>,
    {
        self.inner_mut().checks.extend(checks);
    }

    /// Runs the per-command checks in registration order.
    ///
    /// Stops at the first check that does not pass. Errors raised by a check
    /// are returned to the caller untouched.
    pub fn perform_checks(&self, message: &dyn Message) -> Result<bool, BoxError> {
        self.inner.checks.perform(message)
    }

    /// Invokes the handler and waits for it to finish.
    ///
    /// An error returned by the handler becomes [`CommandError::Handler`]; a
    /// panic becomes [`CommandError::Panicked`].
    pub async fn invoke(&self, message: BoxedMessage, args: Args) -> CommandResult<()> {
        trace!(command = %self.inner.name, argc = args.len(), "Invoking handler");

        let handler = Arc::clone(&self.inner.handler);
        let outcome = AssertUnwindSafe(async move { handler.call(message, args).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(CommandError::Handler {
                command: self.inner.name.clone(),
                source,
            }),
            Err(payload) => Err(CommandError::Panicked {
                command: self.inner.name.clone(),
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// Formats a one-line help entry such as `!hello <name>`.
    pub fn help_line(&self, prefix: &str) -> String {
        format!("{prefix}{} {}", self.inner.name, self.usage())
            .trim_end()
            .to_string()
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.inner.name)
            .field("usage", &self.inner.usage)
            .field("check_count", &self.inner.checks.len())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(' ')
}

// ============================================================================
// CommandBuilder
// ============================================================================

/// Builder for [`Command`].
#[derive(Default)]
pub struct CommandBuilder {
    name: Option<String>,
    usage: Option<String>,
    checks: Checks,
    handler: Option<BoxedHandler>,
}

impl CommandBuilder {
    /// Sets the command name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the usage string shown in help output.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    /// Appends a check.
    pub fn check<C: Check>(mut self, check: C) -> Self {
        self.checks.add(check);
        self
    }

    /// Appends several checks, keeping their order.
    pub fn checks<I>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = BoxedCheck>,
    {
        self.checks.extend(checks);
        self
    }

    /// Sets the handler.
    pub fn handler<H: Handler>(mut self, handler: H) -> Self {
        self.handler = Some(into_handler(handler));
        self
    }

    /// Sets a pre-built boxed handler.
    pub fn handler_boxed(mut self, handler: BoxedHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Builds the command.
    ///
    /// # Errors
    ///
    /// [`CommandError::MissingHandler`] without a handler, and
    /// [`CommandError::InvalidName`] when neither the supplied name nor the
    /// handler's own name is usable.
    pub fn build(self) -> CommandResult<Command> {
        let handler = self.handler.ok_or(CommandError::MissingHandler)?;

        let name = match self.name {
            Some(name) if is_valid_name(&name) => name,
            supplied => handler.name().ok_or_else(|| CommandError::InvalidName {
                name: supplied.unwrap_or_default(),
            })?,
        };

        Ok(Command {
            inner: Arc::new(CommandInner {
                name,
                usage: self.usage.filter(|u| !u.is_empty()),
                checks: self.checks,
                handler,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::boxed;
    use crate::testkit::{boxed_user_message, user_message};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::assert_ok;

    async fn foo(_msg: BoxedMessage, _args: Args) {}

    async fn echo(msg: BoxedMessage, args: Args) -> Result<(), CommandError> {
        msg.reply(&args.rest(0)).await?;
        Ok(())
    }

    #[derive(Debug, thiserror::Error)]
    #[error("exploded")]
    struct Exploded;

    #[test]
    fn test_name_defaults_to_handler_name() {
        let cmd = Command::from_fn(foo).unwrap();
        assert_eq!(cmd.name(), "foo");
        assert_eq!(cmd.usage(), "");
        assert_eq!(cmd.check_count(), 0);
    }

    #[test]
    fn test_invalid_name_falls_back_to_handler_name() {
        assert_eq!(Command::new("two words", foo).unwrap().name(), "foo");
        assert_eq!(Command::new("", foo).unwrap().name(), "foo");
        assert_eq!(Command::new("bar", foo).unwrap().name(), "bar");
    }

    #[test]
    fn test_closure_needs_explicit_name() {
        let closure = |_: BoxedMessage, _: Args| async {};
        assert!(matches!(
            Command::from_fn(closure),
            Err(CommandError::InvalidName { .. })
        ));
        assert_eq!(Command::new("ok", closure).unwrap().name(), "ok");
    }

    #[test]
    fn test_missing_handler() {
        assert!(matches!(
            Command::builder().name("x").build(),
            Err(CommandError::MissingHandler)
        ));
    }

    #[test]
    fn test_help_line() {
        let cmd = Command::builder()
            .name("hello")
            .usage("<name>")
            .handler(foo)
            .build()
            .unwrap();
        assert_eq!(cmd.help_line("!"), "!hello <name>");
        assert_eq!(Command::from_fn(foo).unwrap().help_line("?"), "?foo");
    }

    #[test]
    fn test_perform_checks_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut cmd = Command::from_fn(foo).unwrap();
        cmd.add_checks([
            boxed(|_: &dyn Message| true),
            boxed(|_: &dyn Message| false),
            boxed(move |_: &dyn Message| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }),
        ]);

        assert_eq!(cmd.check_count(), 3);
        assert!(!cmd.perform_checks(&user_message("1", "!foo")).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_add_check_does_not_leak_into_clones() {
        let original = Command::from_fn(foo).unwrap();
        let mut copy = original.clone();
        copy.add_check(|_: &dyn Message| false);

        assert_eq!(original.check_count(), 0);
        assert_eq!(copy.check_count(), 1);
    }

    #[tokio::test]
    async fn test_invoke_passes_args() {
        let local = user_message("1", "!echo a b");
        let msg: BoxedMessage = Arc::new(local.clone());
        let cmd = Command::from_fn(echo).unwrap();

        assert_ok!(cmd.invoke(msg, Args::new(vec!["a".into(), "b".into()])).await);
        assert_eq!(local.replies(), vec!["a b"]);
    }

    #[tokio::test]
    async fn test_invoke_wraps_handler_error() {
        let cmd = Command::new("boom", |_: BoxedMessage, _: Args| async {
            Err::<(), _>(Exploded)
        })
        .unwrap();

        let err = cmd
            .invoke(boxed_user_message("1", "!boom"), Args::default())
            .await
            .unwrap_err();
        assert_eq!(err.command(), Some("boom"));
        assert!(err.user_error().unwrap().downcast_ref::<Exploded>().is_some());
    }

    #[tokio::test]
    async fn test_invoke_catches_panic() {
        async fn crash(_msg: BoxedMessage, _args: Args) {
            panic!("kaboom");
        }

        let cmd = Command::from_fn(crash).unwrap();

        let err = cmd
            .invoke(boxed_user_message("1", "!crash"), Args::default())
            .await
            .unwrap_err();
        match err {
            CommandError::Panicked { command, message } => {
                assert_eq!(command, "crash");
                assert_eq!(message, "kaboom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
