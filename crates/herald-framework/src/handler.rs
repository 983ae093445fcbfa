//! Handler system for the Herald framework.
//!
//! A handler is an async function receiving the message that triggered the
//! command plus the tokenized positional arguments. It may return `()` or a
//! `Result<(), E>` for any error convertible into [`BoxError`]:
//!
//! ```rust,ignore
//! use herald_framework::{Args, BoxedMessage, CommandError};
//!
//! async fn ping(msg: BoxedMessage, _args: Args) {
//!     let _ = msg.reply("pong").await;
//! }
//!
//! async fn add(msg: BoxedMessage, args: Args) -> Result<(), CommandError> {
//!     let a: i64 = args.parse(0)?;
//!     let b: i64 = args.parse(1)?;
//!     msg.reply(&(a + b).to_string()).await?;
//!     Ok(())
//! }
//! ```
//!
//! Handlers validate their own arity; the dispatcher passes every token.

use std::fmt::Display;
use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use herald_core::BoxedMessage;

use crate::error::{BoxError, CommandError, CommandResult};

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ============================================================================
// Args
// ============================================================================

/// The positional arguments of one command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(Vec<String>);

impl Args {
    /// Wraps a list of tokens.
    pub fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    /// Returns the argument at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Returns the argument at `index` or an argument error.
    pub fn require(&self, index: usize) -> CommandResult<&str> {
        self.get(index)
            .ok_or_else(|| CommandError::argument(index, "missing"))
    }

    /// Parses the argument at `index`.
    pub fn parse<T>(&self, index: usize) -> CommandResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.require(index)?
            .parse()
            .map_err(|e: T::Err| CommandError::argument(index, e.to_string()))
    }

    /// Joins every argument from `index` onwards with single spaces.
    pub fn rest(&self, index: usize) -> String {
        self.0.get(index..).map(|s| s.join(" ")).unwrap_or_default()
    }

    /// Unwraps the token list.
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for Args {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<String>> for Args {
    fn from(tokens: Vec<String>) -> Self {
        Self(tokens)
    }
}

impl IntoIterator for Args {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ============================================================================
// Handler trait
// ============================================================================

/// Conversion from a handler's return value into a handler outcome.
pub trait IntoHandlerResult {
    /// Converts into `Ok(())` or the raised error.
    fn into_handler_result(self) -> Result<(), BoxError>;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_handler_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// The core trait for command handlers.
///
/// Implemented automatically for every `Fn(BoxedMessage, Args) -> impl Future`
/// whose output implements [`IntoHandlerResult`].
pub trait Handler: Send + Sync + 'static {
    /// Calls the handler.
    fn call(&self, message: BoxedMessage, args: Args) -> BoxFuture<'static, Result<(), BoxError>>;

    /// Returns the handler's declared name, when one can be determined.
    fn name(&self) -> Option<String> {
        None
    }
}

impl<F, Fut> Handler for F
where
    F: Fn(BoxedMessage, Args) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoHandlerResult,
{
    fn call(&self, message: BoxedMessage, args: Args) -> BoxFuture<'static, Result<(), BoxError>> {
        let fut = (self)(message, args);
        Box::pin(async move { fut.await.into_handler_result() })
    }

    fn name(&self) -> Option<String> {
        declared_name(std::any::type_name::<F>())
    }
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn Handler>;

/// Converts a handler into a boxed handler.
pub fn into_handler<H: Handler>(handler: H) -> BoxedHandler {
    Arc::new(handler)
}

/// Extracts a function's own name from its type path.
///
/// `my_bot::commands::hello` yields `hello`. Closures have no usable name.
fn declared_name(type_path: &str) -> Option<String> {
    let path = type_path.split('<').next().unwrap_or(type_path);
    let name = path.rsplit("::").next()?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_');
    valid.then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::boxed_user_message;
    use tokio_test::{assert_err, assert_ok};

    async fn shout(_msg: BoxedMessage, _args: Args) {}

    async fn refuse(_msg: BoxedMessage, _args: Args) -> Result<(), CommandError> {
        Err(CommandError::permission_denied("no"))
    }

    #[test]
    fn test_declared_name() {
        assert_eq!(declared_name("bot::commands::hello"), Some("hello".into()));
        assert_eq!(declared_name("hello"), Some("hello".into()));
        assert_eq!(declared_name("bot::main::{{closure}}"), None);
        assert_eq!(declared_name("bot::generic<u8>"), Some("generic".into()));
    }

    #[test]
    fn test_fn_item_name() {
        assert_eq!(Handler::name(&shout), Some("shout".into()));
        let closure = |_: BoxedMessage, _: Args| async {};
        assert_eq!(Handler::name(&closure), None);
    }

    #[tokio::test]
    async fn test_handler_results() {
        let msg = boxed_user_message("1", "!x");
        assert_ok!(Handler::call(&shout, msg.clone(), Args::default()).await);
        assert_err!(Handler::call(&refuse, msg, Args::default()).await);
    }

    #[test]
    fn test_args_helpers() {
        let args = Args::new(vec!["7".into(), "x".into(), "y z".into()]);
        assert_eq!(args.len(), 3);
        assert_eq!(args.get(1), Some("x"));
        assert_eq!(args.get(5), None);
        assert_eq!(args.parse::<u32>(0).unwrap(), 7);
        assert!(matches!(
            args.parse::<u32>(1),
            Err(CommandError::Argument { index: 1, .. })
        ));
        assert!(matches!(
            args.require(3),
            Err(CommandError::Argument { index: 3, .. })
        ));
        assert_eq!(args.rest(1), "x y z");
        assert_eq!(args.rest(9), "");
    }
}
