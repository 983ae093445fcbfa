//! Check chains.
//!
//! A check is a synchronous predicate over an incoming [`Message`]. Checks are
//! grouped into ordered [`Checks`] chains: the dispatcher owns a global chain
//! that gates every message, and each [`Command`](crate::Command) owns its own.
//!
//! Any closure taking `&dyn Message` and returning either `bool` or
//! `Result<bool, E>` is a check:
//!
//! ```rust,ignore
//! use herald_framework::{Checks, CommandError};
//!
//! let mut checks = Checks::new();
//! checks.add(|msg: &dyn Message| msg.guild().is_some());
//! checks.add(|msg: &dyn Message| {
//!     if msg.author().id == "banned" {
//!         return Err(CommandError::permission_denied("you are banned"));
//!     }
//!     Ok(true)
//! });
//! ```
//!
//! Returning `false` is a silent rejection. Returning an error carries a
//! reason through to the dispatcher's error handler.

use std::collections::HashSet;
use std::sync::Arc;

use herald_core::Message;
use tracing::trace;

use crate::error::{BoxError, CommandError};

/// Conversion from a check's return value into a check outcome.
pub trait IntoCheckOutcome {
    /// Converts into `Ok(passed)` or the raised error.
    fn into_check_outcome(self) -> Result<bool, BoxError>;
}

impl IntoCheckOutcome for bool {
    fn into_check_outcome(self) -> Result<bool, BoxError> {
        Ok(self)
    }
}

impl<E> IntoCheckOutcome for Result<bool, E>
where
    E: Into<BoxError>,
{
    fn into_check_outcome(self) -> Result<bool, BoxError> {
        self.map_err(Into::into)
    }
}

/// A predicate gating command execution.
pub trait Check: Send + Sync + 'static {
    /// Evaluates the check against a message.
    fn check(&self, message: &dyn Message) -> Result<bool, BoxError>;
}

impl<F, R> Check for F
where
    F: Fn(&dyn Message) -> R + Send + Sync + 'static,
    R: IntoCheckOutcome,
{
    fn check(&self, message: &dyn Message) -> Result<bool, BoxError> {
        (self)(message).into_check_outcome()
    }
}

/// A type-erased check that can be stored in collections.
pub type BoxedCheck = Arc<dyn Check>;

/// An ordered, append-only chain of checks.
///
/// Evaluation follows registration order, stops at the first check that does
/// not pass, and passes trivially when the chain is empty.
#[derive(Clone, Default)]
pub struct Checks {
    checks: Vec<BoxedCheck>,
}

impl Checks {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Appends a check.
    pub fn add<C: Check>(&mut self, check: C) {
        self.checks.push(Arc::new(check));
    }

    /// Appends an already boxed check.
    pub fn add_boxed(&mut self, check: BoxedCheck) {
        self.checks.push(check);
    }

    /// Appends several boxed checks, keeping their order.
    pub fn extend<I>(&mut self, checks: I)
    where
        I: IntoIterator<Item = BoxedCheck>,
    {
        self.checks.extend(checks);
    }

    /// Returns the number of checks in the chain.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns `true` if the chain has no checks.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Runs the chain against a message.
    ///
    /// Returns `Ok(false)` at the first failing check without evaluating the
    /// rest. Errors raised by a check are returned as-is.
    pub fn perform(&self, message: &dyn Message) -> Result<bool, BoxError> {
        for (index, check) in self.checks.iter().enumerate() {
            if !check.check(message)? {
                trace!(check_index = index, "Check did not pass");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl FromIterator<BoxedCheck> for Checks {
    fn from_iter<I: IntoIterator<Item = BoxedCheck>>(iter: I) -> Self {
        Self {
            checks: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for Checks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checks")
            .field("len", &self.checks.len())
            .finish()
    }
}

/// Boxes a check for use with [`Checks::extend`] and the `checks` builder
/// methods, which take a list of boxed checks.
pub fn boxed<C: Check>(check: C) -> BoxedCheck {
    Arc::new(check)
}

// ============================================================================
// Built-in checks
// ============================================================================

/// Passes only for messages posted inside a guild.
pub fn guild_only() -> impl Check {
    |msg: &dyn Message| msg.guild().is_some()
}

/// Passes only when the author owns the guild the message was posted in.
///
/// Anyone else gets a [`CommandError::PermissionDenied`], so the error handler
/// can tell them why nothing happened.
pub fn guild_owner_only() -> impl Check {
    |msg: &dyn Message| match msg.guild() {
        Some(guild) if guild.is_owner(&msg.author().id) => Ok(true),
        Some(_) => Err(CommandError::permission_denied(
            "only the guild owner can use this command",
        )),
        None => Err(CommandError::permission_denied(
            "this command can only be used in a guild",
        )),
    }
}

/// Passes only for the listed author ids.
pub fn allow_authors<I, S>(ids: I) -> impl Check
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let allowed: HashSet<String> = ids.into_iter().map(Into::into).collect();
    move |msg: &dyn Message| allowed.contains(&msg.author().id)
}
