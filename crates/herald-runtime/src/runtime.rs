//! The message loop feeding a [`Dispatcher`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! let runtime = HeraldRuntime::builder()
//!     .config_file("herald.toml")
//!     .command(Command::from_fn(ping)?)
//!     .build()?;
//!
//! let stats = runtime.run(messages).await?;
//! ```
//!
//! Each incoming message is dispatched on its own task, so a slow handler
//! never holds up the next message. `run` returns once the stream ends or a
//! shutdown is requested, after every in-flight dispatch has finished.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{Stream, StreamExt};
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigLoader, HeraldConfig};
use crate::error::RuntimeResult;
use crate::logging;
use herald_core::BoxedMessage;
use herald_framework::{
    BoxedCheck, Check, Command, Dispatch, Dispatcher, DispatcherBuilder, ErrorHandler,
};

/// Counters over everything the runtime has dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Messages taken from the stream.
    pub received: u64,
    /// Messages from bots or without the prefix.
    pub ignored: u64,
    /// Messages dropped by the global checks.
    pub rejected: u64,
    /// Messages that reached the command registry.
    pub routed: u64,
    /// Command invocations across all routed messages.
    pub invoked: u64,
    /// Dispatches whose error escaped the error handler.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    received: AtomicU64,
    ignored: AtomicU64,
    rejected: AtomicU64,
    routed: AtomicU64,
    invoked: AtomicU64,
    failed: AtomicU64,
}

impl StatsCounters {
    fn snapshot(&self) -> RuntimeStats {
        RuntimeStats {
            received: self.received.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            routed: self.routed.load(Ordering::Relaxed),
            invoked: self.invoked.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: &RuntimeResult<Dispatch>) {
        match outcome {
            Ok(Dispatch::Ignored) => self.ignored.fetch_add(1, Ordering::Relaxed),
            Ok(Dispatch::Rejected) => self.rejected.fetch_add(1, Ordering::Relaxed),
            Ok(Dispatch::Routed { matched }) => {
                self.invoked.fetch_add(*matched as u64, Ordering::Relaxed);
                self.routed.fetch_add(1, Ordering::Relaxed)
            }
            Err(_) => self.failed.fetch_add(1, Ordering::Relaxed),
        };
    }
}

/// Drives a [`Dispatcher`] from a stream of messages.
pub struct HeraldRuntime {
    config: HeraldConfig,
    dispatcher: Dispatcher,
    shutdown: CancellationToken,
    stats: Arc<StatsCounters>,
    handle_signals: bool,
}

impl HeraldRuntime {
    /// Creates a runtime builder that loads configuration from the usual
    /// locations.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from already loaded configuration.
    ///
    /// Initializes logging from `config.logging` and builds `dispatcher` with
    /// the configured prefix.
    pub fn from_config(config: &HeraldConfig, dispatcher: DispatcherBuilder) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);

        let dispatcher = dispatcher.prefix(config.bot.prefix.clone()).build()?;

        info!(
            bot = config.bot.name.as_deref().unwrap_or("herald"),
            prefix = %dispatcher.prefix(),
            commands = dispatcher.commands().len(),
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Ok(Self::new(config.clone(), dispatcher))
    }

    /// Wraps a ready dispatcher without touching logging.
    pub fn new(config: HeraldConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            dispatcher,
            shutdown: CancellationToken::new(),
            stats: Arc::new(StatsCounters::default()),
            handle_signals: true,
        }
    }

    /// Whether Ctrl+C and SIGTERM stop [`run`](Self::run). On by default.
    pub fn handle_signals(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns a token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Requests a shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Returns the counters so far.
    pub fn stats(&self) -> RuntimeStats {
        self.stats.snapshot()
    }

    /// Dispatches one message on the current task.
    ///
    /// Errors that escape the error handler are returned.
    pub async fn dispatch(&self, message: BoxedMessage) -> RuntimeResult<Dispatch> {
        self.stats.received.fetch_add(1, Ordering::Relaxed);
        let outcome = self
            .dispatcher
            .handle_incoming_message(message)
            .await
            .map_err(Into::into);
        self.stats.record(&outcome);
        outcome
    }

    /// Dispatches every message from `messages` until the stream ends or a
    /// shutdown is requested.
    ///
    /// Errors escaping the error handler are logged and counted as failed;
    /// they do not stop the loop.
    pub async fn run<S>(&self, messages: S) -> RuntimeResult<RuntimeStats>
    where
        S: Stream<Item = BoxedMessage> + Send + Unpin,
    {
        let mut messages = messages;
        let mut tasks = JoinSet::new();

        let signals = wait_for_signal();
        tokio::pin!(signals);
        let mut listen = self.handle_signals;

        info!(prefix = %self.dispatcher.prefix(), "Herald runtime is now running");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                received = &mut signals, if listen => {
                    match received {
                        Ok(name) => {
                            info!(signal = name, "Received shutdown signal");
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "Signal handling unavailable");
                            listen = false;
                        }
                    }
                }
                next = messages.next() => {
                    let Some(message) = next else {
                        debug!("Message stream ended");
                        break;
                    };
                    self.stats.received.fetch_add(1, Ordering::Relaxed);

                    let dispatcher = self.dispatcher.clone();
                    let stats = Arc::clone(&self.stats);
                    tasks.spawn(async move {
                        let outcome = dispatcher
                            .handle_incoming_message(message)
                            .await
                            .map_err(Into::into);
                        if let Err(e) = &outcome {
                            error!(error = %e, "Unhandled command error");
                        }
                        stats.record(&outcome);
                    });
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.reap(joined);
                }
            }
        }

        debug!(in_flight = tasks.len(), "Waiting for in-flight dispatches");
        while let Some(joined) = tasks.join_next().await {
            self.reap(joined);
        }

        let stats = self.stats();
        info!(
            received = stats.received,
            routed = stats.routed,
            failed = stats.failed,
            "Herald runtime stopped"
        );
        Ok(stats)
    }

    fn reap(&self, joined: Result<(), tokio::task::JoinError>) {
        if let Err(e) = joined {
            // Handler panics are caught by the command; this is a check panicking.
            error!(error = %e, "Dispatch task failed");
            self.stats.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix, and names the signal.
async fn wait_for_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::select! {
            received = signal::ctrl_c() => received.map(|()| "ctrl-c"),
            _ = sigterm.recv() => Ok("sigterm"),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        Ok("ctrl-c")
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`HeraldRuntime`]: where to find configuration, plus the
/// commands and checks to register.
///
/// The prefix always comes from configuration (`bot.prefix`).
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    dispatcher: DispatcherBuilder,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            dispatcher: Dispatcher::builder(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading `HERALD_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration values below files and environment.
    pub fn config(mut self, config: HeraldConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Registers a command.
    pub fn command(mut self, command: Command) -> Self {
        self.dispatcher = self.dispatcher.command(command);
        self
    }

    /// Registers several commands, keeping their order.
    pub fn commands<I>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = Command>,
    {
        self.dispatcher = self.dispatcher.commands(commands);
        self
    }

    /// Appends a global check.
    pub fn check<C: Check>(mut self, check: C) -> Self {
        self.dispatcher = self.dispatcher.check(check);
        self
    }

    /// Appends several global checks, keeping their order.
    pub fn checks<I>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = BoxedCheck>,
    {
        self.dispatcher = self.dispatcher.checks(checks);
        self
    }

    /// Replaces the default error handler.
    pub fn error_handler<E: ErrorHandler>(mut self, handler: E) -> Self {
        self.dispatcher = self.dispatcher.error_handler(handler);
        self
    }

    /// Loads configuration, initializes logging and builds the runtime.
    pub fn build(self) -> RuntimeResult<HeraldRuntime> {
        let config = self.config_loader.load()?;
        HeraldRuntime::from_config(&config, self.dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use futures::stream;
    use herald_core::{Author, LocalMessage};
    use herald_framework::{Args, CommandError, reply_with_error};
    use tokio_test::assert_ok;

    use super::*;

    fn message(author: &str, content: &str) -> (LocalMessage, BoxedMessage) {
        let local = LocalMessage::new(Author::user(author), content);
        let boxed: BoxedMessage = Arc::new(local.clone());
        (local, boxed)
    }

    async fn echo(msg: BoxedMessage, args: Args) -> Result<(), CommandError> {
        msg.reply(&args.join(" ")).await?;
        Ok(())
    }

    async fn fail(_msg: BoxedMessage, _args: Args) -> Result<(), CommandError> {
        Err(CommandError::argument(0, "missing"))
    }

    fn runtime(dispatcher: DispatcherBuilder) -> HeraldRuntime {
        let dispatcher = dispatcher.prefix("!").build().unwrap();
        HeraldRuntime::new(HeraldConfig::default(), dispatcher).handle_signals(false)
    }

    #[tokio::test]
    async fn test_run_dispatches_every_message() {
        let runtime = runtime(Dispatcher::builder().command(Command::from_fn(echo).unwrap()));

        let (first, first_boxed) = message("1", "!echo a \"b c\"");
        let (second, second_boxed) = message("2", "hello");
        let bot = LocalMessage::new(Author::bot("3"), "!echo hi");
        let bot_boxed: BoxedMessage = Arc::new(bot.clone());

        let stats = assert_ok!(
            runtime
                .run(stream::iter(vec![first_boxed, second_boxed, bot_boxed]))
                .await
        );

        assert_eq!(first.replies(), vec!["a b c".to_string()]);
        assert!(second.replies().is_empty());
        assert!(bot.replies().is_empty());
        assert_eq!(
            stats,
            RuntimeStats {
                received: 3,
                ignored: 2,
                routed: 1,
                invoked: 1,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn test_escaped_errors_are_counted_not_fatal() {
        let runtime = runtime(Dispatcher::builder().command(Command::from_fn(fail).unwrap()));

        let (_, failing) = message("1", "!fail");
        let (_, unknown) = message("1", "!other");

        let stats = assert_ok!(runtime.run(stream::iter(vec![failing, unknown])).await);

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.routed, 1);
        assert_eq!(stats.received, 2);
    }

    #[tokio::test]
    async fn test_dispatch_returns_escaped_error() {
        let runtime = runtime(Dispatcher::builder().command(Command::from_fn(fail).unwrap()));
        let (_, boxed) = message("1", "!fail");

        let err = runtime.dispatch(boxed).await.unwrap_err();
        assert!(matches!(
            err,
            crate::RuntimeError::Dispatch(CommandError::Handler { .. })
        ));
        assert_eq!(runtime.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_handled_errors_reply() {
        let runtime = runtime(
            Dispatcher::builder()
                .command(Command::from_fn(fail).unwrap())
                .error_handler(reply_with_error),
        );
        let (local, boxed) = message("1", "!fail");

        assert_eq!(
            assert_ok!(runtime.dispatch(boxed).await),
            Dispatch::Routed { matched: 1 }
        );
        assert_eq!(local.reply_count(), 1);
        assert_eq!(runtime.stats().failed, 0);
    }

    #[tokio::test]
    async fn test_global_check_rejections_are_counted() {
        let runtime = runtime(
            Dispatcher::builder()
                .check(|msg: &dyn herald_core::Message| msg.author().id != "banned")
                .command(Command::from_fn(echo).unwrap()),
        );
        let (banned, boxed) = message("banned", "!echo hi");

        let stats = assert_ok!(runtime.run(stream::iter(vec![boxed])).await);

        assert!(banned.replies().is_empty());
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.routed, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_token_stops_pending_stream() {
        let runtime = runtime(Dispatcher::builder());
        let token = runtime.shutdown_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let stats = assert_ok!(
            tokio::time::timeout(
                Duration::from_secs(5),
                runtime.run(stream::pending::<BoxedMessage>())
            )
            .await
            .expect("run did not stop after shutdown")
        );
        assert_eq!(stats, RuntimeStats::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_in_flight_dispatches_finish_before_run_returns() {
        static FINISHED: AtomicUsize = AtomicUsize::new(0);

        async fn slow(_msg: BoxedMessage, _args: Args) {
            tokio::time::sleep(Duration::from_millis(30)).await;
            FINISHED.fetch_add(1, Ordering::SeqCst);
        }

        let runtime = runtime(Dispatcher::builder().command(Command::from_fn(slow).unwrap()));
        let batch: Vec<BoxedMessage> = (0..4).map(|i| message(&i.to_string(), "!slow").1).collect();

        let stats = assert_ok!(runtime.run(stream::iter(batch)).await);

        assert_eq!(FINISHED.load(Ordering::SeqCst), 4);
        assert_eq!(stats.invoked, 4);
    }

    #[test]
    fn test_builder_rejects_invalid_configured_prefix() {
        let mut config = HeraldConfig::default();
        config.bot.prefix = "two words".to_string();

        let result = HeraldRuntime::from_config(&config, Dispatcher::builder());
        assert!(matches!(
            result,
            Err(crate::RuntimeError::Dispatch(CommandError::InvalidPrefix { .. }))
        ));
    }
}
