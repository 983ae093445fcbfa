//! # Herald Core
//!
//! The transport-facing abstractions of the Herald command dispatcher.
//!
//! Herald does not own a chat connection. A transport adapter wraps each
//! incoming platform message in a type implementing [`Message`] and hands it to
//! the dispatcher in `herald-framework`:
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌───────────┐
//! │  Transport  │────▶│ Dispatcher │────▶│  Command  │
//! │  (Message)  │     │  (checks)  │────▶│  Command  │
//! └─────────────┘     └────────────┘     └───────────┘
//! ```

pub mod error;
pub mod local;
pub mod message;

pub use error::{ApiError, ApiResult};
pub use local::LocalMessage;
pub use message::{Author, BoxedMessage, Guild, Message};
