//! The incoming-message abstraction.
//!
//! Herald never talks to a chat transport directly. Every transport wraps its
//! native message object in a type implementing [`Message`], which exposes the
//! handful of fields the dispatcher and checks need plus a way to reply.
//!
//! ```rust,ignore
//! use herald_core::{Author, Message, ApiResult};
//!
//! struct DiscordMessage { author: Author, content: String, inner: serenity::Message }
//!
//! #[async_trait::async_trait]
//! impl Message for DiscordMessage {
//!     fn author(&self) -> &Author { &self.author }
//!     fn content(&self) -> &str { &self.content }
//!     async fn reply(&self, content: &str) -> ApiResult<()> { /* ... */ }
//!     fn as_any(&self) -> &dyn std::any::Any { self }
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApiResult;

/// The author of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Author {
    /// Transport-specific user identifier.
    pub id: String,
    /// Whether the author is a bot account.
    pub bot: bool,
}

impl Author {
    /// Creates a human author.
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bot: false,
        }
    }

    /// Creates a bot author.
    pub fn bot(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bot: true,
        }
    }
}

/// Ownership metadata for the guild (server, group) a message was posted in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Guild {
    /// Guild identifier.
    pub id: String,
    /// Identifier of the guild owner.
    pub owner_id: String,
}

impl Guild {
    /// Creates guild metadata.
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
        }
    }

    /// Returns `true` if `user_id` owns this guild.
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

/// An incoming chat message.
///
/// Implementations are provided by transports. The dispatcher only reads
/// [`author`](Message::author) and [`content`](Message::content); checks and
/// handlers may use the rest.
#[async_trait]
pub trait Message: Send + Sync + 'static {
    /// Returns the author of the message.
    fn author(&self) -> &Author;

    /// Returns the raw text content.
    fn content(&self) -> &str;

    /// Returns the guild the message was posted in, if any.
    ///
    /// Direct messages have no guild. The default implementation returns `None`.
    fn guild(&self) -> Option<&Guild> {
        None
    }

    /// Sends a reply to the channel the message came from.
    async fn reply(&self, content: &str) -> ApiResult<()>;

    /// Returns self as `&dyn Any` so handlers can reach transport-specific data.
    fn as_any(&self) -> &dyn Any;
}

/// A shared, type-erased message.
pub type BoxedMessage = Arc<dyn Message>;

impl dyn Message {
    /// Attempts to downcast to a concrete message type.
    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl std::fmt::Debug for dyn Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("author", self.author())
            .field("content", &self.content())
            .field("guild", &self.guild())
            .finish()
    }
}
