//! An in-memory [`Message`] implementation.
//!
//! `LocalMessage` records every reply it is asked to send instead of handing it
//! to a transport. It backs unit tests and is handy for local tooling that
//! feeds commands to a dispatcher without a live connection.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{ApiError, ApiResult};
use crate::message::{Author, Guild, Message};

/// An owned message whose replies are collected in memory.
///
/// Cloning a `LocalMessage` shares the reply log.
#[derive(Debug, Clone)]
pub struct LocalMessage {
    author: Author,
    content: String,
    guild: Option<Guild>,
    replies: Arc<Mutex<Vec<String>>>,
    disconnected: bool,
}

impl LocalMessage {
    /// Creates a message from `author` with the given content, outside any guild.
    pub fn new(author: Author, content: impl Into<String>) -> Self {
        Self {
            author,
            content: content.into(),
            guild: None,
            replies: Arc::new(Mutex::new(Vec::new())),
            disconnected: false,
        }
    }

    /// Places the message in a guild.
    pub fn in_guild(mut self, guild: Guild) -> Self {
        self.guild = Some(guild);
        self
    }

    /// Makes every reply fail with [`ApiError::NotConnected`].
    pub fn disconnected(mut self) -> Self {
        self.disconnected = true;
        self
    }

    /// Returns a snapshot of the replies sent so far.
    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().clone()
    }

    /// Returns the number of replies sent so far.
    pub fn reply_count(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl Message for LocalMessage {
    fn author(&self) -> &Author {
        &self.author
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn guild(&self) -> Option<&Guild> {
        self.guild.as_ref()
    }

    async fn reply(&self, content: &str) -> ApiResult<()> {
        if self.disconnected {
            return Err(ApiError::NotConnected);
        }
        self.replies.lock().push(content.to_string());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
