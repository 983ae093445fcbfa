use std::sync::Arc;

use herald_core::{Author, BoxedMessage, Guild, LocalMessage};

pub(crate) fn user_message(author_id: &str, content: &str) -> LocalMessage {
    LocalMessage::new(Author::user(author_id), content)
}

pub(crate) fn bot_message(author_id: &str, content: &str) -> LocalMessage {
    LocalMessage::new(Author::bot(author_id), content)
}

pub(crate) fn guild_message(author_id: &str, owner_id: &str, content: &str) -> LocalMessage {
    user_message(author_id, content).in_guild(Guild::new("guild", owner_id))
}

pub(crate) fn boxed_user_message(author_id: &str, content: &str) -> BoxedMessage {
    Arc::new(user_message(author_id, content))
}
