//! Hello Bot Example
//!
//! A console bot: every line typed on stdin is treated as a chat message
//! from `--author`, and replies are printed to stdout.
//!
//! # Commands
//!
//! ```text
//! !hello [name]  - Greets you, or `name`
//! !hidden        - Only the guild owner may use it
//! !help          - Lists the commands
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package hello-bot -- --author alice --owner alice
//! ```
//!
//! Set `HERALD_BOT__PREFIX` or write a `herald.toml` to change the prefix.

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use futures::stream;
use herald::prelude::*;
use herald::runtime::ConfigLoader;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "hello-bot", about = "Console bot for the Herald dispatcher")]
struct Cli {
    /// Author id attached to every typed line.
    #[arg(long, default_value = "console")]
    author: String,

    /// Post lines inside a guild owned by this user id.
    #[arg(long)]
    owner: Option<String>,

    /// Configuration file to load instead of searching for `herald.toml`.
    #[arg(long)]
    config: Option<String>,
}

// ============================================================================
// Console transport
// ============================================================================

struct ConsoleMessage {
    author: Author,
    content: String,
    guild: Option<Guild>,
}

#[async_trait]
impl Message for ConsoleMessage {
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
        println!("< {content}");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

async fn hello(msg: BoxedMessage, args: Args) -> CommandResult<()> {
    let name = args.get(0).unwrap_or(msg.author().id.as_str());
    msg.reply(&format!("Hello, {name}!")).await?;
    Ok(())
}

async fn hidden(msg: BoxedMessage, _args: Args) -> CommandResult<()> {
    msg.reply("You found the hidden command.").await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = match &cli.config {
        Some(path) => ConfigLoader::new().file(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load()?;

    let commands = vec![
        Command::builder()
            .handler(hello)
            .usage("[name]")
            .build()?,
        Command::builder()
            .handler(hidden)
            .check(guild_owner_only())
            .build()?,
    ];

    let help_text = commands
        .iter()
        .map(|cmd| cmd.help_line(&config.bot.prefix))
        .chain([format!("{}help", config.bot.prefix)])
        .collect::<Vec<_>>()
        .join("\n");
    let help = Command::new("help", move |msg: BoxedMessage, _args: Args| {
        let help_text = help_text.clone();
        async move { msg.reply(&help_text).await }
    })?;

    let runtime = HeraldRuntime::from_config(
        &config,
        Dispatcher::builder()
            .commands(commands)
            .command(help)
            .error_handler(reply_with_error),
    )?;

    let author = cli.author;
    let guild = cli.owner.map(|owner| Guild::new("console", owner));
    let lines = BufReader::new(tokio::io::stdin()).lines();

    let messages = Box::pin(stream::unfold(lines, move |mut lines| {
        let author = author.clone();
        let guild = guild.clone();
        async move {
            let content = lines.next_line().await.ok().flatten()?;
            let message: BoxedMessage = Arc::new(ConsoleMessage {
                author: Author::user(author),
                content,
                guild,
            });
            Some((message, lines))
        }
    }));

    info!("Type commands, Ctrl+D to quit");
    let stats = runtime.run(messages).await?;
    info!(
        received = stats.received,
        invoked = stats.invoked,
        "Hello bot finished"
    );

    Ok(())
}
