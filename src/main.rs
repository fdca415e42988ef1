mod config;
mod graph;
mod handler;
mod logging;
mod mutual;
mod render;
mod roster;
mod table;

use anyhow::Context as _;
use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.resolve_token()?;
    let handler = handler::Handler::new(cfg);

    // Member lists are the only data we need beyond the guild roster itself.
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .context("Could not construct the Discord client")?
        .start()
        .await
        .context("Discord rejected the login; check that the token is valid")
}
