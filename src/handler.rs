use crate::{
    config::Config,
    log_internal,
    logging::{PrintColor, RunLog},
    roster::{GuildRoster, MemberTag},
};
use anyhow::Result;
use serenity::all::{Context, Ready};
use std::collections::BTreeSet;

/// Discord event handler.  The whole run happens inside `ready`: resolve
/// every guild, compute mutual membership, render the dashboard, disconnect.
pub struct Handler {
    cfg: Config,
}

impl Handler {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    async fn run(&self, ctx: &Context, ready: &Ready) -> Result<()> {
        log_internal!("Logged in as {}", ready.user.color());

        let owner = MemberTag::new(&ready.user.name, ready.user.discriminator);
        let guild_ids: Vec<_> = ready.guilds.iter().map(|g| g.id).collect();
        log_internal!("Checking mutual guilds for {} guilds", guild_ids.len());

        let mut log = RunLog::new();
        let roster =
            GuildRoster::collect(&ctx.http, &guild_ids, &owner, &mut log).await;
        log.note("Finished processing guilds. Performing post processing");

        let mutual = crate::mutual::compute(&roster.membership);
        let table = crate::table::format(&mutual);

        // Default view shows every guild appearing in some mutual set; the
        // dashboard's checkboxes narrow it from there.
        let guild_choices: BTreeSet<String> =
            mutual.values().flatten().cloned().collect();
        let spec = crate::graph::build(
            &mutual,
            &roster,
            &guild_choices,
            &self.cfg.graph,
            &mut rand::thread_rng(),
        );

        let path = crate::render::write_dashboard(
            &self.cfg,
            &log,
            &table,
            &spec,
            &guild_choices,
        )
        .await?;

        log_internal!(
            "Found {} members sharing more than one guild",
            mutual.len()
        );
        log_internal!("Dashboard written to `{}`", path.to_string_lossy());
        Ok(())
    }
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        if let Err(err) = self.run(&ctx, &ready).await {
            eprintln!("Error: {:#}", err);
        }

        // One-shot tool: disconnect once the dashboard is written.
        ctx.shard.shutdown_clean();
    }
}
