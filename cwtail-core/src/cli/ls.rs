use crate::cli::{CliContext, build_runtime};
use crate::list::Lister;
use crate::tail::SystemClock;
use anyhow::{Context, Result};
use clap::Subcommand;
use std::sync::Arc;

#[derive(Subcommand, Debug)]
pub enum LsCmd {
    /// Show all groups
    Groups {
        /// Only groups whose name starts with PREFIX
        #[arg(long, value_name = "PREFIX")]
        prefix: Option<String>,
    },

    /// Show all streams in a given log group
    Streams {
        /// The group name
        group: String,
    },
}

pub fn run_ls(cmd: LsCmd, ctx: &CliContext) -> Result<()> {
    let runtime = build_runtime()?;

    runtime.block_on(async {
        let lister = Lister::with_retry(
            Arc::new(ctx.backend()),
            Arc::new(SystemClock),
            ctx.config.tail_settings().unavailable_retry,
        );

        let (mut listing, what) = match cmd {
            LsCmd::Groups { prefix } => (lister.groups(prefix), "groups".to_string()),
            LsCmd::Streams { group } => {
                let what = format!("streams of '{group}'");
                (lister.streams(&group), what)
            }
        };

        while let Some(name) = listing.next().await {
            let name = name.with_context(|| format!("failed to list {what}"))?;
            println!("{name}");
        }

        Ok(())
    })
}
