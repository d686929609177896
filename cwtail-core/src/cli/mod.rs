//! Command-line surface of `cwtail`.
//!
//! Argument types live here so the binary stays a thin dispatcher. Every
//! command reads its store through the file backend.

mod config;
mod context;
mod ls;
mod render;
mod tail;
mod time;

pub use config::{ConfigCmd, check, dump};
pub use context::CliContext;
pub use ls::{LsCmd, run_ls};
pub use render::{RenderOptions, render_event, render_warning};
pub use tail::{TailArgs, run_tail};
pub use time::parse_time;

use anyhow::{Context, Result};
use tokio::runtime::{Builder, Runtime};

fn build_runtime() -> Result<Runtime> {
    Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build Tokio runtime")
}
