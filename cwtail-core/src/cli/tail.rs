use crate::cli::render::{RenderOptions, render_event, render_warning};
use crate::cli::time::parse_time;
use crate::cli::{CliContext, build_runtime};
use crate::model::TimeWindow;
use crate::tail::{
    CancelHandle, EventFilter, FilterSyntax, MergeScheduler, TailError, TailItem, TailRequest,
};
use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::Args;
use std::io::{self, ErrorKind, IsTerminal, Write};
use std::sync::Arc;

/// How far back a tail starts when no start time is given.
const DEFAULT_LOOKBACK: TimeDelta = TimeDelta::seconds(30);

#[derive(Args, Debug)]
pub struct TailArgs {
    /// The log group name
    pub group: String,

    /// Stream name, `prefix*` or glob. `*` tails every stream in the group
    #[arg(default_value = "*")]
    pub stream: String,

    /// Start time in UTC: YYYY-MM-DD[THH[:MM[:SS]]], or HH[:MM] for today.
    /// Defaults to 30 seconds ago
    pub start: Option<String>,

    /// End time in UTC, same formats as start
    pub end: Option<String>,

    /// Don't stop at the end of the data; wait for more
    #[arg(short, long)]
    pub follow: bool,

    /// Print the event timestamp
    #[arg(short = 't', long)]
    pub timestamp: bool,

    /// Print the event id
    #[arg(short = 'i', long = "event-id")]
    pub event_id: bool,

    /// Print the stream name each event belongs to
    #[arg(short = 's', long = "stream-name")]
    pub stream_name: bool,

    /// Only print events whose message contains PATTERN
    #[arg(short, long, value_name = "PATTERN")]
    pub grep: Option<String>,

    /// Treat the grep pattern as a regular expression
    #[arg(long)]
    pub regex: bool,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,
}

impl TailArgs {
    fn request(&self, ctx: &CliContext) -> Result<TailRequest> {
        let now = Utc::now();
        let start = match &self.start {
            Some(raw) => parse_time(raw, now)?,
            None => now - DEFAULT_LOOKBACK,
        };
        let end = self
            .end
            .as_deref()
            .map(|raw| parse_time(raw, now))
            .transpose()?;

        let syntax = if self.regex {
            FilterSyntax::Regex
        } else {
            ctx.config.tail.filter_syntax
        };
        let filter = self
            .grep
            .as_deref()
            .filter(|pattern| !pattern.is_empty())
            .map(|pattern| EventFilter::new(pattern, syntax))
            .transpose()?;

        Ok(TailRequest {
            group: self.group.clone(),
            stream_pattern: self.stream.clone(),
            window: TimeWindow::new(Some(start), end)?,
            follow: self.follow,
            filter,
        })
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            timestamp: self.timestamp,
            stream: self.stream_name,
            event_id: self.event_id,
            color: !self.no_color && io::stdout().is_terminal(),
        }
    }
}

pub fn run_tail(args: TailArgs, ctx: &CliContext) -> Result<()> {
    let request = args.request(ctx)?;
    let options = args.render_options();

    let cancel = CancelHandle::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    let runtime = build_runtime()?;
    runtime.block_on(print_events(ctx, request, options, cancel))
}

async fn print_events(
    ctx: &CliContext,
    request: TailRequest,
    options: RenderOptions,
    cancel: CancelHandle,
) -> Result<()> {
    let group = request.group.clone();
    let scheduler = MergeScheduler::new(Arc::new(ctx.backend()), ctx.config.tail_settings());
    let mut session = match scheduler.tail(request, cancel.signal()).await {
        Ok(session) => session,
        Err(TailError::Cancelled) => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("failed to tail group '{group}'")),
    };

    let stdout = io::stdout();
    while let Some(item) = session.next().await {
        match item {
            TailItem::Event(event) => {
                let line = render_event(&event, &options);
                if let Err(e) = writeln!(stdout.lock(), "{line}") {
                    if e.kind() == ErrorKind::BrokenPipe {
                        // Reader went away, e.g. `| head`.
                        cancel.cancel();
                        break;
                    }
                    return Err(e).context("failed to write event");
                }
            }
            TailItem::Warning(warning) => {
                eprintln!("{}", render_warning(&warning, options.color));
            }
        }
    }

    let stats = session.stats();
    tracing::debug!(
        group = %group,
        cycles = stats.cycles,
        fetched = stats.fetched,
        emitted = stats.emitted,
        duplicates = stats.duplicates,
        filtered = stats.filtered,
        late = stats.late,
        throttled = stats.throttled,
        dropped_streams = stats.dropped_streams,
        "tail ended"
    );

    Ok(())
}
