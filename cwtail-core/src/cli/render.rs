use crate::model::LogEvent;
use crate::tail::TailWarning;
use owo_colors::OwoColorize;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub timestamp: bool,
    pub stream: bool,
    pub event_id: bool,
    pub color: bool,
}

/// One output line: `[timestamp - ][stream - ][id - ]message`.
pub fn render_event(event: &LogEvent, options: &RenderOptions) -> String {
    let mut line = String::new();

    if options.timestamp {
        let ts = event.timestamp.format(TIMESTAMP_FORMAT).to_string();
        push_field(&mut line, &ts, options.color, |s| s.green().to_string());
    }
    if options.stream {
        push_field(&mut line, &event.stream, options.color, |s| {
            s.blue().to_string()
        });
    }
    if options.event_id {
        push_field(&mut line, &event.id.0, options.color, |s| {
            s.yellow().to_string()
        });
    }

    line.push_str(event.message.trim_end_matches(['\r', '\n']));
    line
}

pub fn render_warning(warning: &TailWarning, color: bool) -> String {
    if color {
        format!("{}: {warning}", "warning".yellow().bold())
    } else {
        format!("warning: {warning}")
    }
}

fn push_field(line: &mut String, value: &str, color: bool, paint: fn(&str) -> String) {
    if color {
        line.push_str(&paint(value));
    } else {
        line.push_str(value);
    }
    line.push_str(" - ");
}
