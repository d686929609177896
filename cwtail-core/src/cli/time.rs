use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:T(\d{2})(?::(\d{2})(?::(\d{2}))?)?)?$")
        .expect("date-time pattern is valid")
});

static CLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})(?::(\d{2}))?$").expect("clock pattern is valid")
});

/// Parses a UTC time argument.
///
/// Accepted: `YYYY-MM-DD`, `YYYY-MM-DDTHH`, `YYYY-MM-DDTHH:MM`,
/// `YYYY-MM-DDTHH:MM:SS`, and `HH` or `HH:MM`, which mean that time today.
pub fn parse_time(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    let (date, hour, minute, second) = if let Some(caps) = DATE_TIME.captures(raw) {
        let date = NaiveDate::from_ymd_opt(
            number(&caps, 1).unwrap_or(0) as i32,
            number(&caps, 2).unwrap_or(0),
            number(&caps, 3).unwrap_or(0),
        )
        .ok_or_else(|| anyhow!("invalid date '{raw}'"))?;
        (
            date,
            number(&caps, 4).unwrap_or(0),
            number(&caps, 5).unwrap_or(0),
            number(&caps, 6).unwrap_or(0),
        )
    } else if let Some(caps) = CLOCK.captures(raw) {
        (
            now.date_naive(),
            number(&caps, 1).unwrap_or(0),
            number(&caps, 2).unwrap_or(0),
            0,
        )
    } else {
        bail!(
            "unrecognised time '{raw}' (expected YYYY-MM-DD[THH[:MM[:SS]]] or HH[:MM])"
        );
    };

    date.and_hms_opt(hour, minute, second)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow!("invalid time of day in '{raw}'"))
}

fn number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}
