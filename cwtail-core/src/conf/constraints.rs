use crate::conf::types::{BackoffOverride, CwtailConfig};

#[derive(Debug, Clone)]
pub struct RangeConstraint<T> {
    pub min: T,
    pub max: T,
    pub label: &'static str,
    pub units: Option<&'static str>,
}

pub const POLL_INTERVAL_MS: RangeConstraint<u64> = RangeConstraint {
    min: 10,
    max: 60 * 60 * 1000,
    label: "tail.poll_interval_ms",
    units: Some("ms"),
};

pub const PAGE_BUDGET: RangeConstraint<usize> = RangeConstraint {
    min: 1,
    max: 1_000,
    label: "tail.page_budget",
    units: None,
};

pub const EVENT_PAGE_SIZE: RangeConstraint<usize> = RangeConstraint {
    min: 1,
    max: 10_000,
    label: "tail.page_size",
    units: None,
};

pub const REFRESH_EVERY_CYCLES: RangeConstraint<u64> = RangeConstraint {
    min: 1,
    max: 10_000,
    label: "tail.refresh_every_cycles",
    units: None,
};

pub const CANCEL_GRACE_MS: RangeConstraint<u64> = RangeConstraint {
    min: 0,
    max: 60 * 1000,
    label: "tail.cancel_grace_ms",
    units: Some("ms"),
};

pub const STORE_PAGE_SIZE: RangeConstraint<usize> = RangeConstraint {
    min: 1,
    max: 10_000,
    label: "store.page_size",
    units: None,
};

const BACKOFF_MAX_RETRIES: RangeConstraint<u32> = RangeConstraint {
    min: 0,
    max: 100,
    label: "max_retries",
    units: None,
};

const BACKOFF_DELAY_MS: RangeConstraint<u64> = RangeConstraint {
    min: 1,
    max: 60 * 60 * 1000,
    label: "delay",
    units: Some("ms"),
};

const BACKOFF_MULTIPLIER: RangeConstraint<f64> = RangeConstraint {
    min: 1.0,
    max: 10.0,
    label: "multiplier",
    units: None,
};

pub fn validate_range<T>(value: T, constraint: &RangeConstraint<T>, errors: &mut Vec<String>)
where
    T: PartialOrd + std::fmt::Display,
{
    validate_labelled(value, constraint, constraint.label, errors);
}

fn validate_labelled<T>(
    value: T,
    constraint: &RangeConstraint<T>,
    label: &str,
    errors: &mut Vec<String>,
) where
    T: PartialOrd + std::fmt::Display,
{
    if value < constraint.min || value > constraint.max {
        let units = constraint.units.unwrap_or("");
        errors.push(format!(
            "invalid {}: {}{} (must be between {}{} and {}{})",
            label, value, units, constraint.min, units, constraint.max, units
        ));
    }
}

fn validate_backoff(section: &str, policy: &BackoffOverride, errors: &mut Vec<String>) {
    if let Some(max_retries) = policy.max_retries {
        let label = format!("{section}.max_retries");
        validate_labelled(max_retries, &BACKOFF_MAX_RETRIES, &label, errors);
    }
    if let Some(initial) = policy.initial_delay_ms {
        let label = format!("{section}.initial_delay_ms");
        validate_labelled(initial, &BACKOFF_DELAY_MS, &label, errors);
    }
    if let Some(max) = policy.max_delay_ms {
        let label = format!("{section}.max_delay_ms");
        validate_labelled(max, &BACKOFF_DELAY_MS, &label, errors);
    }
    if let Some(multiplier) = policy.multiplier {
        let label = format!("{section}.multiplier");
        validate_labelled(multiplier, &BACKOFF_MULTIPLIER, &label, errors);
    }
    if let (Some(initial), Some(max)) = (policy.initial_delay_ms, policy.max_delay_ms) {
        if initial > max {
            errors.push(format!(
                "invalid {section}: initial_delay_ms {initial}ms exceeds max_delay_ms {max}ms"
            ));
        }
    }
}

/// Checks every bounded field and returns all violations at once.
pub fn validate_config(config: &CwtailConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let tail = &config.tail;

    validate_range(tail.poll_interval_ms, &POLL_INTERVAL_MS, &mut errors);
    validate_range(tail.page_budget, &PAGE_BUDGET, &mut errors);
    if let Some(page_size) = tail.page_size {
        validate_range(page_size, &EVENT_PAGE_SIZE, &mut errors);
    }
    validate_range(tail.refresh_every_cycles, &REFRESH_EVERY_CYCLES, &mut errors);
    validate_range(tail.cancel_grace_ms, &CANCEL_GRACE_MS, &mut errors);
    validate_range(config.store.page_size, &STORE_PAGE_SIZE, &mut errors);

    validate_backoff("throttle_backoff", &config.throttle_backoff, &mut errors);
    validate_backoff("unavailable_retry", &config.unavailable_retry, &mut errors);

    errors
}
