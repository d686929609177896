//! Continuous, ordered tailing of one log group.

pub mod backoff;
mod cancel;
mod clock;
mod cursor;
mod enumerator;
mod error;
mod fetcher;
mod filter;
mod scheduler;
mod seen;
mod settings;

#[cfg(test)]
mod tests;

pub use cancel::{CancelHandle, CancelSignal};
pub use clock::{Clock, ManualClock, SystemClock};
pub use enumerator::{StreamEnumerator, StreamPattern};
pub use error::{TailError, TailWarning};
pub use fetcher::{EventFetcher, FetchedPage};
pub use filter::{EventFilter, FilterSyntax};
pub use scheduler::{MergeScheduler, SessionStats, TailItem, TailRequest, TailSession};
pub use settings::TailSettings;
