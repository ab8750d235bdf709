//! Deadline assignment on first admission

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use edfgpu_core::{
    Clock, EdfArgs, EdfGpuError, ObjectStore, Plugin, PreEnqueuePlugin, Status, SystemClock,
    WorkItem,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::deadline_store::{Assignment, DeadlineStore};
use crate::edf::EDF_PLUGIN_NAME;

/// Parse a requested duration such as `600`, `600s`, `10m` or `2h` into seconds.
///
/// Returns `None` for anything that does not match; the sign is preserved so
/// callers can reject non-positive values themselves.
pub fn parse_duration_secs(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (number, multiplier) = match raw.char_indices().last() {
        Some((i, 's')) => (&raw[..i], 1),
        Some((i, 'm')) => (&raw[..i], 60),
        Some((i, 'h')) => (&raw[..i], 3600),
        Some(_) => (raw, 1),
        None => return None,
    };
    number.parse::<i64>().ok()?.checked_mul(multiplier)
}

/// Parse an RFC 3339 deadline; empty or malformed values are `None`
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Wire format of a deadline annotation
pub fn format_deadline(deadline: DateTime<Utc>) -> String {
    deadline.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Pre-enqueue hook that stamps an absolute deadline on items lacking one
pub struct DeadlineAssigner {
    args: EdfArgs,
    store: DeadlineStore,
    clock: Arc<dyn Clock>,
}

impl DeadlineAssigner {
    /// Create an assigner using the system clock
    pub fn new(args: EdfArgs, store: Arc<dyn ObjectStore>) -> Self {
        Self::with_clock(args, store, Arc::new(SystemClock))
    }

    /// Create an assigner with an explicit time source
    pub fn with_clock(args: EdfArgs, store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>) -> Self {
        let timeout = Duration::from_millis(args.store_timeout_ms);
        Self {
            store: DeadlineStore::new(store, timeout),
            args,
            clock,
        }
    }

    /// Seconds until the deadline: the requested duration if valid, else the default
    pub fn requested_duration_secs(&self, item: &WorkItem) -> i64 {
        let requested = item
            .annotation(&self.args.duration_annotation)
            .and_then(parse_duration_secs);

        match requested {
            Some(secs) if secs > 0 => secs,
            _ => {
                debug!(
                    item = %item.key(),
                    requested = ?item.annotation(&self.args.duration_annotation),
                    default_secs = self.args.default_duration_secs,
                    "Using default deadline duration"
                );
                self.args.default_duration_secs
            }
        }
    }

    fn compute_deadline(&self, item: &WorkItem) -> DateTime<Utc> {
        let now = self.clock.now();
        let offset = |secs: i64| {
            chrono::Duration::try_seconds(secs).and_then(|d| now.checked_add_signed(d))
        };
        offset(self.requested_duration_secs(item))
            .or_else(|| offset(self.args.default_duration_secs))
            .unwrap_or(now)
    }
}

impl Plugin for DeadlineAssigner {
    fn name(&self) -> &str {
        EDF_PLUGIN_NAME
    }
}

#[async_trait]
impl PreEnqueuePlugin for DeadlineAssigner {
    async fn on_admission(&self, item: &mut WorkItem) -> Status {
        let key = self.args.deadline_annotation.clone();
        if item.annotation(&key).is_some_and(|v| !v.is_empty()) {
            debug!(item = %item.key(), "Deadline already assigned");
            return Status::success();
        }

        let value = format_deadline(self.compute_deadline(item));
        let mut retries_left = self.args.conflict_retries;

        loop {
            let outcome = self.store.try_assign_deadline(item, &key, &value).await;
            match outcome {
                Ok(Assignment::Written { version }) => {
                    info!(item = %item.key(), deadline = %value, "Assigned deadline");
                    item.annotations.insert(key, value);
                    item.version = version;
                    break;
                }
                Ok(Assignment::AlreadyPresent(existing)) => {
                    debug!(item = %item.key(), deadline = %existing, "Adopted existing deadline");
                    item.annotations.insert(key, existing);
                    break;
                }
                Err(EdfGpuError::Conflict { actual, .. }) if retries_left > 0 => {
                    retries_left -= 1;
                    debug!(
                        item = %item.key(),
                        version = actual,
                        retries_left = retries_left,
                        "Retrying deadline write after conflict"
                    );
                    item.version = actual;
                }
                Err(e) => {
                    // Admission must not wait on persistence; the comparator
                    // falls back to the default order for this item.
                    warn!(
                        item = %item.key(),
                        error = %e,
                        "Failed to persist deadline, admitting without it"
                    );
                    break;
                }
            }
        }

        Status::success()
    }
}
