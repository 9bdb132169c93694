use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One "who brings what" record.
///
/// `id` is assigned when the entry is accepted and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub dish: String,
    pub who: String,
}

/// The full ordered list of entries, in insertion order.
pub type Menu = Vec<Entry>;

/// Body of `POST /api/menu`.
///
/// Missing fields decode as empty strings so that `{}` is reported as a
/// validation failure rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEntry {
    #[serde(default)]
    pub dish: String,
    #[serde(default)]
    pub who: String,
}

impl NewEntry {
    pub fn is_complete(&self) -> bool {
        !self.dish.is_empty() && !self.who.is_empty()
    }

    pub fn into_entry(self, id: String) -> Entry {
        Entry {
            id,
            dish: self.dish,
            who: self.who,
        }
    }
}

/// Hands out entry ids derived from the UTC clock in nanoseconds.
///
/// When the clock has not moved past the last issued value the id is bumped
/// to `last + 1`, so ids stay strictly increasing within the process.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let now = clock_nanos();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);

        now.max(prev + 1).to_string()
    }
}

fn clock_nanos() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
}
