//! License record and availability types.
//!
//! A [`CallSignRecord`] is what a single `HD` line yields. Records are
//! folded into a [`CallSignAvailability`], which keeps the latest
//! availability date seen for each call sign.

use std::collections::HashMap;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Months between a license lapsing and the call sign being reissued.
const GRACE_PERIOD: Months = Months::new(24);

/// License dates extracted from one `HD` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignRecord {
    pub call_sign: String,
    pub expired: Option<NaiveDate>,
    pub cancelled: Option<NaiveDate>,
}

impl CallSignRecord {
    /// Date the call sign becomes available again.
    ///
    /// The lapse date is the cancellation date when it falls strictly before
    /// the expiration date, otherwise the expiration date. Availability is
    /// two years and one day after the lapse; a Feb 29 lapse clamps to
    /// Feb 28 before the extra day is added.
    ///
    /// Returns `None` when the record has no expiration date.
    pub fn availability_date(&self) -> Option<NaiveDate> {
        let expired = self.expired?;
        let lapsed = match self.cancelled {
            Some(cancelled) if cancelled < expired => cancelled,
            _ => expired,
        };
        available_after(lapsed)
    }
}

/// Two years and one day after `lapsed`.
pub fn available_after(lapsed: NaiveDate) -> Option<NaiveDate> {
    lapsed
        .checked_add_months(GRACE_PERIOD)?
        .checked_add_days(Days::new(1))
}

/// One call sign and its availability date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSignEntry {
    pub call_sign: String,
    pub available: NaiveDate,
}

/// Availability date per call sign.
///
/// Dates only ever move forward: merging an earlier date for a known call
/// sign is a no-op. Iteration follows the order in which call signs were
/// first merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CallSignEntry>", into = "Vec<CallSignEntry>")]
pub struct CallSignAvailability {
    entries: Vec<CallSignEntry>,
    index: HashMap<String, usize>,
}

impl CallSignAvailability {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an availability date, keeping the later of the stored and new
    /// dates.
    ///
    /// Returns true if the mapping changed.
    pub fn merge(&mut self, call_sign: &str, available: NaiveDate) -> bool {
        match self.index.get(call_sign) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                if available > entry.available {
                    entry.available = available;
                    true
                } else {
                    false
                }
            }
            None => {
                self.index.insert(call_sign.to_string(), self.entries.len());
                self.entries.push(CallSignEntry {
                    call_sign: call_sign.to_string(),
                    available,
                });
                true
            }
        }
    }

    /// Availability date for a call sign.
    pub fn get(&self, call_sign: &str) -> Option<NaiveDate> {
        self.index.get(call_sign).map(|&i| self.entries[i].available)
    }

    /// Number of distinct call signs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &CallSignEntry> {
        self.entries.iter()
    }
}

impl From<Vec<CallSignEntry>> for CallSignAvailability {
    fn from(entries: Vec<CallSignEntry>) -> Self {
        let mut availability = Self::new();
        for entry in entries {
            availability.merge(&entry.call_sign, entry.available);
        }
        availability
    }
}

impl From<CallSignAvailability> for Vec<CallSignEntry> {
    fn from(availability: CallSignAvailability) -> Self {
        availability.entries
    }
}

impl<'a> IntoIterator for &'a CallSignAvailability {
    type Item = &'a CallSignEntry;
    type IntoIter = std::slice::Iter<'a, CallSignEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
