//! Ranked report of call signs that have become available.
//!
//! Call signs are filtered by availability date and length, grouped by the
//! date they became available, and ranked within each group by CW weight
//! so the quickest-to-send calls come first.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::morse::{LookupError, weight};
use crate::record::CallSignAvailability;

/// Filters applied when building a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Earliest availability date to include (inclusive).
    pub min_date: NaiveDate,

    /// Exact call sign length, in characters.
    pub call_sign_length: usize,

    /// Maximum number of date groups to include.
    pub max_groups: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            min_date: NaiveDate::from_ymd_opt(2022, 4, 1).expect("valid default date"),
            call_sign_length: 4,
            max_groups: 20,
        }
    }
}

/// A call sign with its CW weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCallSign {
    pub call_sign: String,
    pub weight: u32,
}

/// Call signs that became available on the same date, lightest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub call_signs: Vec<RankedCallSign>,
}

/// Date groups in ascending date order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityReport {
    pub groups: Vec<DateGroup>,
}

impl AvailabilityReport {
    /// Whether the report has no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of call signs across all groups.
    pub fn call_sign_count(&self) -> usize {
        self.groups.iter().map(|g| g.call_signs.len()).sum()
    }
}

/// Build a report from an availability mapping.
///
/// Keeps call signs available on or after `min_date` with exactly
/// `call_sign_length` characters, groups them by date, keeps the first
/// `max_groups` dates, and sorts each group by ascending weight. Equal
/// weights keep the order in which the call signs were first parsed.
///
/// Only call signs in the kept groups are scored, so a [`LookupError`] is
/// returned only if one of those contains a symbol with no Morse code.
pub fn build_report(
    availability: &CallSignAvailability,
    options: &ReportOptions,
) -> Result<AvailabilityReport, LookupError> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&str>> = BTreeMap::new();
    for entry in availability {
        if entry.available >= options.min_date
            && entry.call_sign.chars().count() == options.call_sign_length
        {
            by_date
                .entry(entry.available)
                .or_default()
                .push(&entry.call_sign);
        }
    }

    let groups = by_date
        .into_iter()
        .take(options.max_groups)
        .map(|(date, call_signs)| rank_group(date, call_signs))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AvailabilityReport { groups })
}

/// Score and stable-sort one date group.
fn rank_group(date: NaiveDate, call_signs: Vec<&str>) -> Result<DateGroup, LookupError> {
    let mut ranked = call_signs
        .into_iter()
        .map(|call_sign| {
            Ok(RankedCallSign {
                call_sign: call_sign.to_string(),
                weight: weight(call_sign)?,
            })
        })
        .collect::<Result<Vec<_>, LookupError>>()?;
    ranked.sort_by_key(|r| r.weight);

    Ok(DateGroup {
        date,
        call_signs: ranked,
    })
}

impl fmt::Display for DateGroup {
    /// Two lines: the date and its call signs, then each weight
    /// right-aligned under its call sign.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self.date.to_string();

        write!(f, "{}", date)?;
        for ranked in &self.call_signs {
            write!(f, " {}", ranked.call_sign)?;
        }
        writeln!(f)?;

        write!(f, "{:width$}", "", width = date.len())?;
        for ranked in &self.call_signs {
            let width = ranked.call_sign.chars().count();
            write!(f, " {:>width$}", ranked.weight)?;
        }
        writeln!(f)
    }
}

impl fmt::Display for AvailabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            write!(f, "{}", group)?;
        }
        Ok(())
    }
}
