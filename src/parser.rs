//! Parser for FCC ULS `HD` (application/license header) records.
//!
//! This module uses the `nom` parsing library to pull the call sign and
//! license dates out of each pipe-delimited line, then folds the derived
//! availability dates into a [`CallSignAvailability`].
//!
//! # Record Format
//!
//! Only the first ten fields matter:
//! ```text
//! HD|SYS_ID|FILE_NUM|EBF_NUM|CALL|STATUS|SERVICE|GRANTED|EXPIRED|CANCELLED|...
//! ```
//!
//! Example:
//! ```text
//! HD|4302|0000012345||K1ABC|E|HA|03/01/2010|03/01/2020|||||
//! ```
//!
//! Dates are `MM/DD/YYYY`. Lines that do not have this layout are skipped;
//! a date field that is present but not a real calendar date aborts the
//! whole parse.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::NaiveDate;
use nom::{
    IResult, Parser,
    bytes::complete::{take, take_while, take_while_m_n},
    character::complete::char,
    combinator::map_res,
    multi::fold_many_m_n,
    sequence::terminated,
};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::record::{CallSignAvailability, CallSignRecord};
use crate::stats::ParseStats;

/// Which license date a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Expired,
    Cancelled,
}

impl std::fmt::Display for DateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateField::Expired => write!(f, "expiration"),
            DateField::Cancelled => write!(f, "cancellation"),
        }
    }
}

/// A date field that is not a valid `MM/DD/YYYY` calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field} date: {value:?}")]
pub struct DateFormatError {
    pub field: DateField,
    pub value: String,
}

/// Errors that can occur while parsing license data.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Line {line}: {source}")]
    DateFormat {
        line: u64,
        #[source]
        source: DateFormatError,
    },

    #[error("Failed to read license data: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Raw field slices of interest from one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawFields<'a> {
    call_sign: &'a str,
    expired: &'a str,
    cancelled: &'a str,
}

/// Parse the contents of one field, up to but not including the next `|`.
fn field(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c != '|').parse(input)
}

/// Parse one field and its trailing delimiter.
fn delimited_field(input: &str) -> IResult<&str, &str> {
    terminated(field, char('|')).parse(input)
}

/// Skip `n` delimited fields without collecting them.
fn skip_fields(input: &str, n: usize) -> IResult<&str, ()> {
    fold_many_m_n(n, n, delimited_field, || (), |(), _| ()).parse(input)
}

/// Extract the call sign, expiration and cancellation fields.
///
/// The cancellation field runs to the next delimiter or the end of input.
fn parse_fields(input: &str) -> IResult<&str, RawFields<'_>> {
    let (input, _) = skip_fields(input, 4)?;
    let (input, call_sign) = delimited_field(input)?;
    let (input, _) = skip_fields(input, 3)?;
    let (input, expired) = delimited_field(input)?;
    let (input, cancelled) = field(input)?;

    Ok((
        input,
        RawFields {
            call_sign,
            expired,
            cancelled,
        },
    ))
}

/// Parse exactly `n` ASCII digits.
fn digits(input: &str, n: usize) -> IResult<&str, u32> {
    map_res(take_while_m_n(n, n, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u32>()
    })
    .parse(input)
}

/// Parse `MM?DD?YYYY` into its components. Separators can be any single
/// character and anything after the year is ignored.
fn parse_date_parts(input: &str) -> IResult<&str, (i32, u32, u32)> {
    let (input, month) = digits(input, 2)?;
    let (input, _) = take(1usize).parse(input)?;
    let (input, day) = digits(input, 2)?;
    let (input, _) = take(1usize).parse(input)?;
    let (input, year) = digits(input, 4)?;
    Ok((input, (year as i32, month, day)))
}

/// Parse a license date field.
///
/// # Example
///
/// ```
/// use callsign_availability::parser::{parse_date, DateField};
/// use chrono::NaiveDate;
///
/// let date = parse_date("03/01/2020", DateField::Expired).unwrap();
/// assert_eq!(date, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
/// assert!(parse_date("13/01/2020", DateField::Expired).is_err());
/// assert!(parse_date("01/01/0000", DateField::Expired).is_err());
/// ```
pub fn parse_date(value: &str, field: DateField) -> Result<NaiveDate, DateFormatError> {
    parse_date_parts(value)
        .ok()
        // Calendar years start at 1
        .filter(|(_, (year, _, _))| *year >= 1)
        .and_then(|(_, (year, month, day))| NaiveDate::from_ymd_opt(year, month, day))
        .ok_or_else(|| DateFormatError {
            field,
            value: value.to_string(),
        })
}

/// Parse one line into a [`CallSignRecord`].
///
/// Returns `Ok(None)` when the line does not have the `HD` field layout.
/// Empty date fields become `None`; non-empty ones must be valid dates.
/// The cancellation field is ignored when there is no expiration date.
pub fn parse_record(line: &str) -> Result<Option<CallSignRecord>, DateFormatError> {
    let Ok((_, fields)) = parse_fields(line) else {
        return Ok(None);
    };

    let expired = match fields.expired {
        "" => None,
        raw => Some(parse_date(raw, DateField::Expired)?),
    };
    // Cancellation is only read once there is an expiration to compare it to
    let cancelled = match (expired, fields.cancelled) {
        (None, _) | (_, "") => None,
        (Some(_), raw) => Some(parse_date(raw, DateField::Cancelled)?),
    };

    Ok(Some(CallSignRecord {
        call_sign: fields.call_sign.to_string(),
        expired,
        cancelled,
    }))
}

/// Result of parsing a full input.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub availability: CallSignAvailability,
    pub stats: ParseStats,
}

/// Incremental parser that folds lines into a [`CallSignAvailability`].
#[derive(Debug, Default)]
pub struct AvailabilityParser {
    availability: CallSignAvailability,
    stats: ParseStats,
}

impl AvailabilityParser {
    /// Create a parser with an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters so far.
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Mapping built so far.
    pub fn availability(&self) -> &CallSignAvailability {
        &self.availability
    }

    /// Process one raw line. A trailing line ending is ignored.
    pub fn push_line(&mut self, line: &str) -> ParseResult<()> {
        self.stats.lines_read += 1;
        self.stats.bytes_processed += line.len() as u64;
        let line = line.trim_end_matches(['\r', '\n']);

        let record = parse_record(line).map_err(|source| ParseError::DateFormat {
            line: self.stats.lines_read,
            source,
        })?;

        let Some(record) = record else {
            self.stats.malformed_lines += 1;
            trace!("Skipping malformed line {}", self.stats.lines_read);
            return Ok(());
        };
        self.stats.lines_matched += 1;

        let Some(available) = record.availability_date() else {
            self.stats.missing_expiration += 1;
            return Ok(());
        };

        if record.call_sign.is_empty() {
            self.stats.missing_call_sign += 1;
            debug!(
                "Skipping record without call sign on line {}",
                self.stats.lines_read
            );
            return Ok(());
        }

        if self.availability.merge(&record.call_sign, available) {
            self.stats.records_merged += 1;
        }
        Ok(())
    }

    /// Returns the line count if it falls on a progress checkpoint.
    ///
    /// An interval of 0 disables checkpoints.
    pub fn checkpoint(&self, interval: u64) -> Option<u64> {
        let lines = self.stats.lines_read;
        (interval != 0 && lines % interval == 0).then_some(lines)
    }

    /// Finish parsing and return the mapping with its counters.
    pub fn finish(self) -> ParseOutcome {
        ParseOutcome {
            availability: self.availability,
            stats: self.stats,
        }
    }
}

/// Parse lines into a call sign availability mapping.
///
/// # Example
///
/// ```
/// use callsign_availability::parser::parse_lines;
///
/// let lines = [
///     "HD|1|0001||K1ABC|E|HA|03/01/2010|03/01/2020||",
///     "not a license record",
/// ];
/// let availability = parse_lines(lines).unwrap();
/// assert_eq!(availability.get("K1ABC").unwrap().to_string(), "2022-03-02");
/// ```
pub fn parse_lines<I, S>(lines: I) -> ParseResult<CallSignAvailability>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_lines_with_progress(lines, 0, |_| {}).map(|outcome| outcome.availability)
}

/// Parse lines, calling `on_progress` with the running line count every
/// `interval` lines (0 disables progress).
pub fn parse_lines_with_progress<I, S, F>(
    lines: I,
    interval: u64,
    mut on_progress: F,
) -> ParseResult<ParseOutcome>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(u64),
{
    let mut parser = AvailabilityParser::new();
    for line in lines {
        parser.push_line(line.as_ref())?;
        if let Some(lines_read) = parser.checkpoint(interval) {
            on_progress(lines_read);
        }
    }
    Ok(parser.finish())
}

/// Parse an `HD.dat` file from disk.
///
/// Invalid UTF-8 is replaced rather than rejected, since only the ASCII
/// call sign and date fields are used.
pub fn parse_file(path: &Path, progress_interval: u64) -> ParseResult<ParseOutcome> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    info!("Parsing {}", path.display());

    let mut parser = AvailabilityParser::new();
    let mut buf = Vec::with_capacity(512);
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        parser.push_line(&String::from_utf8_lossy(&buf))?;
        if let Some(lines_read) = parser.checkpoint(progress_interval) {
            info!("Current line: {}", lines_read);
        }
    }

    info!("Finished parsing {}", path.display());
    Ok(parser.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hd_line(call: &str, expired: &str, cancelled: &str) -> String {
        format!("HD|1234|0000012345||{call}|E|HA|01/15/2010|{expired}|{cancelled}|||||||")
    }

    #[test]
    fn test_parse_fields() {
        let line = hd_line("K1ABC", "03/01/2020", "02/01/2019");
        let (_, fields) = parse_fields(&line).unwrap();
        assert_eq!(fields.call_sign, "K1ABC");
        assert_eq!(fields.expired, "03/01/2020");
        assert_eq!(fields.cancelled, "02/01/2019");
    }

    #[test]
    fn test_parse_fields_cancellation_at_end_of_line() {
        let line = "HD|1|2|3|W1AW|A|HA|01/01/2010|01/01/2020|06/01/2019";
        let (_, fields) = parse_fields(line).unwrap();
        assert_eq!(fields.call_sign, "W1AW");
        assert_eq!(fields.cancelled, "06/01/2019");
    }

    #[test]
    fn test_parse_fields_too_few_delimiters() {
        assert!(parse_fields("HD|1|2|3|W1AW|A|HA|01/01/2010").is_err());
        assert!(parse_fields("").is_err());
        assert!(parse_fields("just some text").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("02/29/2020", DateField::Expired).unwrap(),
            date(2020, 2, 29)
        );
        // Separators are positional, not literal
        assert_eq!(
            parse_date("12-31-1999", DateField::Expired).unwrap(),
            date(1999, 12, 31)
        );
    }

    #[test]
    fn test_parse_date_errors() {
        let bad_dates = [
            "13/01/2020",
            "02/30/2021",
            "00/10/2020",
            "1/1/2020",
            "03/01/20",
            "ab/cd/efgh",
            "01/01/0000",
        ];
        for bad in bad_dates {
            let err = parse_date(bad, DateField::Cancelled).unwrap_err();
            assert_eq!(err.field, DateField::Cancelled);
            assert_eq!(err.value, bad);
        }
    }

    #[test]
    fn test_skip_fields() {
        let (rest, ()) = skip_fields("HD|1|2|K1ABC|", 3).unwrap();
        assert_eq!(rest, "K1ABC|");
        assert!(skip_fields("HD|1|2", 3).is_err());
        assert_eq!(skip_fields("HD|", 0).unwrap().0, "HD|");
    }

    #[test]
    fn test_parse_record() {
        let record = parse_record(&hd_line("K1ABC", "03/01/2020", ""))
            .unwrap()
            .unwrap();
        assert_eq!(record.call_sign, "K1ABC");
        assert_eq!(record.expired, Some(date(2020, 3, 1)));
        assert_eq!(record.cancelled, None);
    }

    #[test]
    fn test_parse_record_malformed_is_none() {
        assert_eq!(parse_record("EN|1|2|3").unwrap(), None);
    }

    #[test]
    fn test_parse_record_bad_cancellation() {
        let err = parse_record(&hd_line("K1ABC", "03/01/2020", "99/99/2020")).unwrap_err();
        assert_eq!(err.field, DateField::Cancelled);
    }

    #[test]
    fn test_parse_record_ignores_cancellation_without_expiration() {
        let record = parse_record(&hd_line("K1ABC", "", "garbage"))
            .unwrap()
            .unwrap();
        assert_eq!(record.expired, None);
        assert_eq!(record.cancelled, None);
    }

    #[test]
    fn test_parse_lines_precedence() {
        let lines = [
            hd_line("AAAA", "01/01/2020", "12/31/2019"),
            hd_line("BBBB", "01/01/2020", "06/01/2020"),
            hd_line("CCCC", "02/29/2020", ""),
        ];
        let availability = parse_lines(&lines).unwrap();
        assert_eq!(availability.get("AAAA"), Some(date(2022, 1, 1)));
        assert_eq!(availability.get("BBBB"), Some(date(2022, 1, 2)));
        assert_eq!(availability.get("CCCC"), Some(date(2022, 3, 1)));
    }

    #[test]
    fn test_parse_lines_keeps_latest_date() {
        let lines = [
            hd_line("K1ABC", "01/01/2020", ""),
            hd_line("K1ABC", "01/01/2015", ""),
        ];
        let availability = parse_lines(&lines).unwrap();
        assert_eq!(availability.len(), 1);
        assert_eq!(availability.get("K1ABC"), Some(date(2022, 1, 2)));
    }

    #[test]
    fn test_parse_lines_skips_missing_expiration_and_malformed() {
        let lines = [
            "header line".to_string(),
            hd_line("K1ABC", "", "01/01/2019"),
            hd_line("", "01/01/2020", ""),
            hd_line("W1AW", "01/01/2020", ""),
        ];
        let outcome = parse_lines_with_progress(&lines, 0, |_| {}).unwrap();
        assert_eq!(outcome.availability.len(), 1);
        assert!(outcome.availability.get("K1ABC").is_none());
        assert_eq!(outcome.stats.lines_read, 4);
        assert_eq!(outcome.stats.lines_matched, 3);
        assert_eq!(outcome.stats.malformed_lines, 1);
        assert_eq!(outcome.stats.missing_expiration, 1);
        assert_eq!(outcome.stats.missing_call_sign, 1);
        assert_eq!(outcome.stats.records_merged, 1);
    }

    #[test]
    fn test_parse_lines_bad_date_is_fatal() {
        let lines = [
            hd_line("K1ABC", "01/01/2020", ""),
            hd_line("W1AW", "14/01/2020", ""),
            hd_line("N0CALL", "01/01/2020", ""),
        ];
        match parse_lines(&lines) {
            Err(ParseError::DateFormat { line, source }) => {
                assert_eq!(line, 2);
                assert_eq!(source.field, DateField::Expired);
                assert_eq!(source.value, "14/01/2020");
            }
            other => panic!("expected date error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_lines_year_zero_is_fatal() {
        let lines = ["HD|1|2|3|W1AW|A|HA|01/01/2010|01/01/0000|"];
        match parse_lines(lines) {
            Err(ParseError::DateFormat { line, source }) => {
                assert_eq!(line, 1);
                assert_eq!(source.field, DateField::Expired);
                assert_eq!(source.value, "01/01/0000");
            }
            other => panic!("expected date error, got {:?}", other),
        }
    }

    #[test]
    fn test_push_line_incremental() {
        let mut parser = AvailabilityParser::new();
        assert!(parser.availability().is_empty());

        parser.push_line(&hd_line("K1ABC", "01/01/2020", "")).unwrap();
        assert_eq!(parser.stats().lines_read, 1);
        assert_eq!(parser.stats().records_merged, 1);
        assert_eq!(parser.availability().get("K1ABC"), Some(date(2022, 1, 2)));

        parser.push_line("not a license record\n").unwrap();
        assert_eq!(parser.stats().lines_read, 2);
        assert_eq!(parser.stats().malformed_lines, 1);
        assert_eq!(parser.availability().len(), 1);

        // An earlier date leaves the stored one alone
        parser.push_line(&hd_line("K1ABC", "01/01/2015", "")).unwrap();
        assert_eq!(parser.stats().lines_matched, 2);
        assert_eq!(parser.stats().records_merged, 1);
        assert_eq!(parser.availability().get("K1ABC"), Some(date(2022, 1, 2)));

        parser.push_line(&hd_line("W1AW", "03/01/2021", "")).unwrap();
        assert_eq!(parser.availability().get("W1AW"), Some(date(2023, 3, 2)));
        assert_eq!(parser.checkpoint(2), Some(4));
        assert_eq!(parser.checkpoint(3), None);

        let outcome = parser.finish();
        assert_eq!(outcome.availability.len(), 2);
        assert_eq!(outcome.stats.records_merged, 2);
    }

    #[test]
    fn test_parse_lines_strips_line_endings() {
        let lines = ["HD|1|2|3|W1AW|A|HA|01/01/2010|01/01/2020|\r\n"];
        let availability = parse_lines(lines).unwrap();
        assert_eq!(availability.get("W1AW"), Some(date(2022, 1, 2)));
    }

    #[test]
    fn test_progress_checkpoints() {
        let lines: Vec<String> = (0..10)
            .map(|i| hd_line(&format!("K{}ABC", i), "01/01/2020", ""))
            .collect();
        let mut checkpoints = Vec::new();
        parse_lines_with_progress(&lines, 3, |n| checkpoints.push(n)).unwrap();
        assert_eq!(checkpoints, vec![3, 6, 9]);
    }

    #[test]
    fn test_progress_disabled() {
        let lines = [hd_line("K1ABC", "01/01/2020", "")];
        let mut called = false;
        parse_lines_with_progress(&lines, 0, |_| called = true).unwrap();
        assert!(!called);
    }

    #[test]
    fn test_parse_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", hd_line("K1ABC", "01/01/2020", "")).unwrap();
        // Latin-1 byte in a field we never read
        file.write_all(b"HD|1|2|3|W1AW|A|HA|caf\xe9|01/01/2020|\n").unwrap();
        file.flush().unwrap();

        let outcome = parse_file(file.path(), 1).unwrap();
        assert_eq!(outcome.stats.lines_read, 2);
        assert_eq!(outcome.availability.get("K1ABC"), Some(date(2022, 1, 2)));
        assert_eq!(outcome.availability.get("W1AW"), Some(date(2022, 1, 2)));
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file(Path::new("/nonexistent/HD.dat"), 0).unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }

    fn arb_hd_line() -> impl Strategy<Value = String> {
        (
            prop::sample::select(vec!["K1AB", "W1AW", "N0XY", "AA1A"]),
            (1u32..=12, 1u32..=28, 2000i32..2030),
            prop::option::of((1u32..=12, 1u32..=28, 2000i32..2030)),
        )
            .prop_map(|(call, (m, d, y), cancel)| {
                let cancel = cancel
                    .map(|(m, d, y)| format!("{:02}/{:02}/{}", m, d, y))
                    .unwrap_or_default();
                hd_line(call, &format!("{:02}/{:02}/{}", m, d, y), &cancel)
            })
    }

    proptest! {
        #[test]
        fn prop_parse_is_deterministic(lines in prop::collection::vec(arb_hd_line(), 0..40)) {
            prop_assert_eq!(parse_lines(&lines).unwrap(), parse_lines(&lines).unwrap());
        }

        #[test]
        fn prop_final_dates_ignore_line_order(lines in prop::collection::vec(arb_hd_line(), 0..40)) {
            let forward = parse_lines(&lines).unwrap();
            let reversed = parse_lines(lines.iter().rev()).unwrap();

            prop_assert_eq!(forward.len(), reversed.len());
            for entry in &forward {
                prop_assert_eq!(reversed.get(&entry.call_sign), Some(entry.available));
            }
        }
    }
}
