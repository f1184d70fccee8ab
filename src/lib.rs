//! Callsign Availability - find lapsed amateur call signs in the FCC ULS database.
//!
//! This crate provides:
//! - A nom-based parser for ULS `HD` license records that derives the date
//!   each call sign becomes available again
//! - CW weight scoring for ranking call signs by how quickly they can be sent
//! - A report grouping available call signs by date
//! - A cache for reusing parsed data between runs
//!
//! # Example
//!
//! ```rust
//! use callsign_availability::{ReportOptions, build_report, parse_lines};
//!
//! let lines = [
//!     "HD|1|0001||K1AB|E|HA|01/01/2010|01/01/2021||",
//!     "HD|2|0002||W1XY|E|HA|01/01/2010|01/01/2021|06/01/2020|",
//! ];
//! let availability = parse_lines(lines).expect("Failed to parse records");
//!
//! let report = build_report(&availability, &ReportOptions::default())
//!     .expect("Failed to score call signs");
//!
//! print!("{}", report);
//! ```

pub mod cache;
pub mod config;
pub mod morse;
pub mod parser;
pub mod record;
pub mod report;
pub mod stats;

pub use cache::{CacheProvider, JsonFileCache, NoCache, Refresh, load_or_parse};
pub use config::Config;
pub use morse::{LookupError, weight};
pub use parser::{ParseError, parse_file, parse_lines, parse_lines_with_progress, parse_record};
pub use record::{CallSignAvailability, CallSignRecord};
pub use report::{AvailabilityReport, ReportOptions, build_report};
pub use stats::{ParseStats, ParseSummary};
