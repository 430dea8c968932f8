//! # Job & Invoice Numbering
//!
//! ```text
//! JOB-2024-0042  ──derive──►  INV-2024-0042
//!  │    │    │
//!  │    │    └── sequence, max + 1 within the year, zero-padded to 4
//!  │    └─────── calendar year of intake
//!  └──────────── prefix
//! ```
//!
//! The sequence restarts at `0001` every year. The next number is computed
//! from the ids already stored, so callers must hold the store write lock
//! between scanning and inserting.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::{INVOICE_PREFIX, JOB_PREFIX};

/// A parsed job code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobNumber {
    pub year: i32,
    pub seq: u32,
}

impl JobNumber {
    pub const fn new(year: i32, seq: u32) -> Self {
        JobNumber { year, seq }
    }

    /// The invoice number that belongs to this job.
    ///
    /// ```rust
    /// use repairdesk_core::numbering::JobNumber;
    ///
    /// assert_eq!(JobNumber::new(2024, 7).invoice_number(), "INV-2024-0007");
    /// ```
    pub fn invoice_number(&self) -> String {
        format!("{}-{}-{:04}", INVOICE_PREFIX, self.year, self.seq)
    }

    /// `LIKE` pattern matching every job code of `year`.
    pub fn year_pattern(year: i32) -> String {
        format!("{}-{}-%", JOB_PREFIX, year)
    }
}

impl fmt::Display for JobNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:04}", JOB_PREFIX, self.year, self.seq)
    }
}

impl FromStr for JobNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidJobNumber(s.to_string());

        let mut parts = s.splitn(3, '-');
        let (prefix, year, seq) = match (parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(y), Some(n)) => (p, y, n),
            _ => return Err(invalid()),
        };

        if prefix != JOB_PREFIX
            || year.len() != 4
            || seq.is_empty()
            || !seq.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let seq = seq.parse::<u32>().map_err(|_| invalid())?;
        if seq == 0 {
            return Err(invalid());
        }

        Ok(JobNumber { year, seq })
    }
}

/// Picks the next job code for `year` given the codes already issued.
///
/// Codes from other years and anything unparseable are ignored.
///
/// ```rust
/// use repairdesk_core::numbering::next_job_number;
///
/// let next = next_job_number(2024, ["JOB-2024-0001", "JOB-2024-0009", "JOB-2023-0044"]);
/// assert_eq!(next.to_string(), "JOB-2024-0010");
/// ```
pub fn next_job_number<'a, I>(year: i32, existing: I) -> JobNumber
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing
        .into_iter()
        .filter_map(|id| id.parse::<JobNumber>().ok())
        .filter(|job| job.year == year)
        .map(|job| job.seq)
        .max()
        .unwrap_or(0);

    JobNumber::new(year, max + 1)
}
