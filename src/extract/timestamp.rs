use std::fmt;

use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeDelta, Timelike, Utc};

/// Lower bound of the lines exported by a run. Computed once at start up;
/// nothing after that consults the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff(DateTime<Utc>);

impl Cutoff {
    /// `None` when the window reaches past the earliest representable time.
    pub fn from_window(now: DateTime<Utc>, window: TimeDelta) -> Option<Self> {
        now.checked_sub_signed(window).map(Self::at)
    }

    /// Cutoffs only carry microseconds, matching the precision the
    /// databases are written with.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(instant.trunc_subsecs(6))
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// The value bound to the `created >= ?` query.
    ///
    /// Compatibility shim: the column is compared as text, and the
    /// databases in the wild have always been queried with an offset
    /// timestamp followed by a literal `Z`, e.g.
    /// `2024-06-01T11:30:00.250000+00:00Z`. Keep it byte for byte.
    pub fn query_param(&self) -> String {
        format!("{self}Z")
    }
}

impl fmt::Display for Cutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S"))?;
        let micros = self.0.nanosecond() / 1_000;
        if micros != 0 {
            write!(f, ".{micros:06}")?;
        }
        f.write_str("+00:00")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimestampError {
    #[error("Unrecognised timestamp {0:?}")]
    Invalid(String),
    #[error("Timestamp {0} cannot be expressed in nanoseconds since the epoch")]
    OutOfRange(DateTime<Utc>),
}

/// Parses a `created` column value such as `2024-06-01T12:00:00.5Z`.
/// Values without an offset are taken to be UTC.
pub fn parse_created(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let normalized = raw.trim().replace('Z', "+00:00");

    if let Ok(ts) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimestampError::Invalid(raw.to_string()))
}

/// Exact integer nanoseconds. This intentionally differs from multiplying
/// float epoch seconds by 1e9: both agree on whole and half seconds, but the
/// float product loses the low digits of values such as `.123456`.
pub fn epoch_nanos(ts: DateTime<Utc>) -> Result<i64, TimestampError> {
    ts.timestamp_nanos_opt()
        .ok_or(TimestampError::OutOfRange(ts))
}
