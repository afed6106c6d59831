use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Presentation format of a date bound, interpreted in local time.
pub const DISPLAY_FORMAT: &str = "%Y/%m/%d %H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Start date must be earlier than end date")]
    StartAfterEnd,

    #[error("Start date must not be later than the current date and time")]
    StartInFuture,

    #[error("End date must be later than start date")]
    EndBeforeStart,

    #[error("Invalid date '{input}', expected YYYY/MM/DD HH:mm")]
    InvalidFormat { input: String },
}

/// An optional instant bounding the activity time range.
///
/// Exchanged with collaborators as an instant; [`DateBound::display`] is the
/// only place the textual form appears.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateBound(Option<DateTime<Utc>>);

impl DateBound {
    pub fn empty() -> Self {
        Self(None)
    }

    /// Bound at `instant`, truncated to whole minutes.
    pub fn at(instant: DateTime<Utc>) -> Self {
        let truncated = instant
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(instant);
        Self(Some(truncated))
    }

    /// Parse the local `YYYY/MM/DD HH:mm` form. Blank input is the empty bound.
    pub fn parse(text: &str) -> Result<Self, RangeError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::empty());
        }

        let invalid = || RangeError::InvalidFormat {
            input: text.to_string(),
        };

        let naive = NaiveDateTime::parse_from_str(text, DISPLAY_FORMAT).map_err(|_| invalid())?;
        // Nonexistent local times (DST gaps) have no instant to compare against
        let local = Local.from_local_datetime(&naive).earliest().ok_or_else(invalid)?;

        Ok(Self(Some(local.with_timezone(&Utc))))
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn display(&self) -> String {
        self.0
            .map(|t| t.with_timezone(&Local).format(DISPLAY_FORMAT).to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for DateBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Start and end bounds, kept mutually consistent.
///
/// A rejected candidate clears the bound it was meant for instead of
/// leaving the previous value in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRangeValidator {
    start: DateBound,
    end: DateBound,
}

impl DateRangeValidator {
    pub fn start(&self) -> DateBound {
        self.start
    }

    pub fn end(&self) -> DateBound {
        self.end
    }

    pub fn set_start(
        &mut self,
        candidate: DateBound,
        now: DateTime<Utc>,
    ) -> Result<DateBound, RangeError> {
        if let (Some(start), Some(end)) = (candidate.instant(), self.end.instant())
            && start > end
        {
            self.start = DateBound::empty();
            return Err(RangeError::StartAfterEnd);
        }

        if let Some(start) = candidate.instant()
            && start > now
        {
            self.start = DateBound::empty();
            return Err(RangeError::StartInFuture);
        }

        self.start = candidate;
        Ok(candidate)
    }

    /// No future check: the end bound may sit at or beyond "now".
    pub fn set_end(&mut self, candidate: DateBound) -> Result<DateBound, RangeError> {
        if let (Some(start), Some(end)) = (self.start.instant(), candidate.instant())
            && end < start
        {
            self.end = DateBound::empty();
            return Err(RangeError::EndBeforeStart);
        }

        self.end = candidate;
        Ok(candidate)
    }

    pub fn set_to_now(&mut self, now: DateTime<Utc>) -> Result<DateBound, RangeError> {
        self.set_end(DateBound::at(now))
    }

    pub fn clear_start(&mut self) {
        self.start = DateBound::empty();
    }

    pub fn clear_end(&mut self) {
        self.end = DateBound::empty();
    }
}
