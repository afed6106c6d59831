use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::date_range::{DateBound, DateRangeValidator, RangeError};
use super::selection::{TypeOption, TypeSelection, UserOption, UserSelection};

/// One of the four independent filter axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    StartDate,
    EndDate,
    Type,
    Username,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::StartDate,
        Dimension::EndDate,
        Dimension::Type,
        Dimension::Username,
    ];
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::StartDate => write!(f, "start_date"),
            Dimension::EndDate => write!(f, "end_date"),
            Dimension::Type => write!(f, "type"),
            Dimension::Username => write!(f, "username"),
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "start_date" => Ok(Dimension::StartDate),
            "end_date" => Ok(Dimension::EndDate),
            "type" => Ok(Dimension::Type),
            "username" => Ok(Dimension::Username),
            other => Err(format!(
                "Unknown filter '{other}', expected start_date, end_date, type or username"
            )),
        }
    }
}

/// Visibility flags of the filter summary panel.
///
/// Always a projection of a [`FilterState`], never stored alongside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterFlags {
    pub show_start_date_filter: bool,
    pub show_end_date_filter: bool,
    pub show_type_filter: bool,
    pub show_username_filter: bool,
    pub show_filter_block: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    dates: DateRangeValidator,
    types: TypeSelection,
    users: UserSelection,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_date(&self) -> DateBound {
        self.dates.start()
    }

    pub fn end_date(&self) -> DateBound {
        self.dates.end()
    }

    pub fn types(&self) -> &TypeSelection {
        &self.types
    }

    pub fn users(&self) -> &UserSelection {
        &self.users
    }

    /// Unparsable text is rejected the same way as an out-of-range instant.
    pub fn set_start_date(
        &mut self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<DateBound, RangeError> {
        let result = DateBound::parse(text)
            .inspect_err(|_| self.dates.clear_start())
            .and_then(|candidate| self.dates.set_start(candidate, now));
        tracing::debug!("Start date filter -> {:?}", result);
        result
    }

    pub fn set_end_date(&mut self, text: &str) -> Result<DateBound, RangeError> {
        let result = DateBound::parse(text)
            .inspect_err(|_| self.dates.clear_end())
            .and_then(|candidate| self.dates.set_end(candidate));
        tracing::debug!("End date filter -> {:?}", result);
        result
    }

    pub fn set_end_to_now(&mut self, now: DateTime<Utc>) -> Result<DateBound, RangeError> {
        let result = self.dates.set_to_now(now);
        tracing::debug!("End date filter -> now {:?}", result);
        result
    }

    pub fn apply_type_selection(&mut self, items: &[TypeOption]) -> &TypeSelection {
        self.types = TypeSelection::from_options(items);
        tracing::debug!("Type filter -> [{}]", self.types.display());
        &self.types
    }

    pub fn apply_user_selection(&mut self, items: &[UserOption]) -> &UserSelection {
        self.users = UserSelection::from_options(items);
        tracing::debug!("Username filter -> [{}]", self.users.display());
        &self.users
    }

    /// Clear one dimension; the other three are left untouched.
    pub fn remove_dimension(&mut self, dimension: Dimension) {
        match dimension {
            Dimension::StartDate => self.dates.clear_start(),
            Dimension::EndDate => self.dates.clear_end(),
            Dimension::Type => self.types = TypeSelection::default(),
            Dimension::Username => self.users = UserSelection::default(),
        }
        tracing::debug!("Removed {dimension} filter");
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::StartDate => self.dates.start().is_set(),
            Dimension::EndDate => self.dates.end().is_set(),
            Dimension::Type => self.types.is_active(),
            Dimension::Username => self.users.is_active(),
        }
    }

    pub fn is_any_active(&self) -> bool {
        Dimension::ALL.iter().any(|d| self.is_active(*d))
    }

    pub fn flags(&self) -> FilterFlags {
        FilterFlags {
            show_start_date_filter: self.is_active(Dimension::StartDate),
            show_end_date_filter: self.is_active(Dimension::EndDate),
            show_type_filter: self.is_active(Dimension::Type),
            show_username_filter: self.is_active(Dimension::Username),
            show_filter_block: self.is_any_active(),
        }
    }
}
