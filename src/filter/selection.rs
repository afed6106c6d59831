//! Multi-select filter dimensions.
//!
//! Every selection is rebuilt from the full list of picked options the
//! multi-select control reports. Order and duplicates are kept as given.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Catalog entry for the activity-type dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeOption {
    pub name: String,
}

impl TypeOption {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Catalog entry for the username dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOption {
    pub user_id: UserId,
    pub user_name: String,
}

impl UserOption {
    pub fn new(user_id: u64, user_name: impl Into<String>) -> Self {
        Self {
            user_id: UserId(user_id),
            user_name: user_name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSelection {
    names: Vec<String>,
}

impl TypeSelection {
    pub fn from_options(items: &[TypeOption]) -> Self {
        Self {
            names: items.iter().map(|item| item.name.clone()).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn display(&self) -> String {
        self.names.join(",")
    }

    /// Active when the joined display string is non-empty, so a lone
    /// empty-string entry does not count as a constraint.
    pub fn is_active(&self) -> bool {
        !self.display().is_empty()
    }
}

/// Selected users as two index-aligned lists: ids for the query, names for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSelection {
    user_ids: Vec<UserId>,
    user_names: Vec<String>,
}

impl UserSelection {
    pub fn from_options(items: &[UserOption]) -> Self {
        let (user_ids, user_names) = items
            .iter()
            .map(|item| (item.user_id, item.user_name.clone()))
            .unzip();
        Self {
            user_ids,
            user_names,
        }
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn user_names(&self) -> &[String] {
        &self.user_names
    }

    pub fn display(&self) -> String {
        self.user_names.join(",")
    }

    pub fn is_active(&self) -> bool {
        !self.display().is_empty()
    }
}
