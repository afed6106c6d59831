use serde::{Deserialize, Serialize};

use super::date_range::DateBound;
use super::state::FilterState;
use crate::types::UserId;

/// Parameters of a filtered activity fetch.
///
/// Inactive dimensions are sent as empty values: the server reads "empty"
/// as "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub user_ids: Vec<UserId>,
    pub types: Vec<String>,
    pub from: DateBound,
    pub to: DateBound,
}

impl QueryParams {
    pub fn is_unconstrained(&self) -> bool {
        self.user_ids.is_empty() && self.types.is_empty() && !self.from.is_set() && !self.to.is_set()
    }
}

pub struct ActivityQueryBuilder;

impl ActivityQueryBuilder {
    pub fn build(state: &FilterState) -> QueryParams {
        QueryParams {
            user_ids: state.users().user_ids().to_vec(),
            types: state.types().names().to_vec(),
            from: state.start_date(),
            to: state.end_date(),
        }
    }
}
