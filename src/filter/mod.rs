mod date_range;
mod query;
mod selection;
mod state;

pub use date_range::{DISPLAY_FORMAT, DateBound, DateRangeValidator, RangeError};
pub use query::{ActivityQueryBuilder, QueryParams};
pub use selection::{TypeOption, TypeSelection, UserOption, UserSelection};
pub use state::{Dimension, FilterFlags, FilterState};
