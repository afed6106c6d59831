mod record;
mod sort;
mod store;

pub use record::ActivityRecord;
pub use sort::ActivitySorter;
pub use store::{ActivityData, ActivityStore};
