mod collaborators;
mod error;
mod model;
mod notice;

pub use collaborators::{
    ActivityService, BusyGuard, BusyIndicator, Clock, Collaborators, NoticeKind, Notifier,
    PermissionGate, SystemClock,
};
pub use error::{FetchError, ViewError};
pub use model::{ActivityViewModel, FEATURE_KEY, HOME_ROUTE, ViewPhase};
pub use notice::{BusyCounter, FeatureGrants, Notice, NoticeLog};
