use std::time::Duration;
use thiserror::Error;

use crate::filter::RangeError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Activity source unavailable: {0}")]
    Unavailable(String),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error(transparent)]
    Validation(#[from] RangeError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Permission '{feature}' denied, redirecting to {redirect_to}")]
    PermissionDenied {
        feature: String,
        redirect_to: &'static str,
    },
}
