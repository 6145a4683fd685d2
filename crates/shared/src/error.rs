use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a navigation's content pipeline, as observed through its
/// content future.
///
/// Clonable (message-carrying, not source-carrying) because a single
/// navigation's future is shared between the controller and the render
/// scheduler and may be observed from both ends.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum ContentError {
    #[error("content fetch failed for {location}: {message}")]
    Fetch { location: String, message: String },
    #[error("content decode failed for {location}: {message}")]
    Decode { location: String, message: String },
}
