use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::spooler::JobKind;

/// Request body for submitting a job
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct NewJob {
    pub kind: JobKind,
    /// 1 = critical, 5 = low. Out-of-range values are stored as 5.
    pub priority: i64,
}

/// Request body for changing a job's priority
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct PriorityUpdate {
    pub priority: i64,
}

/// Statuses a client may set directly. Printing and Done belong to dispatch.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestedStatus {
    Queued,
    Delayed,
}

/// Request body for delaying or resuming a job
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct StatusUpdate {
    pub status: RequestedStatus,
    #[validate(length(
        min = 1,
        max = 200,
        message = "Reason must be between 1 and 200 characters"
    ))]
    pub reason: Option<String>,
}
