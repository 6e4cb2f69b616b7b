use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::time::local_seconds;

/// One observed focus change, exactly as it is stored on disk. Records are never rewritten once
/// appended.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct ActivityEvent {
    pub id: u64,
    #[serde(with = "local_seconds")]
    pub timestamp: NaiveDateTime,
    /// Partition the event was filed under. Fixed at write time.
    pub date: NaiveDate,
    pub window_title: Arc<str>,
}

/// What reporting needs from a stored event.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct LoggedActivity {
    pub timestamp: NaiveDateTime,
    pub window_title: Arc<str>,
}

impl From<ActivityEvent> for LoggedActivity {
    fn from(
        ActivityEvent {
            timestamp,
            window_title,
            ..
        }: ActivityEvent,
    ) -> Self {
        LoggedActivity {
            timestamp,
            window_title,
        }
    }
}
