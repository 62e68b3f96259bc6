//! Attendance counters reported to learners.

use serde::{Deserialize, Serialize};

use crate::domain::entities::Participant;

/// Cumulative watch time and the resulting attendance percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub accumulated_watch_time_ms: i64,
    pub attendance_percentage: u8,
}

impl AttendanceStats {
    /// Watch time in minutes, for display.
    pub fn watch_minutes(&self) -> f64 {
        self.accumulated_watch_time_ms as f64 / 60_000.0
    }
}

impl From<&Participant> for AttendanceStats {
    fn from(participant: &Participant) -> Self {
        Self {
            accumulated_watch_time_ms: participant.accumulated_watch_time_ms,
            attendance_percentage: participant.attendance_percentage,
        }
    }
}
