//! Attendance accounting domain service.
//!
//! The server is the source of truth for watch time. Clients report the time
//! elapsed since their previous ping; the policy credits at most the
//! wall-clock time since the last ping (plus a small tolerance), and never
//! more than two ping intervals at once, so a misbehaving client cannot
//! inflate its attendance.

use chrono::{DateTime, Utc};

use crate::domain::entities::{JoinEvent, Participant, ParticipantStatus};
use crate::domain::value_objects::AttendanceStats;

/// Errors raised by attendance rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttendanceError {
    #[error("Participant has not joined the session")]
    NotJoined,
}

/// Rules for crediting watch time.
#[derive(Debug, Clone, Copy)]
pub struct AttendancePolicy {
    ping_interval_ms: i64,
    tolerance_ms: i64,
}

impl AttendancePolicy {
    pub fn new(ping_interval_ms: u64, tolerance_ms: u64) -> Self {
        Self {
            ping_interval_ms: i64::try_from(ping_interval_ms).unwrap_or(i64::MAX / 4),
            tolerance_ms: i64::try_from(tolerance_ms).unwrap_or(0),
        }
    }

    /// Largest amount of watch time a single ping or leave may credit.
    pub fn max_credit_ms(&self) -> i64 {
        self.ping_interval_ms.saturating_mul(2)
    }

    /// `min(100, round(accumulated / expected * 100))`, 0 when nothing is expected.
    pub fn percentage(accumulated_ms: i64, expected_ms: i64) -> u8 {
        if expected_ms <= 0 || accumulated_ms <= 0 {
            return 0;
        }
        let pct = (accumulated_ms as f64 / expected_ms as f64 * 100.0).round();
        pct.min(100.0) as u8
    }

    /// Open a join record. Joining again while already joined keeps the open record.
    pub fn join(
        &self,
        participant: &mut Participant,
        expected_ms: i64,
        now: DateTime<Utc>,
    ) -> AttendanceStats {
        if !participant.is_joined() {
            participant.status = ParticipantStatus::Joined;
            participant.last_joined_at = Some(now);
            participant.last_ping_at = Some(now);
            participant.current_join_watch_time_ms = 0;
        }
        participant.attendance_percentage =
            Self::percentage(participant.accumulated_watch_time_ms, expected_ms);
        AttendanceStats::from(&*participant)
    }

    /// Credit a heartbeat. Returns the amount actually credited.
    pub fn ping(
        &self,
        participant: &mut Participant,
        elapsed_ms: i64,
        expected_ms: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, AttendanceError> {
        if !participant.is_joined() {
            return Err(AttendanceError::NotJoined);
        }

        let since_last = participant
            .last_ping_at
            .or(participant.last_joined_at)
            .map(|at| (now - at).num_milliseconds().max(0))
            .unwrap_or(0);

        let credited = elapsed_ms
            .max(0)
            .min(since_last.saturating_add(self.tolerance_ms))
            .min(self.max_credit_ms());

        participant.accumulated_watch_time_ms += credited;
        participant.current_join_watch_time_ms += credited;
        participant.last_ping_at = Some(now);
        participant.attendance_percentage =
            Self::percentage(participant.accumulated_watch_time_ms, expected_ms);

        Ok(credited)
    }

    /// Close the open join record, crediting the time since the last ping.
    /// Leaving without an open record only refreshes the percentage.
    pub fn leave(
        &self,
        participant: &mut Participant,
        expected_ms: i64,
        now: DateTime<Utc>,
    ) -> AttendanceStats {
        if let (true, Some(joined_at)) = (participant.is_joined(), participant.last_joined_at) {
            let tail = participant
                .last_ping_at
                .map(|at| (now - at).num_milliseconds().max(0))
                .unwrap_or(0)
                .min(self.max_credit_ms());

            participant.accumulated_watch_time_ms += tail;
            participant.current_join_watch_time_ms += tail;
            participant.join_events.push(JoinEvent {
                joined_at,
                left_at: now,
                watch_time_ms: participant.current_join_watch_time_ms,
            });
            participant.status = ParticipantStatus::Left;
            participant.last_joined_at = None;
            participant.last_ping_at = Some(now);
            participant.current_join_watch_time_ms = 0;
        }

        participant.attendance_percentage =
            Self::percentage(participant.accumulated_watch_time_ms, expected_ms);
        AttendanceStats::from(&*participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use test_case::test_case;
    use uuid::Uuid;

    const HOUR_MS: i64 = 3_600_000;

    fn policy() -> AttendancePolicy {
        AttendancePolicy::new(30_000, 5_000)
    }

    #[test_case(0, HOUR_MS => 0 ; "nothing watched")]
    #[test_case(1_800_000, HOUR_MS => 50 ; "half")]
    #[test_case(18_000, HOUR_MS => 1 ; "rounds half up")]
    #[test_case(17_000, HOUR_MS => 0 ; "rounds down")]
    #[test_case(2 * HOUR_MS, HOUR_MS => 100 ; "capped at one hundred")]
    #[test_case(1_000, 0 => 0 ; "no expected time")]
    fn test_percentage(accumulated: i64, expected: i64) -> u8 {
        AttendancePolicy::percentage(accumulated, expected)
    }

    #[test]
    fn test_ping_requires_join() {
        let mut participant = Participant::invited(Uuid::new_v4());
        let err = policy()
            .ping(&mut participant, 30_000, HOUR_MS, Utc::now())
            .unwrap_err();
        assert_eq!(err, AttendanceError::NotJoined);
    }

    #[test]
    fn test_ping_credits_elapsed_within_wall_clock() {
        let start = Utc::now();
        let mut participant = Participant::invited(Uuid::new_v4());
        policy().join(&mut participant, HOUR_MS, start);

        let credited = policy()
            .ping(&mut participant, 30_000, HOUR_MS, start + Duration::seconds(30))
            .unwrap();
        assert_eq!(credited, 30_000);
        assert_eq!(participant.accumulated_watch_time_ms, 30_000);
        assert_eq!(participant.attendance_percentage, 1);
    }

    #[test]
    fn test_ping_cannot_exceed_wall_clock_plus_tolerance() {
        let start = Utc::now();
        let mut participant = Participant::invited(Uuid::new_v4());
        policy().join(&mut participant, HOUR_MS, start);

        let credited = policy()
            .ping(&mut participant, 600_000, HOUR_MS, start + Duration::seconds(10))
            .unwrap();
        assert_eq!(credited, 15_000);
    }

    #[test]
    fn test_ping_capped_at_two_intervals() {
        let start = Utc::now();
        let mut participant = Participant::invited(Uuid::new_v4());
        policy().join(&mut participant, HOUR_MS, start);

        let credited = policy()
            .ping(&mut participant, 600_000, HOUR_MS, start + Duration::minutes(10))
            .unwrap();
        assert_eq!(credited, 60_000);
    }

    #[test]
    fn test_negative_elapsed_credits_nothing() {
        let start = Utc::now();
        let mut participant = Participant::invited(Uuid::new_v4());
        policy().join(&mut participant, HOUR_MS, start);
        let credited = policy()
            .ping(&mut participant, -5, HOUR_MS, start + Duration::seconds(30))
            .unwrap();
        assert_eq!(credited, 0);
    }

    #[test]
    fn test_leave_records_join_event_with_tail() {
        let start = Utc::now();
        let mut participant = Participant::invited(Uuid::new_v4());
        let policy = policy();
        policy.join(&mut participant, HOUR_MS, start);
        policy
            .ping(&mut participant, 30_000, HOUR_MS, start + Duration::seconds(30))
            .unwrap();

        let stats = policy.leave(&mut participant, HOUR_MS, start + Duration::seconds(40));
        assert_eq!(stats.accumulated_watch_time_ms, 40_000);
        assert_eq!(participant.status, ParticipantStatus::Left);
        assert_eq!(participant.join_events.len(), 1);
        assert_eq!(participant.join_events[0].watch_time_ms, 40_000);
        assert!(participant.last_joined_at.is_none());
    }

    #[test]
    fn test_leave_is_idempotent() {
        let start = Utc::now();
        let mut participant = Participant::invited(Uuid::new_v4());
        let policy = policy();
        policy.join(&mut participant, HOUR_MS, start);
        policy.leave(&mut participant, HOUR_MS, start + Duration::seconds(20));
        let stats = policy.leave(&mut participant, HOUR_MS, start + Duration::seconds(90));
        assert_eq!(stats.accumulated_watch_time_ms, 20_000);
        assert_eq!(participant.join_events.len(), 1);
    }

    #[test]
    fn test_rejoin_keeps_open_record() {
        let start = Utc::now();
        let mut participant = Participant::invited(Uuid::new_v4());
        let policy = policy();
        policy.join(&mut participant, HOUR_MS, start);
        policy.join(&mut participant, HOUR_MS, start + Duration::seconds(20));
        assert_eq!(participant.last_joined_at, Some(start));
    }
}
