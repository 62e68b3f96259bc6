//! Live class controller.
//!
//! Learner-side state for one course page: the active session, the join
//! record and attendance counters. Fetched snapshots and pushed events both
//! carry a version; anything older than what was already applied is dropped.
//!
//! The heartbeat only runs while `joined_session_id` is set and equals the
//! active session's id. Leaving, a session-end event, switching course or
//! dropping the controller stops it.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::application::dto::response::{CourseView, LiveSessionView};
use crate::client::{
    meeting_launch_url, ClientSettings, Heartbeat, LiveEvent, LiveSessionApi, MeetingLauncher,
    Notification, NotificationCenter, NotificationKind,
};
use crate::domain::{AttendanceStats, SessionStatus};

pub const NO_LIVE_CLASS: &str = "No live class is running right now.";
pub const ENROLLMENT_REQUIRED: &str = "Live classes are available after enrollment.";
pub const COURSE_UNAVAILABLE: &str = "Course details are unavailable.";

/// What the live class area of the course page shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivePanel {
    CourseUnavailable,
    EnrollmentRequired,
    NoLiveClass,
    Session {
        session: LiveSessionView,
        joined: bool,
        stats: Option<AttendanceStats>,
    },
}

impl LivePanel {
    pub fn headline(&self) -> String {
        match self {
            Self::CourseUnavailable => COURSE_UNAVAILABLE.into(),
            Self::EnrollmentRequired => ENROLLMENT_REQUIRED.into(),
            Self::NoLiveClass => NO_LIVE_CLASS.into(),
            Self::Session { session, .. } => {
                let badge = if session.status == SessionStatus::Live {
                    "LIVE NOW"
                } else {
                    session.status.as_str()
                };
                format!("{} [{}] on {}", session.title, badge, session.provider.label())
            }
        }
    }
}

/// Result of a join attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined {
        session: LiveSessionView,
        launch_url: Option<String>,
    },
    NoActiveSession,
    NotEnrolled,
    /// Caller should send the user to sign in, then back to `return_to`
    SignInRequired {
        return_to: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Default)]
struct ClassState {
    course_slug: String,
    course: Option<CourseView>,
    active: Option<LiveSessionView>,
    joined_session_id: Option<Uuid>,
    attendance: Option<AttendanceStats>,
    applied_version: i64,
    heartbeat: Option<Heartbeat>,
}

impl ClassState {
    /// Forget the join record and stop pinging
    fn clear_join(&mut self) -> Option<Uuid> {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.stop();
        }
        self.attendance = None;
        self.joined_session_id.take()
    }

    fn set_active(&mut self, session: Option<LiveSessionView>) {
        let active_id = session.as_ref().map(|s| s.id);
        self.active = session;
        if self.joined_session_id.is_some() && self.joined_session_id != active_id {
            self.clear_join();
        }
    }

    /// Whether a payload of this version may still be applied
    fn accept_version(&mut self, version: i64) -> bool {
        if version > 0 && version < self.applied_version {
            tracing::debug!(version, applied = self.applied_version, "Dropping stale live session payload");
            return false;
        }
        self.applied_version = self.applied_version.max(version);
        true
    }

    fn follows(&self, session: &LiveSessionView) -> bool {
        match &self.course {
            Some(course) => course.id == session.course_id,
            None => self.course_slug == session.course_slug,
        }
    }
}

struct Inner<A> {
    api: Arc<A>,
    launcher: Arc<dyn MeetingLauncher>,
    notifications: NotificationCenter,
    ping_interval: Duration,
    state: Mutex<ClassState>,
}

impl<A: LiveSessionApi + 'static> Inner<A> {
    async fn ping(&self, session_id: Uuid, elapsed_ms: i64) {
        {
            let state = self.state.lock();
            let active_id = state.active.as_ref().map(|s| s.id);
            if state.joined_session_id != Some(session_id) || active_id != Some(session_id) {
                return;
            }
        }

        let result = self.api.ping(session_id, elapsed_ms).await;

        let mut state = self.state.lock();
        if state.joined_session_id != Some(session_id) {
            tracing::debug!(%session_id, "Discarding ping response after leave");
            return;
        }
        match result {
            Ok(stats) => state.attendance = Some(stats),
            Err(e) => {
                drop(state);
                tracing::warn!(%session_id, error = %e, "Heartbeat failed");
                self.notifications
                    .show(NotificationKind::Error, e.user_message());
            }
        }
    }

    fn start_heartbeat(self: &Arc<Self>, session_id: Uuid) -> Heartbeat {
        let weak: Weak<Self> = Arc::downgrade(self);
        Heartbeat::spawn(self.ping_interval, move |elapsed_ms| {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.ping(session_id, elapsed_ms).await;
                }
            }
        })
    }

    fn leave_in_background(&self, session_id: Uuid) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let api = self.api.clone();
        runtime.spawn(async move {
            if let Err(e) = api.leave(session_id).await {
                tracing::debug!(%session_id, error = %e, "Best-effort leave failed");
            }
        });
    }
}

/// Orchestrates lookup, join, heartbeat and leave for one learner
pub struct LiveClassController<A: LiveSessionApi + 'static> {
    inner: Arc<Inner<A>>,
}

impl<A: LiveSessionApi + 'static> LiveClassController<A> {
    pub fn new(api: Arc<A>, launcher: Arc<dyn MeetingLauncher>, settings: &ClientSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                launcher,
                notifications: NotificationCenter::new(Duration::from_millis(
                    settings.notification_ttl_ms,
                )),
                ping_interval: Duration::from_millis(settings.ping_interval_ms.max(1)),
                state: Mutex::new(ClassState::default()),
            }),
        }
    }

    /// Load a course page: course details, then the active session.
    /// Switching away from a joined course leaves it in the background.
    pub async fn open_course(&self, slug: &str) {
        let slug = slug.trim().to_lowercase();
        let previous = {
            let mut state = self.inner.state.lock();
            if state.course_slug == slug {
                None
            } else {
                let joined = state.clear_join();
                *state = ClassState {
                    course_slug: slug.clone(),
                    ..ClassState::default()
                };
                joined
            }
        };
        if let Some(session_id) = previous {
            self.inner.leave_in_background(session_id);
        }

        match self.inner.api.course(&slug).await {
            Ok(course) => {
                let mut state = self.inner.state.lock();
                if state.course_slug == slug {
                    state.course = Some(course);
                }
            }
            Err(e) => tracing::warn!(course = %slug, error = %e, "Failed to load course"),
        }

        self.refresh_active().await;
    }

    /// Fetch the active session. Failures read as "nothing live".
    pub async fn refresh_active(&self) {
        let slug = self.inner.state.lock().course_slug.clone();
        if slug.is_empty() {
            return;
        }

        let result = self.inner.api.active_session(&slug).await;

        let mut state = self.inner.state.lock();
        if state.course_slug != slug {
            return;
        }
        match result {
            Ok(response) => {
                if state.accept_version(response.version) {
                    state.set_active(response.session);
                }
            }
            Err(e) => {
                tracing::warn!(course = %slug, error = %e, "Failed to load active session");
                state.set_active(None);
            }
        }
    }

    /// Apply a pushed lifecycle event
    pub fn handle_event(&self, event: LiveEvent) {
        let notice = {
            let mut state = self.inner.state.lock();
            let session = event.session();
            if !state.follows(session) {
                tracing::debug!(course = %session.course_slug, "Ignoring event for another course");
                return;
            }
            if !state.accept_version(session.version) {
                return;
            }

            match event {
                LiveEvent::Started(session) => {
                    let notice = (
                        NotificationKind::Success,
                        format!("Live class \"{}\" is now live. Join before it fills up.", session.title),
                    );
                    state.clear_join();
                    state.active = Some(session);
                    notice
                }
                LiveEvent::Ended(session) => {
                    state.clear_join();
                    state.active = None;
                    (
                        NotificationKind::Info,
                        format!("The live class \"{}\" has ended.", session.title),
                    )
                }
            }
        };
        self.inner.notifications.show(notice.0, notice.1);
    }

    /// Join the active session and launch the meeting
    pub async fn join(&self) -> JoinOutcome {
        let (session, course, slug) = {
            let state = self.inner.state.lock();
            (
                state.active.clone(),
                state.course.clone(),
                state.course_slug.clone(),
            )
        };

        let Some(session) = session else {
            return JoinOutcome::NoActiveSession;
        };
        if !course.is_some_and(|c| c.is_enrolled) {
            self.inner.notifications.show(
                NotificationKind::Warning,
                "You need to be enrolled in this course to join live classes.",
            );
            return JoinOutcome::NotEnrolled;
        }
        if !self.inner.api.is_authenticated() {
            return JoinOutcome::SignInRequired {
                return_to: format!("/our-courses/{slug}"),
            };
        }

        let response = match self.inner.api.join(session.id).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "Join failed");
                let message = e.user_message();
                self.inner
                    .notifications
                    .show(NotificationKind::Error, message.clone());
                return JoinOutcome::Failed { message };
            }
        };

        let joined = response.session;
        let launch_url = {
            let mut state = self.inner.state.lock();
            if state.active.as_ref().map(|s| s.id) != Some(joined.id) {
                drop(state);
                self.inner.leave_in_background(joined.id);
                let message = "This live session is no longer active.".to_string();
                self.inner
                    .notifications
                    .show(NotificationKind::Error, message.clone());
                return JoinOutcome::Failed { message };
            }

            let previous_join_url = state
                .active
                .as_ref()
                .map(|s| s.meeting.join_url.clone())
                .unwrap_or_default();
            let url = [
                joined.meeting.join_url.as_str(),
                previous_join_url.as_str(),
                joined.meeting.start_url.as_str(),
            ]
            .into_iter()
            .find(|url| !url.trim().is_empty())
            .and_then(|url| meeting_launch_url(url, joined.provider));

            state.applied_version = state.applied_version.max(joined.version);
            state.active = Some(joined.clone());
            state.clear_join();
            state.joined_session_id = Some(joined.id);
            state.attendance = Some(AttendanceStats::default());
            state.heartbeat = Some(self.inner.start_heartbeat(joined.id));
            url
        };

        self.inner.notifications.show(
            NotificationKind::Success,
            "You are connected to the live class. Keep the window open to capture your attendance.",
        );
        if let Some(url) = &launch_url {
            if let Err(e) = self.inner.launcher.open(url) {
                tracing::warn!(error = %e, "Failed to open meeting link");
            }
        }

        tracing::info!(session_id = %joined.id, "Joined live session");
        JoinOutcome::Joined {
            session: joined,
            launch_url,
        }
    }

    /// Leave the joined session; returns the final stats when the server confirmed
    pub async fn leave(&self) -> Option<AttendanceStats> {
        let session_id = self.inner.state.lock().clear_join()?;

        match self.inner.api.leave(session_id).await {
            Ok(stats) => {
                tracing::info!(%session_id, watch_minutes = stats.watch_minutes(), "Left live session");
                Some(stats)
            }
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "Failed to leave session gracefully");
                self.inner
                    .notifications
                    .show(NotificationKind::Error, e.user_message());
                None
            }
        }
    }

    /// Best-effort leave before exit; failures are only logged
    pub async fn shutdown(&self) {
        let Some(session_id) = self.inner.state.lock().clear_join() else {
            return;
        };
        if let Err(e) = self.inner.api.leave(session_id).await {
            tracing::debug!(%session_id, error = %e, "Best-effort leave failed");
        }
    }

    pub fn panel(&self) -> LivePanel {
        let state = self.inner.state.lock();
        let Some(course) = &state.course else {
            return match &state.active {
                Some(session) => LivePanel::Session {
                    session: session.clone(),
                    joined: false,
                    stats: None,
                },
                None => LivePanel::CourseUnavailable,
            };
        };
        if !course.is_enrolled {
            return LivePanel::EnrollmentRequired;
        }
        match &state.active {
            Some(session) => LivePanel::Session {
                session: session.clone(),
                joined: state.joined_session_id == Some(session.id),
                stats: state.attendance,
            },
            None => LivePanel::NoLiveClass,
        }
    }

    pub fn course(&self) -> Option<CourseView> {
        self.inner.state.lock().course.clone()
    }

    pub fn active_session(&self) -> Option<LiveSessionView> {
        self.inner.state.lock().active.clone()
    }

    pub fn joined_session_id(&self) -> Option<Uuid> {
        self.inner.state.lock().joined_session_id
    }

    pub fn attendance(&self) -> Option<AttendanceStats> {
        self.inner.state.lock().attendance
    }

    pub fn is_pinging(&self) -> bool {
        self.inner
            .state
            .lock()
            .heartbeat
            .as_ref()
            .is_some_and(Heartbeat::is_running)
    }

    pub fn notification(&self) -> Option<Notification> {
        self.inner.notifications.current()
    }

    pub fn dismiss_notification(&self) {
        self.inner.notifications.dismiss();
    }
}

impl<A: LiveSessionApi + 'static> Drop for LiveClassController<A> {
    fn drop(&mut self) {
        let joined = self.inner.state.lock().clear_join();
        if let Some(session_id) = joined {
            self.inner.leave_in_background(session_id);
        }
    }
}
