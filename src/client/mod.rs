//! # Learner Client
//!
//! Client side of the live classroom: REST and gateway access, the live class
//! controller with its heartbeat, and the help widget. Used by the
//! `live-viewer` binary and usable by any other front end.

mod api;
mod controller;
mod error;
mod events;
mod heartbeat;
mod launcher;
mod notification;
mod settings;
mod support;

pub use api::{ApiClient, LiveSessionApi, SupportApi};
#[cfg(test)]
pub use api::{MockLiveSessionApi, MockSupportApi};
pub use controller::{
    JoinOutcome, LiveClassController, LivePanel, COURSE_UNAVAILABLE, ENROLLMENT_REQUIRED,
    NO_LIVE_CLASS,
};
pub use error::ClientError;
pub use events::{LiveEvent, RealtimeListener, RealtimeSubscription};
pub use heartbeat::Heartbeat;
#[cfg(test)]
pub use launcher::MockMeetingLauncher;
pub use launcher::{meeting_launch_url, LogLauncher, MeetingLauncher};
pub use notification::{Notification, NotificationCenter, NotificationKind};
pub use settings::ClientSettings;
pub use support::{HelpWidget, WidgetMode};
