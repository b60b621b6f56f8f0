//! Presence client seam.

use bloxpresence_session::PresenceError;

use crate::activity::Activity;

/// Delivers activities to a rich-presence client.
pub trait ActivityPublisher {
    fn set_activity(&mut self, activity: &Activity) -> Result<(), PresenceError>;

    fn clear_activity(&mut self) -> Result<(), PresenceError>;
}

impl<T: ActivityPublisher + ?Sized> ActivityPublisher for Box<T> {
    fn set_activity(&mut self, activity: &Activity) -> Result<(), PresenceError> {
        (**self).set_activity(activity)
    }

    fn clear_activity(&mut self) -> Result<(), PresenceError> {
        (**self).clear_activity()
    }
}

/// Publisher that only logs activities.
#[derive(Debug, Default)]
pub struct TracingPublisher {
    published: u64,
}

impl TracingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of activities logged so far.
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl ActivityPublisher for TracingPublisher {
    fn set_activity(&mut self, activity: &Activity) -> Result<(), PresenceError> {
        self.published += 1;
        tracing::info!(
            details = %activity.details,
            state = %activity.state,
            start = ?activity.start,
            buttons = activity.buttons.len(),
            "presence updated"
        );
        match serde_json::to_string(activity) {
            Ok(json) => tracing::debug!(%json, "presence payload"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize presence"),
        }
        Ok(())
    }

    fn clear_activity(&mut self) -> Result<(), PresenceError> {
        tracing::info!("presence cleared");
        Ok(())
    }
}
