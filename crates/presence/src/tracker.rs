//! Presence tracking for the current session.
//!
//! Builds a default activity when a session starts and lets in-game
//! messages override it field by field. An empty string or a `reset` flag
//! restores the session default, so the experience never has to know what
//! the default looked like.

use bloxpresence_protocol::{Command, Message, RichPresenceImage};
use bloxpresence_session::{GameSession, PresenceError, PresenceSink, ServerType};

use crate::activity::{Activity, ActivityButton, ActivityImage};
use crate::publisher::ActivityPublisher;

const LARGE_IMAGE_KEY: &str = "roblox";
const LARGE_IMAGE_TEXT: &str = "Roblox";
const GAME_PAGE_URL: &str = "https://www.roblox.com/games";
const JOIN_URL: &str = "roblox://experiences/start";
const ASSET_URL: &str = "https://assetdelivery.roblox.com/v1/asset/?id=";

/// Which buttons the default activity carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceOptions {
    /// Link to the place's web page.
    pub show_game_button: bool,
    /// Deep link that joins the same server. Public servers only.
    pub show_join_button: bool,
}

impl Default for PresenceOptions {
    fn default() -> Self {
        Self {
            show_game_button: true,
            show_join_button: true,
        }
    }
}

/// Keeps the published activity in step with the session.
#[derive(Debug)]
pub struct PresenceTracker<P> {
    publisher: P,
    options: PresenceOptions,
    /// Currently published activity.
    activity: Option<Activity>,
    /// What the current session looks like without any in-game overrides.
    defaults: Option<Activity>,
    /// Place of the last session and when it started, so a teleport within
    /// the same place keeps its elapsed time.
    place_started: Option<(String, i64)>,
}

impl<P: ActivityPublisher> PresenceTracker<P> {
    pub fn new(publisher: P, options: PresenceOptions) -> Self {
        Self {
            publisher,
            options,
            activity: None,
            defaults: None,
            place_started: None,
        }
    }

    pub fn activity(&self) -> Option<&Activity> {
        self.activity.as_ref()
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    fn start_time(&self, session: &GameSession) -> i64 {
        match &self.place_started {
            Some((place, started)) if session.is_teleport && *place == session.place_id => *started,
            _ => chrono::Utc::now().timestamp(),
        }
    }

    fn default_activity(&self, session: &GameSession, start: i64) -> Activity {
        let mut state = match session.server_type {
            ServerType::Public => "Public server",
            ServerType::Private => "Private server",
            ServerType::Reserved => "Reserved server",
        }
        .to_string();
        if session.is_teleport {
            state.push_str(" (teleported)");
        }

        let mut buttons = Vec::new();
        if self.options.show_game_button {
            buttons.push(ActivityButton {
                label: "See game page".into(),
                url: format!("{GAME_PAGE_URL}/{}", session.place_id),
            });
        }
        if self.options.show_join_button && session.server_type == ServerType::Public {
            buttons.push(ActivityButton {
                label: "Join server".into(),
                url: format!(
                    "{JOIN_URL}?placeId={}&gameInstanceId={}",
                    session.place_id, session.job_id
                ),
            });
        }

        Activity {
            details: format!("Playing place {}", session.place_id),
            state,
            large_image: Some(ActivityImage {
                key: LARGE_IMAGE_KEY.into(),
                text: LARGE_IMAGE_TEXT.into(),
            }),
            small_image: None,
            start: Some(start),
            end: None,
            buttons,
        }
    }

    fn publish(&mut self) -> Result<(), PresenceError> {
        match &self.activity {
            Some(activity) => self.publisher.set_activity(activity),
            None => self.publisher.clear_activity(),
        }
    }
}

impl<P: ActivityPublisher> PresenceSink for PresenceTracker<P> {
    fn session_started(&mut self, session: &GameSession) -> Result<(), PresenceError> {
        let start = self.start_time(session);
        self.place_started = Some((session.place_id.clone(), start));

        let activity = self.default_activity(session, start);
        self.defaults = Some(activity.clone());
        self.activity = Some(activity);
        self.publish()
    }

    fn session_ended(&mut self, session: &GameSession) -> Result<(), PresenceError> {
        tracing::debug!(place_id = %session.place_id, "clearing presence");
        self.activity = None;
        self.defaults = None;
        self.publish()
    }

    fn apply_message(
        &mut self,
        session: &GameSession,
        message: &Message,
    ) -> Result<(), PresenceError> {
        if let Command::Unknown(command) = message.kind() {
            tracing::warn!(%command, "ignoring unknown in-game command");
            return Ok(());
        }

        let update = message
            .rich_presence()
            .map_err(|e| PresenceError::Rejected(e.to_string()))?;
        let Some(update) = update else {
            return Ok(());
        };

        if self.defaults.is_none() {
            let start = self.start_time(session);
            self.defaults = Some(self.default_activity(session, start));
        }
        let defaults = self.defaults.clone().unwrap_or_default();
        let activity = self.activity.get_or_insert_with(|| defaults.clone());

        apply_text(&mut activity.details, update.details.as_deref(), &defaults.details);
        apply_text(&mut activity.state, update.state.as_deref(), &defaults.state);
        apply_time(&mut activity.start, update.time_start);
        apply_time(&mut activity.end, update.time_end);
        apply_image(
            &mut activity.small_image,
            update.small_image.as_ref(),
            &defaults.small_image,
        );
        apply_image(
            &mut activity.large_image,
            update.large_image.as_ref(),
            &defaults.large_image,
        );

        self.publish()
    }
}

fn apply_text(target: &mut String, update: Option<&str>, default: &str) {
    match update {
        None => {}
        Some("") => *target = default.to_string(),
        Some(value) => *target = value.to_string(),
    }
}

fn apply_time(target: &mut Option<i64>, update: Option<u64>) {
    match update {
        None => {}
        Some(0) => *target = None,
        Some(secs) => *target = i64::try_from(secs).ok(),
    }
}

fn apply_image(
    target: &mut Option<ActivityImage>,
    update: Option<&RichPresenceImage>,
    default: &Option<ActivityImage>,
) {
    let Some(update) = update else {
        return;
    };
    if update.clear {
        *target = None;
        return;
    }
    if update.reset {
        *target = default.clone();
        return;
    }

    let image = target.get_or_insert_with(|| default.clone().unwrap_or_default());
    if let Some(asset_id) = update.asset_id {
        image.key = format!("{ASSET_URL}{asset_id}");
    }
    if let Some(text) = &update.hover_text {
        image.text = text.clone();
    }
}
