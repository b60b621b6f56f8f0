//! The session state machine.
//!
//! Consumes log lines one at a time, in file order, and applies the
//! transition for the marker the line carries. Every marker is only
//! meaningful in one state, and only that state's markers are looked for.

use crate::error::SessionError;
use crate::marker::{LineMatcher, Marker};
use crate::sink::{JsonMessageParser, MessageParser, PresenceSink};
use crate::state::{GameSession, PendingTeleport, ServerType, SessionRecord, SessionState};

/// Markers looked for in each state, in the order they are tried.
const IDLE_MARKERS: &[Marker] = &[Marker::PrivateServerJoin, Marker::Joining];
const JOINING_MARKERS: &[Marker] = &[Marker::Udmux, Marker::Joined];
const IN_GAME_MARKERS: &[Marker] = &[Marker::Disconnected, Marker::Teleporting, Marker::Message];
const TELEPORTING_MARKERS: &[Marker] = &[
    Marker::Disconnected,
    Marker::Teleporting,
    Marker::ReservedServerTeleport,
    Marker::Message,
];

/// Tracks the client session from its log output.
#[derive(Debug)]
pub struct SessionStateMachine<S, P = JsonMessageParser> {
    matcher: LineMatcher,
    state: SessionState,
    /// Survives the disconnect that a teleport produces; consumed by the
    /// next join line.
    pending: Option<PendingTeleport>,
    sink: S,
    parser: P,
}

impl<S: PresenceSink> SessionStateMachine<S> {
    /// Creates an idle machine that decodes messages as JSON.
    pub fn new(sink: S) -> Self {
        Self::with_parser(sink, JsonMessageParser)
    }
}

impl<S: PresenceSink, P: MessageParser> SessionStateMachine<S, P> {
    /// Creates an idle machine with a custom message parser.
    pub fn with_parser(sink: S, parser: P) -> Self {
        Self {
            matcher: LineMatcher::new(),
            state: SessionState::default(),
            pending: None,
            sink,
            parser,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Flat snapshot of the current state.
    pub fn record(&self) -> SessionRecord {
        SessionRecord::from(&self.state)
    }

    pub fn pending_teleport(&self) -> Option<PendingTeleport> {
        self.pending
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Applies one log line.
    ///
    /// Lines without a known marker, lines whose fields fail to extract, and
    /// lines whose address does not correlate with the current join are
    /// ignored. Errors come only from the collaborators: a message payload
    /// that fails to decode (state untouched) or a failing presence sink
    /// (state already transitioned).
    pub fn handle_line(&mut self, line: &str) -> Result<(), SessionError> {
        let Some(marker) = self.matcher.classify_among(line, self.candidates()) else {
            return Ok(());
        };

        match marker {
            Marker::PrivateServerJoin => self.on_private_server_join(),
            Marker::ReservedServerTeleport => self.on_reserved_teleport(),
            Marker::Joining => self.on_joining(line),
            Marker::Udmux => self.on_udmux(line),
            Marker::Joined => return self.on_joined(line),
            Marker::Disconnected => return self.on_disconnected(),
            Marker::Teleporting => self.on_teleporting(),
            Marker::Message => return self.on_message(line),
        }
        Ok(())
    }

    /// Drops everything being tracked and returns to idle.
    ///
    /// A new log file means a new client run, so the previous run is over
    /// even if it never logged a disconnect. A session still in game is
    /// reported ended to the sink; the machine is idle either way.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.pending = None;
        if let SessionState::InGame(session) = std::mem::take(&mut self.state) {
            tracing::info!(
                place_id = %session.place_id,
                job_id = %session.job_id,
                "ending tracked session"
            );
            self.sink.session_ended(&session)?;
        }
        Ok(())
    }

    fn candidates(&self) -> &'static [Marker] {
        match (&self.state, self.pending) {
            (SessionState::Idle { .. }, _) => IDLE_MARKERS,
            (SessionState::Joining(_), _) => JOINING_MARKERS,
            (SessionState::InGame(_), None) => IN_GAME_MARKERS,
            (SessionState::InGame(_), Some(_)) => TELEPORTING_MARKERS,
        }
    }

    fn on_private_server_join(&mut self) {
        // The client logs this before the join line; `on_joining` reads the
        // pinned type back out of `Idle`.
        if let SessionState::Idle { server_type } = &mut self.state {
            *server_type = ServerType::Private;
            tracing::debug!("private server join pending");
        }
    }

    fn on_reserved_teleport(&mut self) {
        if self.state.in_game() && self.pending.is_some() {
            tracing::info!("teleporting to reserved server");
            self.pending = Some(PendingTeleport::Reserved);
        }
    }

    fn on_joining(&mut self, line: &str) {
        let SessionState::Idle { server_type } = self.state else {
            return;
        };
        let Some(join) = self.matcher.joining(line) else {
            return;
        };

        let (server_type, is_teleport) = match self.pending.take() {
            Some(PendingTeleport::Reserved) => (ServerType::Reserved, true),
            Some(PendingTeleport::Standard) => (server_type, true),
            None => (server_type, false),
        };

        let session = GameSession {
            place_id: join.place_id.to_string(),
            job_id: join.job_id.to_string(),
            server_address: join.server_address.to_string(),
            server_type,
            is_teleport,
        };
        tracing::info!(
            job_id = %session.job_id,
            place_id = %session.place_id,
            address = %session.server_address,
            %server_type,
            is_teleport,
            "joining game"
        );
        self.state = SessionState::Joining(session);
    }

    fn on_udmux(&mut self, line: &str) {
        let SessionState::Joining(session) = &mut self.state else {
            return;
        };
        let Some(udmux) = self.matcher.udmux(line) else {
            return;
        };
        if udmux.rcc_address != session.server_address {
            tracing::debug!(
                rcc = udmux.rcc_address,
                expected = %session.server_address,
                "ignoring UDMUX line for another server"
            );
            return;
        }

        session.server_address = udmux.udmux_address.to_string();
        tracing::debug!(address = %session.server_address, "got game join UDMUX");
    }

    fn on_joined(&mut self, line: &str) -> Result<(), SessionError> {
        let Some(address) = self.matcher.joined(line) else {
            return Ok(());
        };

        let confirmed = match std::mem::take(&mut self.state) {
            SessionState::Joining(session) if session.server_address == address => {
                self.state = SessionState::InGame(session);
                true
            }
            SessionState::Joining(session) => {
                tracing::debug!(
                    address,
                    expected = %session.server_address,
                    "ignoring join confirmation for another server"
                );
                self.state = SessionState::Joining(session);
                false
            }
            other => {
                self.state = other;
                false
            }
        };

        if let (true, SessionState::InGame(session)) = (confirmed, &self.state) {
            tracing::info!(
                place_id = %session.place_id,
                job_id = %session.job_id,
                address = %session.server_address,
                "joined game"
            );
            self.sink.session_started(session)?;
        }
        Ok(())
    }

    fn on_disconnected(&mut self) -> Result<(), SessionError> {
        match std::mem::take(&mut self.state) {
            SessionState::InGame(session) => {
                tracing::info!(
                    place_id = %session.place_id,
                    job_id = %session.job_id,
                    address = %session.server_address,
                    "disconnected from game"
                );
                self.sink.session_ended(&session)?;
            }
            other => self.state = other,
        }
        Ok(())
    }

    fn on_teleporting(&mut self) {
        if let SessionState::InGame(session) = &self.state {
            tracing::info!(
                place_id = %session.place_id,
                job_id = %session.job_id,
                address = %session.server_address,
                "teleporting to server"
            );
            // A reserved transfer already announced stays reserved.
            if self.pending.is_none() {
                self.pending = Some(PendingTeleport::Standard);
            }
        }
    }

    fn on_message(&mut self, line: &str) -> Result<(), SessionError> {
        let SessionState::InGame(session) = &self.state else {
            return Ok(());
        };
        let Some(payload) = self.matcher.message_payload(line) else {
            return Ok(());
        };

        let message = self.parser.parse(payload)?;
        tracing::debug!(command = %message.command, "received in-game message");
        self.sink.apply_message(session, &message)?;
        Ok(())
    }
}
