//! Session state types.
//!
//! The join identifiers only exist inside [`SessionState::Joining`] and
//! [`SessionState::InGame`], so a record can never be half-populated.

use std::fmt;

/// Classification of the destination server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ServerType {
    #[default]
    Public,
    Private,
    Reserved,
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerType::Public => write!(f, "public"),
            ServerType::Private => write!(f, "private"),
            ServerType::Reserved => write!(f, "reserved"),
        }
    }
}

/// A join attempt, or a confirmed session, on one server instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    pub place_id: String,
    pub job_id: String,
    /// Address of the target server; confirmation lines must echo it.
    pub server_address: String,
    pub server_type: ServerType,
    /// The join came from an in-game teleport rather than a fresh launch.
    pub is_teleport: bool,
}

/// Where the client currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No join in progress. `server_type` is the type the next join will
    /// carry, pinned to `Private` by a private-server marker.
    Idle { server_type: ServerType },
    /// The client announced a join and awaits server confirmation.
    Joining(GameSession),
    /// The server confirmed the join.
    InGame(GameSession),
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle {
            server_type: ServerType::Public,
        }
    }
}

impl SessionState {
    /// The join attempt or session, if any.
    pub fn session(&self) -> Option<&GameSession> {
        match self {
            SessionState::Idle { .. } => None,
            SessionState::Joining(session) | SessionState::InGame(session) => Some(session),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle { .. })
    }

    pub fn is_joining(&self) -> bool {
        matches!(self, SessionState::Joining(_))
    }

    pub fn in_game(&self) -> bool {
        matches!(self, SessionState::InGame(_))
    }

    pub fn server_type(&self) -> ServerType {
        match self {
            SessionState::Idle { server_type } => *server_type,
            SessionState::Joining(session) | SessionState::InGame(session) => session.server_type,
        }
    }
}

/// Teleport announced while in game, waiting for the next join line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingTeleport {
    /// A plain teleport to another server.
    Standard,
    /// A teleport refined into a reserved-server transfer.
    Reserved,
}

/// Flat, read-only view of a [`SessionState`].
///
/// `Default` is the idle record: not in game, identifiers empty, public.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub in_game: bool,
    pub is_teleport: bool,
    pub server_type: ServerType,
    pub place_id: String,
    pub job_id: String,
    pub server_address: String,
}

impl From<&SessionState> for SessionRecord {
    fn from(state: &SessionState) -> Self {
        match state.session() {
            Some(session) => SessionRecord {
                in_game: state.in_game(),
                is_teleport: session.is_teleport,
                server_type: session.server_type,
                place_id: session.place_id.clone(),
                job_id: session.job_id.clone(),
                server_address: session.server_address.clone(),
            },
            None => SessionRecord {
                server_type: state.server_type(),
                ..SessionRecord::default()
            },
        }
    }
}
