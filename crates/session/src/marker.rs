//! Log line markers and field extraction.
//!
//! Each known line category is identified by a fixed substring. Three of
//! them carry fields that are pulled out with a regular expression; the
//! patterns are compiled once per process and shared by every matcher.

use std::sync::LazyLock;

use regex::Regex;

/// A known category of client log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// The client is joining a private server. Precedes the join line.
    PrivateServerJoin,
    /// A teleport is being refined into a reserved-server transfer.
    ReservedServerTeleport,
    /// The client announced which place/job/server it is joining.
    Joining,
    /// The RCC address was resolved to the UDMUX address actually used.
    Udmux,
    /// The server confirmed the connection.
    Joined,
    /// The client left the server.
    Disconnected,
    /// An in-game teleport started.
    Teleporting,
    /// An experience wrote a custom message to the log.
    Message,
}

impl Marker {
    /// All markers, in lookup order.
    pub const ALL: [Marker; 8] = [
        Marker::PrivateServerJoin,
        Marker::ReservedServerTeleport,
        Marker::Joining,
        Marker::Udmux,
        Marker::Joined,
        Marker::Disconnected,
        Marker::Teleporting,
        Marker::Message,
    ];

    /// The substring that identifies this marker.
    pub fn substring(self) -> &'static str {
        match self {
            Marker::PrivateServerJoin => {
                "[FLog::GameJoinUtil] GameJoinUtil::joinGamePostPrivateServer"
            }
            Marker::ReservedServerTeleport => {
                "[FLog::GameJoinUtil] GameJoinUtil::initiateTeleportToReservedServer"
            }
            Marker::Joining => "[FLog::Output] ! Joining game",
            Marker::Udmux => "[FLog::Network] UDMUX Address = ",
            Marker::Joined => "[FLog::Network] serverId:",
            Marker::Disconnected => "[FLog::Network] Time to disconnect replication data:",
            Marker::Teleporting => "[FLog::SingleSurfaceApp] initiateTeleport",
            Marker::Message => "[FLog::Output] [BloxstrapRPC]",
        }
    }
}

/// Fields of a `Joining game` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinLine<'a> {
    pub job_id: &'a str,
    pub place_id: &'a str,
    pub server_address: &'a str,
}

/// Fields of a `UDMUX Address` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdmuxLine<'a> {
    /// Address the client actually connects to.
    pub udmux_address: &'a str,
    /// Address announced by the join line this refines.
    pub rcc_address: &'a str,
}

struct Patterns {
    joining: Regex,
    udmux: Regex,
    joined: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    joining: Regex::new(r"! Joining game '([0-9a-f\-]{36})' place ([0-9]+) at ([0-9\.]+)")
        .expect("joining pattern is valid"),
    udmux: Regex::new(
        r"UDMUX Address = ([0-9\.]+), Port = [0-9]+ \| RCC Server Address = ([0-9\.]+), Port = [0-9]+",
    )
    .expect("UDMUX pattern is valid"),
    // Client builds differ on the space after the colon.
    joined: Regex::new(r"serverId:\s*([0-9\.]+)\|[0-9]+").expect("joined pattern is valid"),
});

/// Classifies log lines and extracts their fields.
///
/// Cheap to copy: it only holds a reference to the shared compiled patterns.
#[derive(Clone, Copy)]
pub struct LineMatcher {
    patterns: &'static Patterns,
}

impl Default for LineMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LineMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineMatcher").finish_non_exhaustive()
    }
}

impl LineMatcher {
    pub fn new() -> Self {
        Self {
            patterns: &PATTERNS,
        }
    }

    /// Returns the first marker, in [`Marker::ALL`] order, whose substring
    /// occurs in `line`.
    pub fn classify(&self, line: &str) -> Option<Marker> {
        self.classify_among(line, &Marker::ALL)
    }

    /// Returns the first of `candidates` whose substring occurs in `line`.
    ///
    /// Message payloads are free text written by the experience and may
    /// quote any marker, so callers restrict the lookup to the markers that
    /// matter in their current state.
    pub fn classify_among(&self, line: &str, candidates: &[Marker]) -> Option<Marker> {
        candidates
            .iter()
            .copied()
            .find(|marker| line.contains(marker.substring()))
    }

    /// Extracts job, place and server address from a `Joining game` line.
    pub fn joining<'a>(&self, line: &'a str) -> Option<JoinLine<'a>> {
        let caps = self.patterns.joining.captures(line)?;
        Some(JoinLine {
            job_id: caps.get(1)?.as_str(),
            place_id: caps.get(2)?.as_str(),
            server_address: caps.get(3)?.as_str(),
        })
    }

    /// Extracts both addresses from a `UDMUX Address` line.
    pub fn udmux<'a>(&self, line: &'a str) -> Option<UdmuxLine<'a>> {
        let caps = self.patterns.udmux.captures(line)?;
        Some(UdmuxLine {
            udmux_address: caps.get(1)?.as_str(),
            rcc_address: caps.get(2)?.as_str(),
        })
    }

    /// Extracts the server address from a `serverId:` confirmation line.
    pub fn joined<'a>(&self, line: &'a str) -> Option<&'a str> {
        let caps = self.patterns.joined.captures(line)?;
        Some(caps.get(1)?.as_str())
    }

    /// Returns the raw content after the custom message marker.
    pub fn message_payload<'a>(&self, line: &'a str) -> Option<&'a str> {
        let marker = Marker::Message.substring();
        let start = line.find(marker)? + marker.len();
        Some(&line[start..])
    }
}
