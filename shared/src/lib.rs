//! Wire types shared by the scoreboard server and its clients.
//!
//! Clients send [`Command`]s as JSON objects such as
//! `{"action":"increment","team":"A"}`. The server answers with
//! [`ScoreSnapshot`]s encoded as `{"scoreA":1,"scoreB":0}`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default endpoint path the server upgrades connections on.
pub const DEFAULT_WS_PATH: &str = "/ws";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed command: {0}")]
    MalformedCommand(#[from] serde_json::Error),
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(serde_json::Error),
    #[error("failed to encode message: {0}")]
    Encode(serde_json::Error),
}

/// Mutation requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Increment,
    Decrement,
    Reset,
    Unknown,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Increment => "increment",
            Action::Decrement => "decrement",
            Action::Reset => "reset",
            Action::Unknown => "",
        }
    }
}

impl From<&str> for Action {
    fn from(value: &str) -> Self {
        match value {
            "increment" => Action::Increment,
            "decrement" => Action::Decrement,
            "reset" => Action::Reset,
            _ => Action::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    A,
    B,
    Other,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::A => "A",
            Team::B => "B",
            Team::Other => "",
        }
    }
}

impl From<&str> for Team {
    fn from(value: &str) -> Self {
        match value {
            "A" => Team::A,
            "B" => Team::B,
            _ => Team::Other,
        }
    }
}

/// JSON shape of a command. Missing or null fields decode as empty strings.
/// Capitalized keys are accepted on input; output always uses lowercase.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WireCommand {
    #[serde(default, alias = "Action")]
    action: Option<String>,
    #[serde(default, alias = "Team")]
    team: Option<String>,
}

/// A decoded client instruction.
///
/// Unrecognized action or team strings still decode; they map to
/// [`Action::Unknown`] / [`Team::Other`] and are treated as no-ops by the
/// server. Only text that is not a JSON object fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireCommand", into = "WireCommand")]
pub struct Command {
    pub action: Action,
    pub team: Team,
}

impl From<WireCommand> for Command {
    fn from(wire: WireCommand) -> Self {
        Command {
            action: Action::from(wire.action.as_deref().unwrap_or_default()),
            team: Team::from(wire.team.as_deref().unwrap_or_default()),
        }
    }
}

impl From<Command> for WireCommand {
    fn from(command: Command) -> Self {
        let team = match command.team {
            Team::Other => None,
            team => Some(team.as_str().to_string()),
        };
        WireCommand {
            action: Some(command.action.as_str().to_string()),
            team,
        }
    }
}

impl Command {
    pub fn new(action: Action, team: Team) -> Self {
        Self { action, team }
    }

    pub fn increment(team: Team) -> Self {
        Self::new(Action::Increment, team)
    }

    pub fn decrement(team: Team) -> Self {
        Self::new(Action::Decrement, team)
    }

    pub fn reset() -> Self {
        Self::new(Action::Reset, Team::Other)
    }

    /// Parses one inbound text message
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            Action::Reset => write!(f, "reset"),
            Action::Unknown => write!(f, "unknown action"),
            action => write!(f, "{} {}", action.as_str(), self.team.as_str()),
        }
    }
}

/// Both team scores at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    #[serde(rename = "scoreA")]
    pub score_a: u64,
    #[serde(rename = "scoreB")]
    pub score_b: u64,
}

impl ScoreSnapshot {
    pub fn new(score_a: u64, score_b: u64) -> Self {
        Self { score_a, score_b }
    }

    /// Score for `team`, `None` for [`Team::Other`]
    pub fn score(&self, team: Team) -> Option<u64> {
        match team {
            Team::A => Some(self.score_a),
            Team::B => Some(self.score_b),
            Team::Other => None,
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::MalformedSnapshot)
    }
}

impl fmt::Display for ScoreSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A {} : {} B", self.score_a, self.score_b)
    }
}
