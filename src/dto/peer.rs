use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

use crate::dto::score::ScoreRecord;

/// Wire tag of a session-started notice.
pub const GAME_START_EVENT: &str = "gameStart";
/// Wire tag of a session-ended notice.
pub const GAME_END_EVENT: &str = "gameEnd";

/// Raw frame exchanged over the relay: `{from, type, value}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PeerMessage {
    /// Display name of the participant that emitted the notice.
    #[validate(length(min = 1))]
    pub from: String,
    /// Event tag, see [`GAME_START_EVENT`] and [`GAME_END_EVENT`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Event payload; an empty object for starts, the score record for ends.
    #[serde(default)]
    pub value: Value,
}

/// Failures while decoding an inbound relay frame.
#[derive(Debug, Error)]
pub enum PeerMessageError {
    /// Frame is not the expected JSON object.
    #[error("malformed peer message")]
    Malformed(#[source] serde_json::Error),
    /// Envelope parsed but a field failed validation.
    #[error("invalid peer message: {0}")]
    Invalid(#[from] validator::ValidationErrors),
    /// A known event carried a payload of the wrong shape.
    #[error("invalid `{kind}` payload")]
    Payload {
        /// Event tag whose payload was rejected.
        kind: &'static str,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
}

impl PeerMessage {
    /// Parse and validate a text frame.
    pub fn from_json_str(text: &str) -> Result<Self, PeerMessageError> {
        let message: Self = serde_json::from_str(text).map_err(PeerMessageError::Malformed)?;
        message.validate()?;
        Ok(message)
    }
}

/// Typed lifecycle notice exchanged between participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// `from` started a new session.
    SessionStarted {
        /// Participant name.
        from: String,
    },
    /// `from` finished a session with `record`.
    SessionEnded {
        /// Participant name.
        from: String,
        /// Final result of the session.
        record: ScoreRecord,
    },
}

impl PeerEvent {
    /// Participant the notice is attributed to.
    pub fn from(&self) -> &str {
        match self {
            Self::SessionStarted { from } | Self::SessionEnded { from, .. } => from,
        }
    }

    /// Decode a raw frame. Unknown event tags yield `Ok(None)`.
    pub fn from_message(message: PeerMessage) -> Result<Option<Self>, PeerMessageError> {
        let PeerMessage { from, kind, value } = message;
        let event = match kind.as_str() {
            GAME_START_EVENT => Self::SessionStarted { from },
            GAME_END_EVENT => {
                let record = serde_json::from_value(value).map_err(|source| {
                    PeerMessageError::Payload {
                        kind: GAME_END_EVENT,
                        source,
                    }
                })?;
                Self::SessionEnded { from, record }
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Encode into the relay envelope.
    pub fn to_message(&self) -> PeerMessage {
        match self {
            Self::SessionStarted { from } => PeerMessage {
                from: from.clone(),
                kind: GAME_START_EVENT.into(),
                value: Value::Object(Default::default()),
            },
            Self::SessionEnded { from, record } => PeerMessage {
                from: from.clone(),
                kind: GAME_END_EVENT.into(),
                value: serde_json::to_value(record).unwrap_or(Value::Null),
            },
        }
    }
}
