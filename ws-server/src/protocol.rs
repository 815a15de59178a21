//! Wire protocol for the mixer WebSocket
//!
//! Clients send `{"action": "...", "payload": {...}}` and receive
//! `{"action": "...", "status": 4000, "payload": ..., "error": "..."}`.
//! Inbound messages are decoded once, here, into a [`Command`] whose payload
//! is statically shaped per action. Anything that does not fit produces a
//! [`ProtocolError`] carrying the status code to answer with.

use std::fmt;
use std::str::FromStr;

use pulse_state::{BuildInfo, Snapshot};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of actions a client may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    GetStatus,
    GetBuildInfo,
    SetOutputVolume,
    SetOutputMuted,
    SetPlaybackVolume,
    SetPlaybackMuted,
    MovePlayback,
    SetSourceVolume,
    SetSourceMuted,
    SetRecordingVolume,
    SetRecordingMuted,
    MoveRecording,
}

impl Action {
    /// Every action, in the order advertised to clients
    pub const ALL: [Action; 12] = [
        Action::GetStatus,
        Action::GetBuildInfo,
        Action::SetOutputVolume,
        Action::SetOutputMuted,
        Action::SetPlaybackVolume,
        Action::SetPlaybackMuted,
        Action::MovePlayback,
        Action::SetSourceVolume,
        Action::SetSourceMuted,
        Action::SetRecordingVolume,
        Action::SetRecordingMuted,
        Action::MoveRecording,
    ];

    /// Name of the action on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::GetStatus => "GetStatus",
            Action::GetBuildInfo => "GetBuildInfo",
            Action::SetOutputVolume => "SetSinkVolume",
            Action::SetOutputMuted => "SetSinkMuted",
            Action::SetPlaybackVolume => "SetSinkInputVolume",
            Action::SetPlaybackMuted => "SetSinkInputMuted",
            Action::MovePlayback => "MoveSinkInput",
            Action::SetSourceVolume => "SetSourceVolume",
            Action::SetSourceMuted => "SetSourceMuted",
            Action::SetRecordingVolume => "SetSourceInputVolume",
            Action::SetRecordingMuted => "SetSourceInputMuted",
            Action::MoveRecording => "MoveSourceOutput",
        }
    }

    /// Wire names of every action
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Action::as_str).collect()
    }

    /// Whether the action changes mixer state
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Action::GetStatus | Action::GetBuildInfo)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an action name is not part of the protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum StatusCode {
    Success,
    Error,
    UnknownAction,
    InvalidPayload,
    MalformedRequest,
}

impl StatusCode {
    pub fn code(&self) -> u16 {
        match self {
            StatusCode::Success => 4000,
            StatusCode::Error => 4001,
            StatusCode::UnknownAction => 4002,
            StatusCode::InvalidPayload => 4003,
            StatusCode::MalformedRequest => 4004,
        }
    }
}

impl From<StatusCode> for u16 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, String> {
        match code {
            4000 => Ok(StatusCode::Success),
            4001 => Ok(StatusCode::Error),
            4002 => Ok(StatusCode::UnknownAction),
            4003 => Ok(StatusCode::InvalidPayload),
            4004 => Ok(StatusCode::MalformedRequest),
            other => Err(format!("unknown status code {other}")),
        }
    }
}

/// `{name, volume}` for an output device or capture source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceVolume {
    pub name: String,
    pub volume: f64,
}

/// `{name, muted}` for an output device or capture source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMute {
    pub name: String,
    pub muted: bool,
}

/// `{id, volume}` for an application stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamVolume {
    pub id: u32,
    pub volume: f64,
}

/// `{id, muted}` for an application stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMute {
    pub id: u32,
    pub muted: bool,
}

/// `{id, name}`: move stream `id` to the device called `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMove {
    #[serde(alias = "outputId")]
    pub id: u32,
    #[serde(alias = "sourceName")]
    pub name: String,
}

/// A decoded client request
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetStatus,
    GetBuildInfo,
    SetOutputVolume(DeviceVolume),
    SetOutputMuted(DeviceMute),
    SetPlaybackVolume(StreamVolume),
    SetPlaybackMuted(StreamMute),
    MovePlayback(StreamMove),
    SetSourceVolume(DeviceVolume),
    SetSourceMuted(DeviceMute),
    SetRecordingVolume(StreamVolume),
    SetRecordingMuted(StreamMute),
    MoveRecording(StreamMove),
}

impl Command {
    pub fn action(&self) -> Action {
        match self {
            Command::GetStatus => Action::GetStatus,
            Command::GetBuildInfo => Action::GetBuildInfo,
            Command::SetOutputVolume(_) => Action::SetOutputVolume,
            Command::SetOutputMuted(_) => Action::SetOutputMuted,
            Command::SetPlaybackVolume(_) => Action::SetPlaybackVolume,
            Command::SetPlaybackMuted(_) => Action::SetPlaybackMuted,
            Command::MovePlayback(_) => Action::MovePlayback,
            Command::SetSourceVolume(_) => Action::SetSourceVolume,
            Command::SetSourceMuted(_) => Action::SetSourceMuted,
            Command::SetRecordingVolume(_) => Action::SetRecordingVolume,
            Command::SetRecordingMuted(_) => Action::SetRecordingMuted,
            Command::MoveRecording(_) => Action::MoveRecording,
        }
    }

    /// Decode one inbound text message.
    ///
    /// Checks run in order: the message must be a JSON object with a string
    /// `action` (else [`StatusCode::MalformedRequest`]), the action must be
    /// known (else [`StatusCode::UnknownAction`]), and the payload must have
    /// the action's shape (else [`StatusCode::InvalidPayload`]).
    pub fn decode(text: &str) -> Result<Command, ProtocolError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ProtocolError::Malformed(format!("invalid JSON: {e}")))?;

        let Value::Object(mut envelope) = value else {
            return Err(ProtocolError::Malformed("request must be a JSON object".to_string()));
        };

        let action = match envelope.get("action") {
            Some(Value::String(name)) => name.clone(),
            Some(_) => {
                return Err(ProtocolError::Malformed("`action` must be a string".to_string()))
            }
            None => {
                return Err(ProtocolError::Malformed("missing `action`".to_string()))
            }
        };

        let action: Action = action
            .parse()
            .map_err(|UnknownAction(name)| ProtocolError::UnknownAction(name))?;
        let payload = envelope.remove("payload").unwrap_or(Value::Null);

        Ok(match action {
            Action::GetStatus => Command::GetStatus,
            Action::GetBuildInfo => Command::GetBuildInfo,
            Action::SetOutputVolume => Command::SetOutputVolume(device_volume(action, payload)?),
            Action::SetOutputMuted => Command::SetOutputMuted(payload_as(action, payload)?),
            Action::SetPlaybackVolume => {
                Command::SetPlaybackVolume(stream_volume(action, payload)?)
            }
            Action::SetPlaybackMuted => Command::SetPlaybackMuted(payload_as(action, payload)?),
            Action::MovePlayback => Command::MovePlayback(payload_as(action, payload)?),
            Action::SetSourceVolume => Command::SetSourceVolume(device_volume(action, payload)?),
            Action::SetSourceMuted => Command::SetSourceMuted(payload_as(action, payload)?),
            Action::SetRecordingVolume => {
                Command::SetRecordingVolume(stream_volume(action, payload)?)
            }
            Action::SetRecordingMuted => Command::SetRecordingMuted(payload_as(action, payload)?),
            Action::MoveRecording => Command::MoveRecording(payload_as(action, payload)?),
        })
    }
}

fn payload_as<T: DeserializeOwned>(action: Action, payload: Value) -> Result<T, ProtocolError> {
    if payload.is_null() {
        return Err(ProtocolError::InvalidPayload {
            action,
            detail: "missing payload".to_string(),
        });
    }
    serde_json::from_value(payload).map_err(|e| ProtocolError::InvalidPayload {
        action,
        detail: e.to_string(),
    })
}

fn check_volume(action: Action, volume: f64) -> Result<(), ProtocolError> {
    if volume.is_finite() && volume >= 0.0 {
        Ok(())
    } else {
        Err(ProtocolError::InvalidPayload {
            action,
            detail: format!("volume must be a non-negative number, got {volume}"),
        })
    }
}

fn device_volume(action: Action, payload: Value) -> Result<DeviceVolume, ProtocolError> {
    let body: DeviceVolume = payload_as(action, payload)?;
    check_volume(action, body.volume)?;
    Ok(body)
}

fn stream_volume(action: Action, payload: Value) -> Result<StreamVolume, ProtocolError> {
    let body: StreamVolume = payload_as(action, payload)?;
    check_volume(action, body.volume)?;
    Ok(body)
}

/// Reasons an inbound message could not be turned into a [`Command`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    /// Not JSON, not an object, or no string `action`
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// `action` names nothing in [`Action::ALL`]
    #[error("Command not found. Available actions: {}", Action::names().join(", "))]
    UnknownAction(String),

    /// The action is known but its payload has the wrong shape
    #[error("Invalid payload format for {action}: {detail}")]
    InvalidPayload { action: Action, detail: String },
}

impl ProtocolError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProtocolError::Malformed(_) => StatusCode::MalformedRequest,
            ProtocolError::UnknownAction(_) => StatusCode::UnknownAction,
            ProtocolError::InvalidPayload { .. } => StatusCode::InvalidPayload,
        }
    }

    /// Action text echoed back to the client, empty when there was none
    pub fn action(&self) -> String {
        match self {
            ProtocolError::Malformed(_) => String::new(),
            ProtocolError::UnknownAction(name) => name.clone(),
            ProtocolError::InvalidPayload { action, .. } => action.as_str().to_string(),
        }
    }

    /// Error response for this failure
    pub fn to_response(&self) -> Response {
        let payload = match self {
            ProtocolError::UnknownAction(_) => Some(ResponsePayload::Actions(AvailableActions {
                available_actions: Action::names(),
            })),
            _ => None,
        };
        Response {
            action: self.action(),
            status: self.status(),
            payload,
            error: Some(self.to_string()),
        }
    }
}

/// `{"availableActions": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableActions {
    pub available_actions: Vec<&'static str>,
}

/// Body of a response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    Snapshot(Snapshot),
    BuildInfo(BuildInfo),
    Actions(AvailableActions),
}

/// Outbound envelope; `payload` and `error` are omitted when empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub action: String,
    pub status: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ResponsePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn success(action: Action, payload: ResponsePayload) -> Self {
        Self {
            action: action.as_str().to_string(),
            status: StatusCode::Success,
            payload: Some(payload),
            error: None,
        }
    }

    /// Successful `GetStatus` envelope, also used for broadcasts
    pub fn status(snapshot: Snapshot) -> Self {
        Self::success(Action::GetStatus, ResponsePayload::Snapshot(snapshot))
    }

    /// Generic failure (status 4001)
    pub fn error(action: Action, message: impl Into<String>) -> Self {
        Self {
            action: action.as_str().to_string(),
            status: StatusCode::Error,
            payload: None,
            error: Some(message.into()),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
