use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// API request structure
///
/// Every request is a flat JSON object carrying an `action` discriminant;
/// the connection injects the credential fields before sending.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum Request {
    /// Fetch the full home configuration and state snapshot
    GetHome,

    /// Fetch the current raw state of the given item ids
    GetState { items: Vec<String> },

    /// Register a polling queue or drain an existing one
    PollListen {
        #[serde(rename = "type")]
        kind: PollKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        uuid: Option<String>,
    },

    /// Send a command value to an output item
    SetState {
        #[serde(rename = "type")]
        io_type: IoDirection,
        id: String,
        value: String,
    },
}

/// Sub-action of `poll_listen`
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PollKind {
    Register,
    Get,
}

/// Direction of an item: whether it can be read, driven, or both
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IoDirection {
    /// Observable only
    #[default]
    Input,
    /// Controllable only
    Output,
    /// Both observable and controllable
    InOut,
}

impl IoDirection {
    /// Whether commands may be sent to an item with this direction
    pub fn is_output(self) -> bool {
        matches!(self, IoDirection::Output | IoDirection::InOut)
    }
}

impl std::fmt::Display for IoDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IoDirection::Input => "input",
            IoDirection::Output => "output",
            IoDirection::InOut => "inout",
        };
        f.write_str(s)
    }
}

/// `get_home` response payload
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HomePayload {
    #[serde(default)]
    pub home: Vec<RoomData>,
}

/// One room record from the home snapshot
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RoomData {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub items: Vec<ItemData>,
}

/// One item record from the home snapshot
///
/// The server is loose about field presence and sometimes about field
/// types (booleans and numbers arrive as strings, or the other way
/// around), so every field decodes tolerantly. Records that end up
/// without an id are dropped by the registry loader.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ItemData {
    #[serde(default, deserialize_with = "de_raw_string")]
    pub id: String,
    #[serde(default, deserialize_with = "de_raw_string")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub gui_type: String,
    #[serde(default, deserialize_with = "de_direction")]
    pub io_type: IoDirection,
    #[serde(default)]
    pub var_type: String,
    #[serde(default, deserialize_with = "de_wire_bool")]
    pub visible: bool,
    #[serde(default, deserialize_with = "de_raw_string")]
    pub state: String,
}

/// `poll_listen` register response payload
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RegisterPayload {
    pub uuid: Option<String>,
}

/// `poll_listen` get response payload
///
/// Event records are kept as raw values: each one is validated
/// individually so a single malformed record never poisons the batch.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PollPayload {
    #[serde(default, deserialize_with = "de_wire_bool")]
    pub success: bool,
    #[serde(default)]
    pub events: Vec<Value>,
}

/// `set_state` response payload
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AckPayload {
    #[serde(default, deserialize_with = "de_wire_bool")]
    pub success: bool,
}

/// Render any scalar JSON value as the raw wire string it stands for
pub(crate) fn raw_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn de_raw_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(raw_string(&value))
}

/// Unknown direction strings degrade to `Input`, which forbids commands.
fn de_direction<'de, D>(deserializer: D) -> Result<IoDirection, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value.as_str() {
        Some("output") => IoDirection::Output,
        Some("inout") => IoDirection::InOut,
        _ => IoDirection::Input,
    })
}

/// The server reports flags as JSON booleans or as the strings
/// "true"/"false" depending on the endpoint; accept both.
fn de_wire_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::String(s) => s == "true",
        _ => false,
    })
}
