//! Wire messages exchanged between editor peers and the relay.
//!
//! This crate owns the JSON representation used by `executor`, `server` and
//! `cli`. Every message is a flat object discriminated by `type`; `edit`
//! messages are further discriminated by `tool`. The relay stamps a
//! per-scene `seq` onto everything it forwards, carried here by
//! [`Envelope`].
//!
//! DECODING
//! ========
//! [`decode`] classifies before it deserializes, so a caller can tell a
//! payload that is not JSON apart from a well-formed message of a type or
//! tool this build does not know. Both are dropped by the receiver; only the
//! log line differs.

pub use mesh::ErrorCode;
use mesh::{ObjectId, PartId, PartKind, Primitive};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every `type` a peer may send or receive.
pub const MESSAGE_TYPES: [&str; 10] =
    ["message", "create", "lock", "unlock", "leave", "join", "name", "meta", "edit", "error"];

/// Every `tool` an `edit` message may carry.
pub const EDIT_TOOLS: [&str; 9] =
    ["translate", "rotate", "scale", "delete", "extrude", "connect", "merge", "paint", "texture"];

/// Error returned by [`decode`] and [`encode`].
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The text is not JSON at all.
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON is not an object with a string `type`.
    #[error("message has no type")]
    MissingType,
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("unknown edit tool: {0}")]
    UnknownTool(String),
    /// Known discriminator, but the fields do not fit it.
    #[error("invalid {kind} message: {reason}")]
    Invalid { kind: String, reason: String },
}

impl ErrorCode for ProtocolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Json(_) => "E_DECODE",
            Self::MissingType => "E_MISSING_TYPE",
            Self::UnknownType(_) => "E_UNKNOWN_TYPE",
            Self::UnknownTool(_) => "E_UNKNOWN_TOOL",
            Self::Invalid { .. } => "E_INVALID_MESSAGE",
        }
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

/// A message plus the sequence number the relay stamped on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    #[serde(flatten)]
    pub message: Message,
}

impl Envelope {
    /// An unstamped envelope, as a peer sends it.
    #[must_use]
    pub fn new(message: Message) -> Self {
        Self { seq: None, message }
    }

    #[must_use]
    pub fn stamped(message: Message, seq: u64) -> Self {
        Self { seq: Some(seq), message }
    }
}

impl From<Message> for Envelope {
    fn from(message: Message) -> Self {
        Self::new(message)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Chat line.
    #[serde(rename = "message")]
    Chat { user: String, text: String },
    /// Ask every peer to build a primitive; ids derive from the stamped `seq`.
    Create { object: Primitive },
    Lock { user: String, objects: Vec<ObjectId> },
    Unlock { user: String, objects: Vec<ObjectId> },
    Leave { user: String },
    Join { user: String },
    /// Scene rename.
    Name { value: String },
    /// Sent by the relay to a peer that just joined.
    Meta { name: String, users: Vec<String> },
    Edit(Edit),
    /// Relay reply to a message it could not accept.
    Error { message: String },
}

impl Message {
    /// The `type` discriminator.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "message",
            Self::Create { .. } => "create",
            Self::Lock { .. } => "lock",
            Self::Unlock { .. } => "unlock",
            Self::Leave { .. } => "leave",
            Self::Join { .. } => "join",
            Self::Name { .. } => "name",
            Self::Meta { .. } => "meta",
            Self::Edit(_) => "edit",
            Self::Error { .. } => "error",
        }
    }

    /// The user a message speaks for, when it names one.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        match self {
            Self::Chat { user, .. }
            | Self::Lock { user, .. }
            | Self::Unlock { user, .. }
            | Self::Leave { user }
            | Self::Join { user } => Some(user),
            Self::Edit(edit) => Some(&edit.user_id),
            Self::Create { .. } | Self::Name { .. } | Self::Meta { .. } | Self::Error { .. } => None,
        }
    }
}

/// A mesh edit, tagged with the user who already applied it locally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(flatten)]
    pub tool: EditTool,
}

impl Edit {
    #[must_use]
    pub fn new(user_id: impl Into<String>, tool: EditTool) -> Self {
        Self { user_id: user_id.into(), tool }
    }
}

/// Tool-specific payload of an edit.
///
/// Transform and delete edits address either whole objects (`objMode` true,
/// `ids` are object ids) or parts (`objMode` false, `ids` are
/// `[object, vertex]` pairs, or `[object, id, kind]` triples for delete).
/// Rotate and scale carry their pivot in `mx/my/mz`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum EditTool {
    Translate {
        dx: f64,
        dy: f64,
        dz: f64,
        obj_mode: bool,
        #[serde(default)]
        ids: Targets,
    },
    Rotate {
        x: f64,
        y: f64,
        z: f64,
        w: f64,
        mx: f64,
        my: f64,
        mz: f64,
        obj_mode: bool,
        #[serde(default)]
        ids: Targets,
    },
    Scale {
        sx: f64,
        sy: f64,
        sz: f64,
        mx: f64,
        my: f64,
        mz: f64,
        obj_mode: bool,
        #[serde(default)]
        ids: Targets,
    },
    Delete {
        obj_mode: bool,
        #[serde(default)]
        ids: Targets,
    },
    Extrude { obj_id: ObjectId, face_ids: Vec<PartId> },
    Connect { obj_id: ObjectId, vert_ids: Vec<PartId> },
    Merge { obj_id: ObjectId, vert_ids: Vec<PartId> },
    /// One brush dab: UV position, brush colour `bc*` and brush radius `br`.
    Paint { texture_id: String, u: f64, v: f64, bcr: f64, bcg: f64, bcb: f64, br: f64 },
    Texture { texture_id: String, obj_id: ObjectId },
}

impl EditTool {
    /// The `tool` discriminator.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Translate { .. } => "translate",
            Self::Rotate { .. } => "rotate",
            Self::Scale { .. } => "scale",
            Self::Delete { .. } => "delete",
            Self::Extrude { .. } => "extrude",
            Self::Connect { .. } => "connect",
            Self::Merge { .. } => "merge",
            Self::Paint { .. } => "paint",
            Self::Texture { .. } => "texture",
        }
    }
}

// =============================================================================
// TARGETS
// =============================================================================

/// The `ids` of a transform or delete edit.
///
/// On the wire this is a bare array; the shape of its first element decides
/// the variant. Object ids may arrive as strings or integers and are kept as
/// strings.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Targets {
    Objects(Vec<ObjectId>),
    Vertices(Vec<(ObjectId, PartId)>),
    Parts(Vec<(ObjectId, PartId, PartKind)>),
}

impl Default for Targets {
    fn default() -> Self {
        Self::Objects(Vec::new())
    }
}

impl Targets {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Objects(ids) => ids.len(),
            Self::Vertices(ids) => ids.len(),
            Self::Parts(ids) => ids.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn from_values(raw: &[Value]) -> Result<Self, String> {
        match raw.first() {
            None => Ok(Self::default()),
            Some(Value::Array(first)) => match first.len() {
                2 => raw.iter().map(vertex_pair).collect::<Result<_, _>>().map(Self::Vertices),
                3 => raw.iter().map(part_triple).collect::<Result<_, _>>().map(Self::Parts),
                n => Err(format!("target tuple of length {n}")),
            },
            Some(_) => raw.iter().map(object_key).collect::<Result<_, _>>().map(Self::Objects),
        }
    }
}

impl<'de> Deserialize<'de> for Targets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<Value>::deserialize(deserializer)?;
        Self::from_values(&raw).map_err(de::Error::custom)
    }
}

fn object_key(value: &Value) -> Result<ObjectId, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("invalid object id: {other}")),
    }
}

fn part_id(value: &Value) -> Result<PartId, String> {
    value
        .as_u64()
        .and_then(|n| PartId::try_from(n).ok())
        .ok_or_else(|| format!("invalid part id: {value}"))
}

fn tuple(value: &Value, len: usize) -> Result<&[Value], String> {
    match value {
        Value::Array(items) if items.len() == len => Ok(items),
        other => Err(format!("expected a {len}-element target, got {other}")),
    }
}

fn vertex_pair(value: &Value) -> Result<(ObjectId, PartId), String> {
    let items = tuple(value, 2)?;
    Ok((object_key(&items[0])?, part_id(&items[1])?))
}

fn part_triple(value: &Value) -> Result<(ObjectId, PartId, PartKind), String> {
    let items = tuple(value, 3)?;
    let kind = PartKind::deserialize(&items[2]).map_err(|e| format!("invalid part kind: {e}"))?;
    Ok((object_key(&items[0])?, part_id(&items[1])?, kind))
}

// =============================================================================
// CODEC
// =============================================================================

/// Decode one text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] when the text is not JSON,
/// [`ProtocolError::MissingType`] when it has no string `type`,
/// [`ProtocolError::UnknownType`]/[`ProtocolError::UnknownTool`] for
/// discriminators this build does not know, and [`ProtocolError::Invalid`]
/// when a known message has the wrong fields.
pub fn decode(text: &str) -> Result<Envelope, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = value.get("type").and_then(Value::as_str).ok_or(ProtocolError::MissingType)?;
    if !MESSAGE_TYPES.contains(&kind) {
        return Err(ProtocolError::UnknownType(kind.to_owned()));
    }
    if kind == "edit" {
        let tool = value.get("tool").and_then(Value::as_str).unwrap_or_default();
        if !EDIT_TOOLS.contains(&tool) {
            return Err(ProtocolError::UnknownTool(tool.to_owned()));
        }
    }
    let kind = kind.to_owned();
    serde_json::from_value(value).map_err(|e| ProtocolError::Invalid { kind, reason: e.to_string() })
}

/// Encode an envelope as one text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] if serialization fails.
pub fn encode(envelope: &Envelope) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(envelope)?)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
