use crate::model::{error::SessionError, session::Session};

/// Serializes the full session to self-describing JSON. Callers owning a
/// different serde format can encode `Session` directly instead.
pub fn to_json(session: &Session) -> Result<String, SessionError> {
    Ok(serde_json::to_string_pretty(session)?)
}

/// Restores a session snapshot. Unknown fields are ignored and missing
/// optional fields take their documented defaults, so snapshots from
/// older or newer writers stay readable.
pub fn from_json(json: &str) -> Result<Session, SessionError> {
    Ok(serde_json::from_str(json)?)
}
