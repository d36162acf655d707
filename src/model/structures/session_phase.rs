use serde_repr::{Deserialize_repr, Serialize_repr};
use strum_macros::Display;

/// Adaptive phase of the session, derived from average games played per
/// active player.
#[derive(
    Deserialize_repr, Serialize_repr, Display, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default
)]
#[repr(u8)]
pub enum SessionPhase {
    #[default]
    Early = 0,
    Mid = 1,
    Late = 2
}
