use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;

#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MatchStatus {
    #[default]
    Waiting = 0,
    InProgress = 1,
    Completed = 2,
    Forfeited = 3
}

impl MatchStatus {
    /// Completed and forfeited matches never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Forfeited)
    }
}

impl TryFrom<i32> for MatchStatus {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(MatchStatus::Waiting),
            1 => Ok(MatchStatus::InProgress),
            2 => Ok(MatchStatus::Completed),
            3 => Ok(MatchStatus::Forfeited),
            _ => Err(())
        }
    }
}
