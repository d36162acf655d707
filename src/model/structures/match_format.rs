use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::Display;

#[derive(Deserialize_repr, Serialize_repr, Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MatchFormat {
    Singles = 1,
    #[default]
    Doubles = 2
}

impl MatchFormat {
    pub fn players_per_team(&self) -> usize {
        *self as usize
    }

    pub fn players_per_match(&self) -> usize {
        self.players_per_team() * 2
    }
}

impl TryFrom<i32> for MatchFormat {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(MatchFormat::Singles),
            2 => Ok(MatchFormat::Doubles),
            _ => Err(())
        }
    }
}
