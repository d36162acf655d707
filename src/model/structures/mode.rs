use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::Display;

#[derive(Deserialize_repr, Serialize_repr, Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SessionMode {
    #[default]
    CompetitiveVariety = 0,
    KingOfTheCourt = 1
}

impl TryFrom<i32> for SessionMode {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(SessionMode::CompetitiveVariety),
            1 => Ok(SessionMode::KingOfTheCourt),
            _ => Err(())
        }
    }
}
