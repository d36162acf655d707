use serde_repr::{Deserialize_repr, Serialize_repr};
use strum_macros::{Display, EnumIter};

/// One of the two ways an in-progress match can resolve.
#[derive(
    Deserialize_repr,
    Serialize_repr,
    Display,
    EnumIter,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord
)]
#[repr(u8)]
pub enum MatchOutcome {
    Team1Wins = 0,
    Team2Wins = 1
}
