use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::Display;

/// How the first King-of-the-Court round distributes players across the
/// court hierarchy.
#[derive(Deserialize_repr, Serialize_repr, Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SeedingOption {
    #[default]
    Random = 0,
    HighToLow = 1,
    LowToHigh = 2
}

impl TryFrom<i32> for SeedingOption {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(SeedingOption::Random),
            1 => Ok(SeedingOption::HighToLow),
            2 => Ok(SeedingOption::LowToHigh),
            _ => Err(())
        }
    }
}
