use serde_repr::{Deserialize_repr, Serialize_repr};
use strum_macros::Display;

/// Urgency band for a waiting player, measured against the shortest
/// current waiter. Ordering is lowest-to-highest urgency.
#[derive(
    Deserialize_repr, Serialize_repr, Display, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default
)]
#[repr(u8)]
pub enum WaitTier {
    #[default]
    Normal = 0,
    Significant = 1,
    Extreme = 2
}
