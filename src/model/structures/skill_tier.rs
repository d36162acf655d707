use crate::model::constants::{AVERAGE_TIER_OFFSET, ELITE_TIER_OFFSET, STRONG_TIER_OFFSET};
use serde_repr::{Deserialize_repr, Serialize_repr};
use strum_macros::Display;

/// Skill bands relative to the configured base rating. Ordering is
/// lowest-to-highest so tiers can be compared directly.
#[derive(
    Deserialize_repr, Serialize_repr, Display, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord
)]
#[repr(u8)]
pub enum SkillTier {
    Weak = 0,
    Average = 1,
    Strong = 2,
    Elite = 3
}

impl SkillTier {
    pub fn from_rating(rating: f64, base_rating: f64) -> SkillTier {
        if rating >= base_rating + ELITE_TIER_OFFSET {
            SkillTier::Elite
        } else if rating >= base_rating + STRONG_TIER_OFFSET {
            SkillTier::Strong
        } else if rating >= base_rating + AVERAGE_TIER_OFFSET {
            SkillTier::Average
        } else {
            SkillTier::Weak
        }
    }

    /// 0 for Weak up to 3 for Elite, used to interpolate tier-scaled bonuses.
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}
