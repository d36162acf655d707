use crate::model::{
    constants::{WAIT_BONUS_EXTREME, WAIT_BONUS_NORMAL, WAIT_BONUS_SIGNIFICANT},
    session::Session,
    structures::wait_tier::WaitTier
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct WaitInfo {
    pub player_id: String,
    pub effective_secs: i64,
    pub tier: WaitTier,
    pub games_waited: u32
}

/// Wait priorities of the currently available (active, unseated) players,
/// measured from the shortest waiter.
#[derive(Debug, Default)]
pub struct WaitAssessment {
    infos: IndexMap<String, WaitInfo>,
    /// False when every effective wait sits within the minimum gap and no
    /// elevated tier exists; all players are then equal priority.
    pub differences_matter: bool
}

impl WaitAssessment {
    pub fn assess(session: &Session, now: DateTime<Utc>) -> WaitAssessment {
        let wait_config = &session.config.wait;
        let waiting = session.waiting_ids();

        let shortest = waiting
            .iter()
            .filter_map(|id| session.stats.get(id).map(|s| s.effective_wait_secs(now)))
            .min()
            .unwrap_or(0);
        let longest = waiting
            .iter()
            .filter_map(|id| session.stats.get(id).map(|s| s.effective_wait_secs(now)))
            .max()
            .unwrap_or(0);

        let mut infos = IndexMap::new();
        let mut any_elevated = false;
        for player_id in waiting {
            let Some(stats) = session.stats.get(&player_id) else {
                continue;
            };
            let effective_secs = stats.effective_wait_secs(now);
            let gap = effective_secs - shortest;
            let tier = if gap >= wait_config.extreme_gap_secs {
                WaitTier::Extreme
            } else if gap >= wait_config.significant_gap_secs {
                WaitTier::Significant
            } else {
                WaitTier::Normal
            };
            any_elevated |= tier > WaitTier::Normal;
            infos.insert(
                player_id.clone(),
                WaitInfo {
                    player_id,
                    effective_secs,
                    tier,
                    games_waited: stats.games_waited
                }
            );
        }

        let differences_matter = any_elevated || (longest - shortest) >= wait_config.min_gap_secs;
        if !differences_matter {
            for info in infos.values_mut() {
                info.tier = WaitTier::Normal;
            }
        }

        WaitAssessment {
            infos,
            differences_matter
        }
    }

    pub fn info(&self, player_id: &str) -> Option<&WaitInfo> {
        self.infos.get(player_id)
    }

    pub fn tier(&self, player_id: &str) -> WaitTier {
        self.infos.get(player_id).map(|i| i.tier).unwrap_or_default()
    }

    pub fn wait_bonus(&self, player_id: &str) -> f64 {
        match self.tier(player_id) {
            WaitTier::Normal => WAIT_BONUS_NORMAL,
            WaitTier::Significant => WAIT_BONUS_SIGNIFICANT,
            WaitTier::Extreme => WAIT_BONUS_EXTREME
        }
    }

    /// Candidate pool for the generator: highest urgency first, capped per
    /// the candidate config. Before anything has completed, the pool is
    /// instead every available player in one seeded shuffle.
    pub fn candidate_pool(&self, session: &Session, rng: &mut ChaCha8Rng) -> Vec<String> {
        let mut pool: Vec<&WaitInfo> = self.infos.values().collect();

        if !session.has_completed_match() {
            let mut everyone: Vec<String> = pool.iter().map(|i| i.player_id.clone()).collect();
            everyone.shuffle(rng);
            return everyone;
        }

        pool.sort_by(|a, b| {
            b.tier
                .cmp(&a.tier)
                .then(b.effective_secs.cmp(&a.effective_secs))
                .then(b.games_waited.cmp(&a.games_waited))
                .then(a.player_id.cmp(&b.player_id))
        });

        let mut ids: Vec<String> = pool.into_iter().map(|i| i.player_id.clone()).collect();
        if let Some(cap) = session.config.candidate.pool_size(session.active_count(), ids.len()) {
            ids.truncate(cap);
        }
        ids
    }
}
