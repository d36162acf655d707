use crate::model::{
    adaptive::AdaptiveState,
    history::{HistoryIndex, PairRole},
    session::Session,
    structures::mode::SessionMode
};
use std::collections::{HashMap, HashSet};

/// Relaxation level for one gate evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateOptions {
    /// Ignore the roaming rank window.
    pub allow_cross_bracket: bool,
    /// Last-resort mode: repetition gaps floor at one for both roles,
    /// everything above that floor is relaxed. Bans and locks always hold.
    pub relaxed: bool
}

impl GateOptions {
    pub fn strict() -> GateOptions {
        GateOptions::default()
    }

    pub fn cross_bracket() -> GateOptions {
        GateOptions {
            allow_cross_bracket: true,
            relaxed: false
        }
    }

    pub fn ultra_lenient() -> GateOptions {
        GateOptions {
            allow_cross_bracket: true,
            relaxed: true
        }
    }
}

/// Immutable views needed to answer "can A play with/against B right now".
pub struct GateContext<'a> {
    pub session: &'a Session,
    pub history: &'a HistoryIndex,
    pub ranks: &'a HashMap<String, usize>,
    pub provisional: &'a HashSet<String>,
    pub adaptive: &'a AdaptiveState
}

impl GateContext<'_> {
    /// The single pairing predicate. Checks run in a fixed order and the
    /// first definitive answer wins.
    pub fn can_play_with(&self, a: &str, b: &str, role: PairRole, opts: GateOptions) -> bool {
        // Locked teams bypass everything else, and never face each other.
        if self.session.is_locked_pair(a, b) {
            return role == PairRole::Partner;
        }

        if role == PairRole::Partner && self.session.is_banned(a, b) {
            return false;
        }

        if !self.roaming_ok(a, b, opts) {
            return false;
        }

        // Last resort: repetition gaps floor at one for both roles. No
        // pair repeats the same relation straight out of the previous
        // recorded match, as partners or as opponents.
        if opts.relaxed {
            return !self.history.pair_in_recent(a, b, role, 1);
        }

        let required = self.adaptive.gap_for(role);

        // Global recency: the pair must not appear in the same relation
        // anywhere in the last `required` recorded matches.
        if self.history.pair_in_recent(a, b, role, required as usize) {
            return false;
        }

        // Per-player gap: both players must have personally played enough
        // games since the pair last met this way. Sitting out does not
        // advance a player toward re-pairing.
        if let Some(min_intervening) = self.history.min_intervening_since_last(a, b, role) {
            if min_intervening < required {
                return false;
            }
        }

        // Partner-opponent-partner: once balance pressure is on, two
        // players may only re-partner after facing each other if both
        // have played something in between.
        if role == PairRole::Partner && self.adaptive.pop_rule_active() {
            if let Some(min_intervening) = self.history.min_intervening_since_last(a, b, PairRole::Opponent) {
                if min_intervening == 0 {
                    return false;
                }
            }
        }

        true
    }

    fn roaming_ok(&self, a: &str, b: &str, opts: GateOptions) -> bool {
        let roaming = &self.session.config.roaming;
        let active_count = self.session.active_count();

        if opts.allow_cross_bracket
            || self.session.mode != SessionMode::CompetitiveVariety
            || active_count < roaming.active_from
            || self.provisional.contains(a)
            || self.provisional.contains(b)
        {
            return true;
        }

        let window = roaming.window_size(active_count);
        match (self.ranks.get(a), self.ranks.get(b)) {
            (Some(rank_a), Some(rank_b)) => rank_a.abs_diff(*rank_b) <= window,
            _ => true
        }
    }
}
