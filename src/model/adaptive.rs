use crate::model::{
    constants::{MAX_VARIETY_WEIGHT, MIN_VARIETY_WEIGHT},
    session::Session,
    structures::session_phase::SessionPhase
};

/// Effective matchmaking posture for the current moment of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveState {
    pub phase: SessionPhase,
    pub balance_weight: f64,
    /// Maximum tolerated team rating difference; None means unbounded.
    pub balance_threshold: Option<f64>,
    pub variety_weight: f64,
    /// Repetition gaps after the small-session collapse. Never below 1:
    /// back-to-back repeats stay forbidden in every phase.
    pub partner_gap: u32,
    pub opponent_gap: u32
}

impl AdaptiveState {
    pub fn assess(session: &Session) -> AdaptiveState {
        let config = &session.config.adaptive;
        let active_count = session.active_count();

        let total_games: u32 = session
            .active_ids()
            .iter()
            .filter_map(|id| session.stats.get(id).map(|s| s.games_played))
            .sum();
        let avg = total_games as f64 / active_count.max(1) as f64;

        let phase = if session.adaptive_disabled || avg < config.mid_avg_games {
            SessionPhase::Early
        } else if avg < config.late_avg_games {
            SessionPhase::Mid
        } else {
            SessionPhase::Late
        };

        let auto_weight = match phase {
            SessionPhase::Early => config.early_balance_weight,
            SessionPhase::Mid => config.mid_balance_weight,
            SessionPhase::Late => config.late_balance_weight
        };
        let balance_weight = if session.adaptive_disabled {
            1.0
        } else {
            session.manual_balance_weight.unwrap_or(auto_weight)
        };

        let balance_threshold = if session.adaptive_disabled {
            None
        } else {
            match phase {
                SessionPhase::Early => None,
                SessionPhase::Mid => Some(config.mid_balance_threshold),
                SessionPhase::Late => Some(config.late_balance_threshold)
            }
        };

        // 1.0 -> 3.0, 3.0 -> 2.0, 5.0 and above -> 1.0
        let variety_weight = (3.5 - 0.5 * balance_weight).clamp(MIN_VARIETY_WEIGHT, MAX_VARIETY_WEIGHT);

        let repetition = &session.config.repetition;
        let (partner_gap, opponent_gap) = if active_count < repetition.small_session_threshold {
            (1, 1)
        } else {
            (
                repetition.partner_gap_required.max(1),
                repetition.opponent_gap_required.max(1)
            )
        };

        AdaptiveState {
            phase,
            balance_weight,
            balance_threshold,
            variety_weight,
            partner_gap,
            opponent_gap
        }
    }

    pub fn gap_for(&self, role: crate::model::history::PairRole) -> u32 {
        match role {
            crate::model::history::PairRole::Partner => self.partner_gap,
            crate::model::history::PairRole::Opponent => self.opponent_gap
        }
    }

    /// The partner-opponent-partner pattern rule only bites once balance
    /// pressure is at the mid-session level.
    pub fn pop_rule_active(&self) -> bool {
        self.balance_weight >= 3.0
    }

    pub fn is_mid_or_late(&self) -> bool {
        self.phase >= SessionPhase::Mid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        player::{Player, PlayerStats},
        structures::{match_format::MatchFormat, mode::SessionMode}
    };
    use approx::assert_abs_diff_eq;
    use uuid::Uuid;

    fn session_with_games(per_player_games: &[u32]) -> Session {
        let mut session = Session::with_id(Uuid::from_u128(5), SessionMode::CompetitiveVariety, MatchFormat::Doubles, 2);
        for (i, games) in per_player_games.iter().enumerate() {
            let id = format!("p{i}");
            session.players.push(Player::new(&id, &id));
            session.stats.insert(
                id,
                PlayerStats {
                    games_played: *games,
                    ..Default::default()
                }
            );
        }
        session
    }

    #[test]
    fn early_phase_has_no_threshold() {
        let session = session_with_games(&[1, 2, 3, 2]);
        let state = AdaptiveState::assess(&session);

        assert_eq!(state.phase, SessionPhase::Early);
        assert_eq!(state.balance_threshold, None);
        assert_abs_diff_eq!(state.balance_weight, 1.0);
        assert_abs_diff_eq!(state.variety_weight, 3.0);
        assert!(!state.pop_rule_active());
    }

    #[test]
    fn mid_phase_at_four_average_games() {
        let session = session_with_games(&[4, 4, 4, 4]);
        let state = AdaptiveState::assess(&session);

        assert_eq!(state.phase, SessionPhase::Mid);
        assert_eq!(state.balance_threshold, Some(300.0));
        assert_abs_diff_eq!(state.balance_weight, 3.0);
        assert_abs_diff_eq!(state.variety_weight, 2.0);
        assert!(state.pop_rule_active());
    }

    #[test]
    fn late_phase_tightens_threshold() {
        let session = session_with_games(&[6, 7, 6, 8]);
        let state = AdaptiveState::assess(&session);

        assert_eq!(state.phase, SessionPhase::Late);
        assert_eq!(state.balance_threshold, Some(200.0));
        assert_abs_diff_eq!(state.balance_weight, 5.0);
        assert_abs_diff_eq!(state.variety_weight, 1.0);
    }

    #[test]
    fn disabled_adaptive_pins_early_behavior() {
        let mut session = session_with_games(&[8, 8, 8, 8]);
        session.adaptive_disabled = true;
        let state = AdaptiveState::assess(&session);

        assert_eq!(state.phase, SessionPhase::Early);
        assert_eq!(state.balance_threshold, None);
        assert_abs_diff_eq!(state.balance_weight, 1.0);
    }

    #[test]
    fn manual_weight_overrides_auto() {
        let mut session = session_with_games(&[4, 4, 4, 4]);
        session.manual_balance_weight = Some(5.0);
        let state = AdaptiveState::assess(&session);

        assert_abs_diff_eq!(state.balance_weight, 5.0);
        assert_abs_diff_eq!(state.variety_weight, 1.0);
        // the threshold still follows the phase, not the manual weight
        assert_eq!(state.balance_threshold, Some(300.0));
    }

    #[test]
    fn small_sessions_collapse_gaps_to_one() {
        let session = session_with_games(&[0, 0, 0, 0, 0, 0, 0]);
        let state = AdaptiveState::assess(&session);

        assert_eq!(state.partner_gap, 1);
        assert_eq!(state.opponent_gap, 1);

        let session = session_with_games(&[0; 8]);
        let state = AdaptiveState::assess(&session);
        assert_eq!(state.partner_gap, 3);
        assert_eq!(state.opponent_gap, 2);
    }
}
