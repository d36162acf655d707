use crate::model::{
    clock::{SessionClock, SystemClock},
    config::ConfigPatch,
    dependency::{self, DependencyMap},
    error::SessionError,
    generator,
    matches::MatchScore,
    player::Player,
    rating,
    session::Session,
    structures::{match_status::MatchStatus, mode::SessionMode}
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::info;

/// Read-only digest of one player for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSummary {
    pub player_id: String,
    pub display_name: String,
    pub rating: f64,
    pub provisional: bool,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub avg_point_diff: f64,
    pub games_waited: u32,
    pub effective_wait_secs: i64
}

/// The single mutator of a session. Every public operation validates its
/// input, applies its effects in a fixed order (status transition, stats,
/// wait timers, generator) and re-audits the invariants before returning.
pub struct SessionManager<C: SessionClock = SystemClock> {
    session: Session,
    clock: C
}

impl SessionManager<SystemClock> {
    pub fn new(session: Session) -> SessionManager<SystemClock> {
        SessionManager::with_clock(session, SystemClock)
    }
}

impl<C: SessionClock> SessionManager<C> {
    pub fn with_clock(session: Session, clock: C) -> SessionManager<C> {
        SessionManager { session, clock }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Validates and applies a final score, then lets the mode's generator
    /// refill courts. Returns the ids of any matches created.
    pub fn complete_match(
        &mut self,
        match_id: u64,
        team1_score: i32,
        team2_score: i32
    ) -> Result<Vec<u64>, SessionError> {
        let m = self
            .session
            .find_match(match_id)
            .ok_or(SessionError::UnknownMatch(match_id))?;
        if m.status != MatchStatus::InProgress {
            return Err(SessionError::MatchNotInProgress {
                match_id,
                status: m.status
            });
        }
        if team1_score < 0 || team2_score < 0 || team1_score == team2_score {
            return Err(SessionError::InvalidScore {
                team1: team1_score,
                team2: team2_score
            });
        }

        let now = self.clock.now();
        let participants: Vec<String> = m.players().cloned().collect();
        let waiting_before = self.session.waiting_ids();

        self.session.record_completion(
            match_id,
            MatchScore {
                team1: team1_score,
                team2: team2_score
            },
            now
        );
        info!(match_id, team1_score, team2_score, "match completed");

        let created = generator::run_for_mode(&mut self.session, now);
        self.settle(&participants, &waiting_before, &created, now)?;
        Ok(created)
    }

    /// Marks a match forfeited: no score, no win/loss changes, but the
    /// pairing counts toward repetition tracking.
    pub fn forfeit_match(&mut self, match_id: u64) -> Result<Vec<u64>, SessionError> {
        let m = self
            .session
            .find_match(match_id)
            .ok_or(SessionError::UnknownMatch(match_id))?;
        if m.status != MatchStatus::InProgress {
            return Err(SessionError::MatchNotInProgress {
                match_id,
                status: m.status
            });
        }

        let now = self.clock.now();
        let participants: Vec<String> = m.players().cloned().collect();
        let waiting_before = self.session.waiting_ids();

        self.session.record_forfeit(match_id, now);
        info!(match_id, "match forfeited");

        let created = generator::run_for_mode(&mut self.session, now);
        self.settle(&participants, &waiting_before, &created, now)?;
        Ok(created)
    }

    /// Adds a player (or reactivates a previously removed one) and gives
    /// the generator a chance to seat them.
    pub fn add_player(&mut self, player: Player) -> Result<Vec<u64>, SessionError> {
        if self.session.player(&player.id).is_some_and(|p| p.active) {
            return Err(SessionError::DuplicatePlayer(player.id));
        }

        let now = self.clock.now();
        let waiting_before = self.session.waiting_ids();
        let player_id = player.id.clone();

        match self.session.player_mut(&player_id) {
            Some(existing) => {
                existing.active = true;
                existing.display_name = player.display_name;
                existing.seed_rating = player.seed_rating.or(existing.seed_rating);
            }
            None => {
                self.session.players.push(player);
                self.session.stats.entry(player_id.clone()).or_default();
            }
        }
        if let Some(stats) = self.session.stats.get_mut(&player_id) {
            stats.start_waiting(now);
        }
        if self.session.mode == SessionMode::KingOfTheCourt && self.session.kotc.round_number > 0 {
            // joining mid-round means joining the waitlist
            *self.session.kotc.wait_counts.entry(player_id.clone()).or_insert(0) += 1;
        }
        info!(player_id = %player_id, "player added");

        let created = generator::run_for_mode(&mut self.session, now);
        self.settle(&[], &waiting_before, &created, now)?;
        Ok(created)
    }

    /// Marks a player inactive, forfeiting any live match they are in,
    /// then regenerates.
    pub fn remove_player(&mut self, player_id: &str) -> Result<Vec<u64>, SessionError> {
        let player = self
            .session
            .player(player_id)
            .ok_or_else(|| SessionError::UnknownPlayer(player_id.to_string()))?;
        if !player.active {
            return Err(SessionError::UnknownPlayer(player_id.to_string()));
        }

        let now = self.clock.now();
        let mut waiting_before = self.session.waiting_ids();
        waiting_before.retain(|p| p != player_id);

        let live_match = self
            .session
            .non_terminal_matches()
            .find(|m| m.contains(player_id))
            .map(|m| (m.id, m.players().cloned().collect::<Vec<String>>()));

        let mut participants: Vec<String> = Vec::new();
        if let Some((match_id, players)) = live_match {
            self.session.record_forfeit(match_id, now);
            info!(match_id, player_id, "match forfeited by player removal");
            participants = players.into_iter().filter(|p| p != player_id).collect();
        }

        if let Some(p) = self.session.player_mut(player_id) {
            p.active = false;
        }
        if let Some(stats) = self.session.stats.get_mut(player_id) {
            stats.stop_waiting(now);
        }
        self.session.kotc.player_positions.shift_remove(player_id);
        info!(player_id, "player removed");

        let created = generator::run_for_mode(&mut self.session, now);
        self.settle(&participants, &waiting_before, &created, now)?;
        Ok(created)
    }

    /// Pure re-run of the generator. Creates nothing and mutates nothing
    /// when the session has not changed since the last call.
    pub fn evaluate(&mut self) -> Result<Vec<u64>, SessionError> {
        let now = self.clock.now();
        let waiting_before = self.session.waiting_ids();
        let created = generator::run_for_mode(&mut self.session, now);
        self.settle(&[], &waiting_before, &created, now)?;
        Ok(created)
    }

    /// Applies a partial config update. Future generator calls see the new
    /// values; nothing is recomputed retroactively.
    pub fn change_config(&mut self, patch: ConfigPatch) {
        let (adaptive_disabled, manual_balance_weight) = patch.apply(&mut self.session.config);
        if let Some(disabled) = adaptive_disabled {
            self.session.adaptive_disabled = disabled;
        }
        if let Some(weight) = manual_balance_weight {
            self.session.manual_balance_weight = weight;
        }
    }

    /// Predicted waitlist placements per (court, outcome); never mutates
    /// the real session.
    pub fn outcome_dependencies(&self) -> DependencyMap {
        dependency::analyze(&self.session, self.clock.now())
    }

    pub fn player_summary(&self, player_id: &str) -> Option<PlayerSummary> {
        let player = self.session.player(player_id)?;
        let stats = self.session.stats.get(player_id)?;
        let (rating, provisional) = rating::rating_for(stats, player.seed_rating, &self.session.config.rating);
        Some(PlayerSummary {
            player_id: player.id.clone(),
            display_name: player.display_name.clone(),
            rating,
            provisional,
            games_played: stats.games_played,
            wins: stats.wins,
            losses: stats.losses,
            win_rate: stats.win_rate(),
            avg_point_diff: stats.avg_point_diff(),
            games_waited: stats.games_waited,
            effective_wait_secs: stats.effective_wait_secs(self.clock.now())
        })
    }

    /// Post-generation bookkeeping shared by every mutating operation:
    /// players coming off a finished match start waiting unless reseated,
    /// and the legacy waited-games counter ticks for players passed over
    /// by a generator that did seat someone.
    fn settle(
        &mut self,
        finished_participants: &[String],
        waiting_before: &[String],
        created: &[u64],
        now: DateTime<Utc>
    ) -> Result<(), SessionError> {
        let playing = self.session.playing_ids();
        for player_id in finished_participants {
            let active = self.session.player(player_id).is_some_and(|p| p.active);
            if active && !playing.contains(player_id) {
                if let Some(stats) = self.session.stats.get_mut(player_id) {
                    stats.start_waiting(now);
                }
            }
        }

        if !created.is_empty() {
            let waiting_now: HashSet<String> = self.session.waiting_ids().into_iter().collect();
            for player_id in waiting_before {
                if waiting_now.contains(player_id) {
                    if let Some(stats) = self.session.stats.get_mut(player_id) {
                        stats.games_waited += 1;
                    }
                }
            }
        }

        self.session.audit()
    }
}
