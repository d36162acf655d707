use crate::model::{
    config::SessionConfig,
    error::SessionError,
    kotc::KotcState,
    matches::{Match, MatchScore},
    player::{Player, PlayerStats},
    structures::{match_format::MatchFormat, match_status::MatchStatus, mode::SessionMode}
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Returns the pair in canonical (sorted) order so unordered pair sets
/// can be stored and compared as tuples.
pub fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// The whole state of one session. Exclusively mutated through the
/// `SessionManager`; every other component receives immutable views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub mode: SessionMode,
    pub format: MatchFormat,
    pub num_courts: u32,
    pub players: Vec<Player>,
    pub stats: IndexMap<String, PlayerStats>,
    /// Append-only within the session.
    pub matches: Vec<Match>,
    pub config: SessionConfig,
    #[serde(default)]
    pub adaptive_disabled: bool,
    #[serde(default)]
    pub manual_balance_weight: Option<f64>,
    #[serde(default)]
    pub kotc: KotcState,
    /// Unordered pairs that must never be partnered.
    #[serde(default)]
    pub banned_pairs: Vec<(String, String)>,
    /// Unordered pairs that always play as a team (doubles only).
    #[serde(default)]
    pub locked_teams: Vec<(String, String)>,
    /// Seed for every derived RNG stream, stable for the session's life.
    pub rng_seed: u64
}

impl Session {
    pub fn new(mode: SessionMode, format: MatchFormat, num_courts: u32) -> Session {
        Session::with_id(Uuid::new_v4(), mode, format, num_courts)
    }

    /// Deterministic construction for tests and snapshot restore.
    pub fn with_id(id: Uuid, mode: SessionMode, format: MatchFormat, num_courts: u32) -> Session {
        let (hi, lo) = id.as_u64_pair();
        Session {
            id,
            mode,
            format,
            num_courts,
            players: Vec::new(),
            stats: IndexMap::new(),
            matches: Vec::new(),
            config: SessionConfig::default(),
            adaptive_disabled: false,
            manual_balance_weight: None,
            kotc: KotcState::default(),
            banned_pairs: Vec::new(),
            locked_teams: Vec::new(),
            rng_seed: hi ^ lo
        }
    }

    // Player views

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Active player ids in stable (stats insertion) order.
    pub fn active_ids(&self) -> Vec<String> {
        self.stats
            .keys()
            .filter(|id| self.player(id).is_some_and(|p| p.active))
            .cloned()
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.active && self.stats.contains_key(&p.id)).count()
    }

    /// Players currently seated in a non-terminal match.
    pub fn playing_ids(&self) -> HashSet<String> {
        self.non_terminal_matches()
            .flat_map(|m| m.players().cloned())
            .collect()
    }

    /// Active players not seated anywhere, in stable order.
    pub fn waiting_ids(&self) -> Vec<String> {
        let playing = self.playing_ids();
        self.active_ids().into_iter().filter(|id| !playing.contains(id)).collect()
    }

    // Match views

    pub fn find_match(&self, match_id: u64) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    pub fn find_match_mut(&mut self, match_id: u64) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == match_id)
    }

    pub fn non_terminal_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| !m.is_terminal())
    }

    pub fn match_on_court(&self, court: u32) -> Option<&Match> {
        self.non_terminal_matches().find(|m| m.court == court)
    }

    /// Court numbers with no non-terminal match, ascending.
    pub fn empty_courts(&self) -> Vec<u32> {
        (1..=self.num_courts)
            .filter(|court| self.match_on_court(*court).is_none())
            .collect()
    }

    pub fn next_match_id(&self) -> u64 {
        self.matches.last().map(|m| m.id).unwrap_or(0) + 1
    }

    pub fn has_completed_match(&self) -> bool {
        self.matches.iter().any(|m| m.status == MatchStatus::Completed)
    }

    /// KotC court hierarchy, Kings court first. Falls back to 1..=N when
    /// the configured ordering does not cover the session's courts.
    pub fn court_ordering(&self) -> Vec<u32> {
        let configured = &self.config.king_of_court.court_ordering;
        let valid = configured.len() == self.num_courts as usize
            && (1..=self.num_courts).all(|c| configured.contains(&c));
        if valid {
            configured.clone()
        } else {
            (1..=self.num_courts).collect()
        }
    }

    // Bans and locked teams

    pub fn ban_pair(&mut self, a: &str, b: &str) {
        let pair = ordered_pair(a, b);
        if !self.banned_pairs.contains(&pair) {
            self.banned_pairs.push(pair);
        }
    }

    pub fn lock_team(&mut self, a: &str, b: &str) {
        let pair = ordered_pair(a, b);
        if !self.locked_teams.contains(&pair) {
            self.locked_teams.push(pair);
        }
    }

    pub fn is_banned(&self, a: &str, b: &str) -> bool {
        self.banned_pairs.contains(&ordered_pair(a, b))
    }

    pub fn is_locked_pair(&self, a: &str, b: &str) -> bool {
        self.locked_teams.contains(&ordered_pair(a, b))
    }

    pub fn locked_partner(&self, player_id: &str) -> Option<&str> {
        self.locked_teams.iter().find_map(|(a, b)| {
            if a == player_id {
                Some(b.as_str())
            } else if b == player_id {
                Some(a.as_str())
            } else {
                None
            }
        })
    }

    // Randomness

    /// Derives an RNG stream from the session seed and a salt. Equal
    /// session state and salt always produce the same stream.
    pub fn rng_for(&self, salt: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.rng_seed ^ splitmix64(salt))
    }

    /// The generator stream is keyed by how many matches exist, so a
    /// re-evaluation of unchanged state replays identically.
    pub fn generator_rng(&self) -> ChaCha8Rng {
        self.rng_for(self.matches.len() as u64)
    }

    // Mutation primitives. Validation happens in the orchestrator; these
    // keep stats consistent with the match list.

    /// Marks a match completed and applies win/loss/point/pairing updates
    /// to every participant's stats.
    pub fn record_completion(&mut self, match_id: u64, score: MatchScore, _now: DateTime<Utc>) {
        let Some(index) = self.matches.iter().position(|m| m.id == match_id) else {
            return;
        };
        self.matches[index].status = MatchStatus::Completed;
        self.matches[index].score = Some(score);

        let m = self.matches[index].clone();
        let winners: HashSet<String> = m.winning_team().map(|t| t.iter().cloned().collect()).unwrap_or_default();

        for player_id in m.players() {
            let (points_for, points_against) = if m.team1.iter().any(|p| p == player_id) {
                (score.team1, score.team2)
            } else {
                (score.team2, score.team1)
            };
            if let Some(stats) = self.stats.get_mut(player_id) {
                stats.games_played += 1;
                if winners.contains(player_id) {
                    stats.wins += 1;
                } else {
                    stats.losses += 1;
                }
                stats.points_for += points_for as i64;
                stats.points_against += points_against as i64;
                stats.partners.extend(m.partners_of(player_id));
                stats.opponents.extend(m.opponents_of(player_id));
            }
        }
    }

    /// Marks a match forfeited. Wins, losses and points are untouched,
    /// but the pairing still counts toward partner/opponent recency.
    pub fn record_forfeit(&mut self, match_id: u64, _now: DateTime<Utc>) {
        let Some(index) = self.matches.iter().position(|m| m.id == match_id) else {
            return;
        };
        self.matches[index].status = MatchStatus::Forfeited;

        let m = self.matches[index].clone();
        for player_id in m.players() {
            if let Some(stats) = self.stats.get_mut(player_id) {
                stats.partners.extend(m.partners_of(player_id));
                stats.opponents.extend(m.opponents_of(player_id));
            }
        }
    }

    /// Runs the invariant checklist. A failure indicates a bug in the
    /// engine and is fatal to the session.
    pub fn audit(&self) -> Result<(), SessionError> {
        let violation = |details: String| Err(SessionError::InvariantViolation { details });

        let mut seated: HashSet<&str> = HashSet::new();
        let mut courts: HashSet<u32> = HashSet::new();
        for m in self.non_terminal_matches() {
            if m.court < 1 || m.court > self.num_courts {
                return violation(format!("match {} sits on court {} of {}", m.id, m.court, self.num_courts));
            }
            if !courts.insert(m.court) {
                return violation(format!("court {} hosts more than one live match", m.court));
            }
            let per_team = self.format.players_per_team();
            if m.team1.len() != per_team || m.team2.len() != per_team {
                return violation(format!(
                    "match {} rosters {}v{} in a {} session",
                    m.id,
                    m.team1.len(),
                    m.team2.len(),
                    self.format
                ));
            }
            for player_id in m.players() {
                if !seated.insert(player_id) {
                    return violation(format!("player {player_id} is in more than one live match"));
                }
                let active = self.player(player_id).is_some_and(|p| p.active);
                if !active {
                    return violation(format!("inactive player {player_id} is seated in match {}", m.id));
                }
            }
        }

        for m in &self.matches {
            if m.status == MatchStatus::Completed {
                match m.score {
                    Some(score) if score.team1 != score.team2 && score.team1 >= 0 && score.team2 >= 0 => {}
                    _ => return violation(format!("completed match {} has score {:?}", m.id, m.score))
                }
            }
        }

        for player in self.players.iter().filter(|p| p.active) {
            if !self.stats.contains_key(&player.id) {
                return violation(format!("active player {} has no stats entry", player.id));
            }
        }

        if self.mode == SessionMode::KingOfTheCourt && self.kotc.round_number > 0 {
            // positions persist through completion until the round turns
            // over, so the reference set is the round's rosters
            let round_players: HashSet<&String> = self
                .kotc
                .round_match_ids
                .iter()
                .filter_map(|id| self.find_match(*id))
                .flat_map(|m| m.players())
                .collect();
            let on_court: HashSet<&String> = self.kotc.player_positions.keys().collect();
            for player_id in self.active_ids() {
                let in_round = round_players.contains(&player_id);
                if in_round != on_court.contains(&player_id) {
                    return violation(format!(
                        "kotc position map out of sync for {player_id} (in round={in_round})"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::matches::Match;

    fn session() -> Session {
        let mut session = Session::with_id(
            Uuid::from_u128(7),
            SessionMode::CompetitiveVariety,
            MatchFormat::Doubles,
            2
        );
        for id in ["a", "b", "c", "d", "e"] {
            session.players.push(Player::new(id, id.to_uppercase()));
            session.stats.insert(id.to_string(), PlayerStats::default());
        }
        session
    }

    fn seat(session: &mut Session, court: u32, team1: [&str; 2], team2: [&str; 2]) -> u64 {
        let id = session.next_match_id();
        let mut m = Match::new(
            id,
            court,
            team1.iter().map(|s| s.to_string()).collect(),
            team2.iter().map(|s| s.to_string()).collect(),
            "2026-03-01T18:00:00Z".parse().unwrap()
        );
        m.status = MatchStatus::InProgress;
        session.matches.push(m);
        id
    }

    #[test]
    fn waiting_excludes_seated_players() {
        let mut session = session();
        seat(&mut session, 1, ["a", "b"], ["c", "d"]);

        assert_eq!(session.waiting_ids(), vec!["e".to_string()]);
        assert_eq!(session.empty_courts(), vec![2]);
    }

    #[test]
    fn completion_updates_stats_both_ways() {
        let mut session = session();
        let id = seat(&mut session, 1, ["a", "b"], ["c", "d"]);
        session.record_completion(id, MatchScore { team1: 11, team2: 7 }, "2026-03-01T18:20:00Z".parse().unwrap());

        let a = &session.stats["a"];
        assert_eq!((a.wins, a.losses, a.games_played), (1, 0, 1));
        assert_eq!((a.points_for, a.points_against), (11, 7));
        assert_eq!(a.partners, vec!["b".to_string()]);
        assert_eq!(a.opponents, vec!["c".to_string(), "d".to_string()]);

        let d = &session.stats["d"];
        assert_eq!((d.wins, d.losses), (0, 1));
        assert_eq!((d.points_for, d.points_against), (7, 11));
    }

    #[test]
    fn forfeit_counts_pairings_but_not_results() {
        let mut session = session();
        let id = seat(&mut session, 1, ["a", "b"], ["c", "d"]);
        session.record_forfeit(id, "2026-03-01T18:20:00Z".parse().unwrap());

        let a = &session.stats["a"];
        assert_eq!((a.wins, a.losses, a.games_played), (0, 0, 0));
        assert_eq!(a.partners, vec!["b".to_string()]);
        assert_eq!(a.opponents, vec!["c".to_string(), "d".to_string()]);
    }

    #[test]
    fn audit_rejects_double_seating() {
        let mut session = session();
        seat(&mut session, 1, ["a", "b"], ["c", "d"]);
        seat(&mut session, 2, ["a", "e"], ["b", "c"]);

        assert!(matches!(
            session.audit(),
            Err(SessionError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn audit_rejects_duplicate_court() {
        let mut session = session();
        seat(&mut session, 1, ["a", "b"], ["c", "d"]);
        let id = session.next_match_id();
        let mut m = Match::new(id, 1, vec!["e".into(), "a".into()], vec!["b".into(), "c".into()], "2026-03-01T18:00:00Z".parse().unwrap());
        m.status = MatchStatus::InProgress;
        session.matches.push(m);

        assert!(session.audit().is_err());
    }

    #[test]
    fn rng_streams_are_reproducible() {
        let session = session();
        use rand::Rng;

        let a: u64 = session.generator_rng().random();
        let b: u64 = session.generator_rng().random();
        assert_eq!(a, b);

        let c: u64 = session.rng_for(1).random();
        assert_ne!(a, c);
    }

    #[test]
    fn court_ordering_falls_back_when_invalid() {
        let mut session = session();
        session.config.king_of_court.court_ordering = vec![9, 1];
        assert_eq!(session.court_ordering(), vec![1, 2]);

        session.config.king_of_court.court_ordering = vec![2, 1];
        assert_eq!(session.court_ordering(), vec![2, 1]);
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}
