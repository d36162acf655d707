use crate::model::{matches::Match, session::ordered_pair};
use std::collections::HashMap;

/// The two ways a pair of players can meet in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairRole {
    Partner,
    Opponent
}

/// Pair/partner lookup index rebuilt on demand from the ordered match
/// list. Terminal matches count: a forfeited match never awards points,
/// but the pairing still happened and feeds recency.
#[derive(Debug, Default)]
pub struct HistoryIndex {
    /// Indices into the session match list of the recorded (terminal)
    /// matches, in order. Positions in this list are the "global" indices
    /// the recency rules speak about.
    recorded: Vec<RecordedMatch>,
    partner_counts: HashMap<(String, String), u32>,
    opponent_counts: HashMap<(String, String), u32>,
    last_partner: HashMap<(String, String), usize>,
    last_opponent: HashMap<(String, String), usize>,
    /// Per player, the ascending recorded positions they took part in.
    personal: HashMap<String, Vec<usize>>
}

#[derive(Debug, Clone)]
struct RecordedMatch {
    team1: Vec<String>,
    team2: Vec<String>
}

impl HistoryIndex {
    pub fn build(matches: &[Match]) -> HistoryIndex {
        let mut index = HistoryIndex::default();

        for m in matches.iter().filter(|m| m.is_terminal()) {
            let pos = index.recorded.len();
            index.recorded.push(RecordedMatch {
                team1: m.team1.clone(),
                team2: m.team2.clone()
            });

            for player_id in m.players() {
                index.personal.entry(player_id.clone()).or_default().push(pos);
            }

            for team in [&m.team1, &m.team2] {
                for i in 0..team.len() {
                    for j in (i + 1)..team.len() {
                        let key = ordered_pair(&team[i], &team[j]);
                        *index.partner_counts.entry(key.clone()).or_insert(0) += 1;
                        index.last_partner.insert(key, pos);
                    }
                }
            }
            for p1 in &m.team1 {
                for p2 in &m.team2 {
                    let key = ordered_pair(p1, p2);
                    *index.opponent_counts.entry(key.clone()).or_insert(0) += 1;
                    index.last_opponent.insert(key, pos);
                }
            }
        }

        index
    }

    pub fn recorded_len(&self) -> usize {
        self.recorded.len()
    }

    pub fn partner_count(&self, a: &str, b: &str) -> u32 {
        self.partner_counts.get(&ordered_pair(a, b)).copied().unwrap_or(0)
    }

    pub fn opponent_count(&self, a: &str, b: &str) -> u32 {
        self.opponent_counts.get(&ordered_pair(a, b)).copied().unwrap_or(0)
    }

    /// Recorded position of the most recent match with the pair in the
    /// given relation, or None when it never happened.
    pub fn last_index(&self, a: &str, b: &str, role: PairRole) -> Option<usize> {
        let map = match role {
            PairRole::Partner => &self.last_partner,
            PairRole::Opponent => &self.last_opponent
        };
        map.get(&ordered_pair(a, b)).copied()
    }

    pub fn personal_history(&self, player_id: &str) -> &[usize] {
        self.personal.get(player_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// How many games the player has played since the match at the given
    /// recorded position: `personal_count - personal_index - 1`. None when
    /// the player did not take part in that match.
    pub fn intervening_games(&self, player_id: &str, recorded_pos: usize) -> Option<u32> {
        let history = self.personal_history(player_id);
        let personal_index = history.binary_search(&recorded_pos).ok()?;
        Some((history.len() - personal_index - 1) as u32)
    }

    /// True when any of the last `window` recorded matches contains the
    /// pair in the given relation.
    pub fn pair_in_recent(&self, a: &str, b: &str, role: PairRole, window: usize) -> bool {
        match self.last_index(a, b, role) {
            Some(pos) => pos + window >= self.recorded.len(),
            None => false
        }
    }

    /// The smaller of the two players' intervening-game counts since they
    /// last met in the given relation. None when they never met that way.
    pub fn min_intervening_since_last(&self, a: &str, b: &str, role: PairRole) -> Option<u32> {
        let pos = self.last_index(a, b, role)?;
        let i_a = self.intervening_games(a, pos)?;
        let i_b = self.intervening_games(b, pos)?;
        Some(i_a.min(i_b))
    }
}
