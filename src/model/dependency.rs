use crate::model::{
    constants::{PLAUSIBLE_LOSING_SCORE, PLAUSIBLE_WINNING_SCORE},
    generator,
    matches::MatchScore,
    session::Session,
    structures::{match_outcome::MatchOutcome, match_status::MatchStatus}
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};
use strum::IntoEnumIterator;

/// For each waiting player: the courts whose result could seat them, and
/// under which outcomes. A player listed under both outcomes of a court
/// depends only on that court finishing; a single outcome means they need
/// that specific result.
pub type DependencyMap = IndexMap<String, IndexMap<u32, BTreeSet<MatchOutcome>>>;

/// Plays out every (in-progress court, outcome) pair against a deep copy
/// of the session using the real generator, and records which waiting
/// players end up seated. The real session is never touched.
pub fn analyze(session: &Session, now: DateTime<Utc>) -> DependencyMap {
    let waiting = session.waiting_ids();
    let mut result: DependencyMap = waiting.iter().map(|p| (p.clone(), IndexMap::new())).collect();

    let live: Vec<(u64, u32)> = session
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::InProgress)
        .map(|m| (m.id, m.court))
        .collect();

    for (match_id, court) in live {
        for outcome in MatchOutcome::iter() {
            let mut trial = session.clone();
            let score = match outcome {
                MatchOutcome::Team1Wins => MatchScore {
                    team1: PLAUSIBLE_WINNING_SCORE,
                    team2: PLAUSIBLE_LOSING_SCORE
                },
                MatchOutcome::Team2Wins => MatchScore {
                    team1: PLAUSIBLE_LOSING_SCORE,
                    team2: PLAUSIBLE_WINNING_SCORE
                }
            };
            trial.record_completion(match_id, score, now);
            let created = generator::run_for_mode(&mut trial, now);

            let seated: HashSet<String> = created
                .iter()
                .filter_map(|id| trial.find_match(*id))
                .flat_map(|m| m.players().cloned())
                .collect();

            for player_id in &waiting {
                if seated.contains(player_id) {
                    result
                        .entry(player_id.clone())
                        .or_default()
                        .entry(court)
                        .or_default()
                        .insert(outcome);
                }
            }
        }
    }

    result
}
