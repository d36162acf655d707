use crate::model::{
    matches::Match,
    rating,
    session::{ordered_pair, Session},
    structures::{match_format::MatchFormat, match_status::MatchStatus, seeding_option::SeedingOption}
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rand::{seq::SliceRandom, Rng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// King-of-the-Court round state carried on the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KotcState {
    /// 0 until the first round has been seeded.
    pub round_number: u32,
    /// Court of every player currently seated. Waiters have no entry at
    /// all, so stale court numbers can never leak to observers.
    pub player_positions: IndexMap<String, u32>,
    /// Times each player has been sent to the waitlist.
    pub wait_counts: IndexMap<String, u32>,
    /// Hierarchy actually in use, Kings court first. Fixed at seeding and
    /// re-truncated when the roster shrinks.
    pub active_ordering: Vec<u32>,
    /// Matches created for the round in progress.
    pub round_match_ids: Vec<u64>
}

/// Entry point for every KotC evaluation: seeds the first round, or
/// advances to the next one once every court has finished. Anything else
/// is a no-op.
pub fn try_advance(session: &mut Session, now: DateTime<Utc>) -> Vec<u64> {
    if session.kotc.round_number == 0 {
        initialize(session, now)
    } else if session.non_terminal_matches().next().is_none() {
        advance_round(session, now)
    } else {
        Vec::new()
    }
}

fn initialize(session: &mut Session, now: DateTime<Utc>) -> Vec<u64> {
    let per_match = session.format.players_per_match();
    let active = session.active_ids();
    let ordering = session.court_ordering();

    let usable_courts = (active.len() / per_match).min(ordering.len());
    if usable_courts == 0 {
        debug!(active = active.len(), "not enough players to seed a round");
        return Vec::new();
    }
    let active_ordering: Vec<u32> = ordering[..usable_courts].to_vec();
    let capacity = usable_courts * per_match;

    let mut rng = session.generator_rng();

    // Excess players start on the waitlist, honoring first byes before
    // drawing the rest at random.
    let mut waiters: Vec<String> = Vec::new();
    let excess = active.len() - capacity;
    for bye in &session.config.king_of_court.first_byes {
        if waiters.len() == excess {
            break;
        }
        if active.contains(bye) && !waiters.contains(bye) {
            waiters.push(bye.clone());
        }
    }
    let mut remaining: Vec<String> = active.iter().filter(|p| !waiters.contains(p)).cloned().collect();
    while waiters.len() < excess {
        let pick = rng.random_range(0..remaining.len());
        waiters.push(remaining.remove(pick));
    }

    let mut seated = remaining;
    match session.config.king_of_court.seeding_option {
        SeedingOption::Random => seated.shuffle(&mut rng),
        SeedingOption::HighToLow | SeedingOption::LowToHigh => {
            let ranks = rating::ranks(session);
            seated.sort_by_key(|p| ranks.get(p).copied().unwrap_or(usize::MAX));
            if session.config.king_of_court.seeding_option == SeedingOption::LowToHigh {
                seated.reverse();
            }
        }
    }

    let mut created = Vec::new();
    let mut positions = IndexMap::new();
    for (court_index, court) in active_ordering.iter().enumerate() {
        let group: Vec<String> = seated[court_index * per_match..(court_index + 1) * per_match].to_vec();
        let (team1, team2) = form_teams(session, &group, &HashSet::new(), &mut rng);
        for player_id in &group {
            positions.insert(player_id.clone(), *court);
        }
        created.push(push_match(session, *court, team1, team2, now));
    }

    for player_id in seated.iter() {
        if let Some(stats) = session.stats.get_mut(player_id) {
            stats.stop_waiting(now);
        }
    }
    for player_id in &waiters {
        *session.kotc.wait_counts.entry(player_id.clone()).or_insert(0) += 1;
        if let Some(stats) = session.stats.get_mut(player_id) {
            stats.start_waiting(now);
        }
    }

    session.kotc.player_positions = positions;
    session.kotc.active_ordering = active_ordering;
    session.kotc.round_number = 1;
    session.kotc.round_match_ids = created.clone();
    info!(round = 1, courts = usable_courts, waiters = waiters.len(), "seeded first round");
    created
}

fn advance_round(session: &mut Session, now: DateTime<Utc>) -> Vec<u64> {
    let per_match = session.format.players_per_match();
    let active: Vec<String> = session.active_ids();
    let active_set: HashSet<&String> = active.iter().collect();
    // re-derived every round so the court set can grow or shrink with the
    // roster; the Kings-first prefix stays stable either way
    let ordering = session.court_ordering();

    let round_matches: Vec<Match> = session
        .kotc
        .round_match_ids
        .iter()
        .filter_map(|id| session.find_match(*id).cloned())
        .collect();
    if round_matches.is_empty() {
        return Vec::new();
    }

    // The roster may have shrunk; keep as many courts as it can fill.
    let usable_courts = (active.len() / per_match).min(ordering.len());
    if usable_courts == 0 {
        session.kotc.player_positions.clear();
        return Vec::new();
    }
    let active_ordering: Vec<u32> = ordering[..usable_courts].to_vec();
    let capacity = usable_courts * per_match;
    let bottom = usable_courts - 1;

    let court_position = |court: u32| ordering.iter().position(|c| *c == court).unwrap_or(bottom);

    // Classify every continuing player: winners climb toward Kings,
    // losers drop toward Bottom. A forfeit sends both teams down. Teams
    // are split into individuals from here on.
    let mut movers: Vec<Mover> = Vec::new();
    let mut prev_teammates: HashSet<(String, String)> = HashSet::new();
    for m in &round_matches {
        let pos = court_position(m.court);
        for team in [&m.team1, &m.team2] {
            if team.len() == 2 {
                prev_teammates.insert(ordered_pair(&team[0], &team[1]));
            }
        }
        let winners: HashSet<&String> = m.winning_team().map(|t| t.iter().collect()).unwrap_or_default();
        for player_id in m.players() {
            if !active_set.contains(player_id) {
                continue;
            }
            let won = winners.contains(player_id);
            let target = if won { pos.saturating_sub(1) } else { (pos + 1).min(bottom) };
            movers.push(Mover {
                player_id: player_id.clone(),
                current_pos: pos,
                target: target.min(bottom),
                won
            });
        }
    }

    let mut rng = session.generator_rng();

    // Waitlist rotation: everyone who sat comes back; fresh sitters are
    // drawn from the courts, lowest wait counts first, middle courts
    // before Bottom before Kings.
    let need_sit = active.len().saturating_sub(capacity);
    movers.shuffle(&mut rng);
    movers.sort_by_key(|m| {
        let sit_rank = if m.current_pos == 0 {
            2
        } else if m.current_pos == bottom.max(1) {
            1
        } else {
            0
        };
        (
            session.kotc.wait_counts.get(&m.player_id).copied().unwrap_or(0),
            sit_rank,
            m.current_pos
        )
    });
    let sitters: HashSet<String> = movers.iter().take(need_sit).map(|m| m.player_id.clone()).collect();

    let mover_ids: HashSet<String> = movers.iter().map(|m| m.player_id.clone()).collect();
    let returning: Vec<String> = active
        .iter()
        .filter(|p| !mover_ids.contains(*p) && !sitters.contains(*p))
        .cloned()
        .collect();

    // Seat continuing players at their movement targets.
    let mut buckets: Vec<Vec<Mover>> = vec![Vec::new(); usable_courts];
    for mover in movers {
        if sitters.contains(&mover.player_id) {
            continue;
        }
        buckets[mover.target].push(mover);
    }

    // Returning waiters prefer middle courts, then Bottom, then Kings.
    let mut preference: Vec<usize> = (1..bottom).collect();
    preference.push(bottom);
    if bottom > 0 {
        preference.push(0);
    }
    for player_id in returning {
        let slot = preference
            .iter()
            .copied()
            .find(|idx| buckets[*idx].len() < per_match)
            .or_else(|| (0..usable_courts).min_by_key(|idx| buckets[*idx].len()))
            .unwrap_or(bottom);
        buckets[slot].push(Mover {
            player_id,
            current_pos: slot,
            target: slot,
            won: false
        });
    }

    rebalance(&mut buckets, per_match);

    // Form teams court by court with mandatory splitting of last round's
    // partnerships, then start the next round.
    let mut created = Vec::new();
    let mut positions = IndexMap::new();
    for (idx, court) in active_ordering.iter().enumerate() {
        let group: Vec<String> = buckets[idx].iter().map(|m| m.player_id.clone()).collect();
        if group.len() != per_match {
            debug!(court, players = group.len(), "court short of players, skipping round match");
            continue;
        }
        let (team1, team2) = form_teams(session, &group, &prev_teammates, &mut rng);
        for player_id in &group {
            positions.insert(player_id.clone(), *court);
        }
        created.push(push_match(session, *court, team1, team2, now));
    }

    for player_id in positions.keys() {
        if let Some(stats) = session.stats.get_mut(player_id) {
            stats.stop_waiting(now);
        }
    }
    for player_id in &sitters {
        *session.kotc.wait_counts.entry(player_id.clone()).or_insert(0) += 1;
        if let Some(stats) = session.stats.get_mut(player_id) {
            stats.start_waiting(now);
        }
    }

    session.kotc.player_positions = positions;
    session.kotc.active_ordering = active_ordering;
    session.kotc.round_number += 1;
    session.kotc.round_match_ids = created.clone();
    info!(
        round = session.kotc.round_number,
        sitters = sitters.len(),
        "advanced to next round"
    );
    created
}

#[derive(Debug, Clone)]
struct Mover {
    player_id: String,
    current_pos: usize,
    target: usize,
    won: bool
}

/// Evens the buckets out to exactly `per_match` players each. Total
/// headcount already equals capacity, so every overfull court has a
/// deficit court to send players to; losers spill downward and winners
/// upward when possible.
fn rebalance(buckets: &mut [Vec<Mover>], per_match: usize) {
    let court_count = buckets.len();
    for _ in 0..court_count * per_match {
        let Some(over) = (0..court_count).find(|idx| buckets[*idx].len() > per_match) else {
            break;
        };
        let Some(under) = (0..court_count).min_by_key(|idx| {
            if buckets[*idx].len() < per_match {
                (over.abs_diff(*idx), *idx)
            } else {
                (usize::MAX, *idx)
            }
        }) else {
            break;
        };
        if buckets[under].len() >= per_match {
            break;
        }
        let downward = under > over;
        let pick = buckets[over]
            .iter()
            .position(|m| m.won != downward)
            .unwrap_or(buckets[over].len() - 1);
        let mut mover = buckets[over].remove(pick);
        mover.target = under;
        buckets[under].push(mover);
    }
}

/// Splits a court's players into two teams. Locked teams stay together,
/// banned pairs never partner, and pairs in `split_pairs` (last round's
/// partnerships) are separated whenever an arrangement allows it.
fn form_teams(
    session: &Session,
    group: &[String],
    split_pairs: &HashSet<(String, String)>,
    rng: &mut ChaCha8Rng
) -> (Vec<String>, Vec<String>) {
    if session.format == MatchFormat::Singles || group.len() < 4 {
        return (vec![group[0].clone()], vec![group[1].clone()]);
    }

    let mut shuffled: Vec<String> = group.to_vec();
    shuffled.shuffle(rng);

    let splits = [(1usize, 2usize, 3usize), (2, 1, 3), (3, 1, 2)];
    let mut candidates: Vec<(u32, u32, (Vec<String>, Vec<String>))> = Vec::new();
    for (with_first, x, y) in splits {
        let team1 = vec![shuffled[0].clone(), shuffled[with_first].clone()];
        let team2 = vec![shuffled[x].clone(), shuffled[y].clone()];

        let mut hard = 0;
        let mut soft = 0;
        for team in [&team1, &team2] {
            if session.is_banned(&team[0], &team[1]) {
                hard += 1;
            }
            if split_pairs.contains(&ordered_pair(&team[0], &team[1]))
                && !session.is_locked_pair(&team[0], &team[1])
            {
                soft += 1;
            }
        }
        // separating a locked pair is a hard violation
        for pair in [(&team1[0], &team2[0]), (&team1[0], &team2[1]), (&team1[1], &team2[0]), (&team1[1], &team2[1])] {
            if session.is_locked_pair(pair.0, pair.1) {
                hard += 1;
            }
        }
        candidates.push((hard, soft, (team1, team2)));
    }

    let best_key = candidates.iter().map(|(h, s, _)| (*h, *s)).min().unwrap_or((0, 0));
    let tied: Vec<(Vec<String>, Vec<String>)> = candidates
        .into_iter()
        .filter(|(h, s, _)| (*h, *s) == best_key)
        .map(|(_, _, teams)| teams)
        .collect();
    let pick = rng.random_range(0..tied.len());
    tied[pick].clone()
}

fn push_match(session: &mut Session, court: u32, team1: Vec<String>, team2: Vec<String>, now: DateTime<Utc>) -> u64 {
    let id = session.next_match_id();
    let mut m = Match::new(id, court, team1, team2, now);
    m.status = MatchStatus::InProgress;
    session.matches.push(m);
    id
}
