use crate::model::{
    adaptive::AdaptiveState,
    constants::MAX_COMBINATIONS_PER_COURT,
    constraints::{GateContext, GateOptions},
    history::{HistoryIndex, PairRole},
    kotc,
    matches::Match,
    rating,
    scoring::{score_arrangement, Arrangement, ScoreContext},
    session::Session,
    structures::{match_format::MatchFormat, match_status::MatchStatus, mode::SessionMode},
    wait::WaitAssessment
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::{debug, info};

/// Runs the generator appropriate for the session's mode and returns the
/// ids of any matches it created.
pub fn run_for_mode(session: &mut Session, now: DateTime<Utc>) -> Vec<u64> {
    match session.mode {
        SessionMode::CompetitiveVariety => populate_empty_courts(session, now),
        SessionMode::KingOfTheCourt => kotc::try_advance(session, now)
    }
}

/// Fills empty courts for competitive-variety play. Courts that cannot be
/// filled legally are left available; this is never an error.
pub fn populate_empty_courts(session: &mut Session, now: DateTime<Utc>) -> Vec<u64> {
    let empty_courts = session.empty_courts();
    if empty_courts.is_empty() {
        return Vec::new();
    }

    // Snapshot taken once, before any court is filled: the ultra-lenient
    // fallback for later courts must not be disabled by the matches this
    // very loop creates.
    let all_courts_empty_at_start = session.non_terminal_matches().next().is_none();

    let mut rng = session.generator_rng();
    let ranks = rating::ranks(session);
    let ratings = rating::ratings_by_id(session);
    let provisional = rating::provisional_ids(session);
    let adaptive = AdaptiveState::assess(session);
    let history = HistoryIndex::build(&session.matches);
    let wait = WaitAssessment::assess(session, now);
    let mut pool = wait.candidate_pool(session, &mut rng);

    let mut planned: Vec<(u32, Arrangement, bool)> = Vec::new();
    {
        let gate = GateContext {
            session,
            history: &history,
            ranks: &ranks,
            provisional: &provisional,
            adaptive: &adaptive
        };
        let score_ctx = ScoreContext {
            ratings: &ratings,
            history: &history,
            adaptive: &adaptive,
            wait: &wait,
            base_rating: session.config.rating.base_rating
        };

        for court in empty_courts {
            let needed = session.format.players_per_match();
            if pool.len() < needed {
                continue;
            }

            let locked_in_pool: Vec<(String, String)> = session
                .locked_teams
                .iter()
                .filter(|(a, b)| pool.contains(a) && pool.contains(b))
                .cloned()
                .collect();

            let choice = try_fill(&pool, session.format, &gate, &score_ctx, GateOptions::strict(), &locked_in_pool)
                .map(|arrangement| (arrangement, false))
                .or_else(|| {
                    try_fill(
                        &pool,
                        session.format,
                        &gate,
                        &score_ctx,
                        GateOptions::cross_bracket(),
                        &locked_in_pool
                    )
                    .map(|arrangement| (arrangement, true))
                })
                .or_else(|| {
                    if all_courts_empty_at_start {
                        try_fill(
                            &pool,
                            session.format,
                            &gate,
                            &score_ctx,
                            GateOptions::ultra_lenient(),
                            &locked_in_pool
                        )
                        .map(|arrangement| (arrangement, true))
                    } else {
                        None
                    }
                });

            match choice {
                Some((arrangement, cross_bracket)) => {
                    pool.retain(|p| !arrangement.players().any(|q| q == p));
                    planned.push((court, arrangement, cross_bracket));
                }
                None => debug!(court, "no legal arrangement, court stays available")
            }
        }
    }

    let mut created = Vec::new();
    for (court, arrangement, cross_bracket) in planned {
        let id = session.next_match_id();
        let mut m = Match::new(id, court, arrangement.team1, arrangement.team2, now);
        m.status = MatchStatus::InProgress;
        m.cross_bracket = cross_bracket;
        let seated: Vec<String> = m.players().cloned().collect();
        info!(match_id = id, court, cross_bracket, "seated match");
        session.matches.push(m);
        for player_id in seated {
            if let Some(stats) = session.stats.get_mut(&player_id) {
                stats.stop_waiting(now);
            }
        }
        created.push(id);
    }
    created
}

/// Best-scoring legal arrangement from the pool for one court, or None.
/// Combinations containing an available locked pair are examined first so
/// locked teams land on the lowest courts.
fn try_fill(
    pool: &[String],
    format: MatchFormat,
    gate: &GateContext,
    score_ctx: &ScoreContext,
    opts: GateOptions,
    locked_in_pool: &[(String, String)]
) -> Option<Arrangement> {
    let needed = format.players_per_match();

    // Locked pairs waiting together take priority: if any legal
    // arrangement seats one, it wins outright over unlocked alternatives.
    if format == MatchFormat::Doubles {
        let mut locked_combos: Vec<Vec<String>> = Vec::new();
        for (a, b) in locked_in_pool {
            let rest: Vec<&String> = pool.iter().filter(|p| *p != a && *p != b).collect();
            for extra in rest.into_iter().combinations(needed - 2) {
                let mut combo = vec![a.clone(), b.clone()];
                combo.extend(extra.into_iter().cloned());
                locked_combos.push(combo);
            }
        }
        locked_combos.truncate(MAX_COMBINATIONS_PER_COURT);
        if let Some(found) = best_arrangement(&locked_combos, format, gate, score_ctx, opts) {
            return Some(found);
        }
    }

    let combos: Vec<Vec<String>> = pool
        .iter()
        .combinations(needed)
        .take(MAX_COMBINATIONS_PER_COURT)
        .map(|combo| combo.into_iter().cloned().collect())
        .collect();
    best_arrangement(&combos, format, gate, score_ctx, opts)
}

fn best_arrangement(
    combos: &[Vec<String>],
    format: MatchFormat,
    gate: &GateContext,
    score_ctx: &ScoreContext,
    opts: GateOptions
) -> Option<Arrangement> {
    let mut best: Option<(f64, Arrangement)> = None;
    for combo in combos {
        if !combo_feasible(gate, combo, format, opts) {
            continue;
        }
        for arrangement in arrangements_of(combo, format) {
            if !arrangement_legal(gate, &arrangement, opts) {
                continue;
            }
            if let Some(score) = score_arrangement(score_ctx, &arrangement, opts.relaxed) {
                let better = best.as_ref().is_none_or(|(s, _)| score > *s);
                if better {
                    best = Some((score, arrangement));
                }
            }
        }
    }
    best.map(|(_, arrangement)| arrangement)
}

/// Cheap pre-filter: every pair in the combination must be pairable in at
/// least one role before team splits are worth enumerating.
fn combo_feasible(gate: &GateContext, combo: &[String], format: MatchFormat, opts: GateOptions) -> bool {
    for pair in combo.iter().combinations(2) {
        let (a, b) = (pair[0], pair[1]);
        let as_opponent = gate.can_play_with(a, b, PairRole::Opponent, opts);
        let as_partner = format == MatchFormat::Doubles && gate.can_play_with(a, b, PairRole::Partner, opts);
        if !as_opponent && !as_partner {
            return false;
        }
    }
    true
}

fn arrangements_of(combo: &[String], format: MatchFormat) -> Vec<Arrangement> {
    match format {
        MatchFormat::Singles => vec![Arrangement {
            team1: vec![combo[0].clone()],
            team2: vec![combo[1].clone()]
        }],
        MatchFormat::Doubles => {
            // the three ways to split four players into two teams
            [(1, 2, 3), (2, 1, 3), (3, 1, 2)]
                .iter()
                .map(|&(with_first, x, y)| Arrangement {
                    team1: vec![combo[0].clone(), combo[with_first].clone()],
                    team2: vec![combo[x].clone(), combo[y].clone()]
                })
                .collect()
        }
    }
}

fn arrangement_legal(gate: &GateContext, arrangement: &Arrangement, opts: GateOptions) -> bool {
    arrangement
        .partner_pairs()
        .iter()
        .all(|(a, b)| gate.can_play_with(a, b, PairRole::Partner, opts))
        && arrangement
            .cross_pairs()
            .iter()
            .all(|(a, b)| gate.can_play_with(a, b, PairRole::Opponent, opts))
}
