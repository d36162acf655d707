use crate::model::{config::RatingConfig, player::PlayerStats, session::Session};
use std::collections::HashMap;

/// One row of the ranked player listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingView {
    pub player_id: String,
    pub rating: f64,
    pub provisional: bool,
    pub games_played: u32
}

/// Maps per-session stats to a bounded rating.
///
/// Established players get a closed-form score: a log-shaped win-rate term,
/// a log-shaped average point differential term and a consistency term for
/// frequent winners, all anchored at the base rating and clamped to the
/// configured bounds. Provisional players sit at the base rating (or their
/// pre-seeded rating) until they have played enough games.
pub fn rating_for(stats: &PlayerStats, seed_rating: Option<f64>, config: &RatingConfig) -> (f64, bool) {
    let provisional = stats.games_played < config.provisional_games;
    if provisional {
        let rating = seed_rating.unwrap_or(config.base_rating);
        return (rating.clamp(config.min_rating, config.max_rating), true);
    }

    let win_rate = stats.win_rate();
    let win_rate_term = (1.0 + win_rate * 9.0).ln() * 200.0 - 200.0;

    let avg_point_diff = stats.avg_point_diff();
    let point_diff_term = avg_point_diff.signum() * (1.0 + avg_point_diff.abs()).ln() * 50.0;

    let consistency_term = if win_rate >= 0.6 {
        (stats.games_played as f64).ln() * 30.0
    } else {
        0.0
    };

    let rating = config.base_rating + win_rate_term + point_diff_term + consistency_term;
    (rating.clamp(config.min_rating, config.max_rating), false)
}

/// Ranked listing of active players: rating descending, then games played
/// ascending (newer players first), then id for determinism.
pub fn leaderboard(session: &Session) -> Vec<RatingView> {
    let mut rows: Vec<RatingView> = session
        .active_ids()
        .into_iter()
        .map(|player_id| {
            let stats = &session.stats[&player_id];
            let seed = session.player(&player_id).and_then(|p| p.seed_rating);
            let (rating, provisional) = rating_for(stats, seed, &session.config.rating);
            RatingView {
                player_id,
                rating,
                provisional,
                games_played: stats.games_played
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .expect("ratings are finite")
            .then(a.games_played.cmp(&b.games_played))
            .then(a.player_id.cmp(&b.player_id))
    });
    rows
}

/// 1-based rank of every active player in leaderboard order.
pub fn ranks(session: &Session) -> HashMap<String, usize> {
    leaderboard(session)
        .into_iter()
        .enumerate()
        .map(|(i, row)| (row.player_id, i + 1))
        .collect()
}

/// Ratings of every active player keyed by id.
pub fn ratings_by_id(session: &Session) -> HashMap<String, f64> {
    leaderboard(session)
        .into_iter()
        .map(|row| (row.player_id, row.rating))
        .collect()
}

/// Ids of active players still inside the provisional window.
pub fn provisional_ids(session: &Session) -> std::collections::HashSet<String> {
    leaderboard(session)
        .into_iter()
        .filter(|row| row.provisional)
        .map(|row| row.player_id)
        .collect()
}
