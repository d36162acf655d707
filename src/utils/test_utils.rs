//! Shared fixtures for unit and integration tests.

use crate::model::{
    clock::ManualClock,
    manager::SessionManager,
    player::{Player, PlayerStats},
    session::Session,
    structures::{match_format::MatchFormat, mode::SessionMode}
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Fixed session start instant used across the test suite.
pub fn test_start() -> DateTime<Utc> {
    "2026-03-01T18:00:00Z".parse().expect("valid timestamp")
}

/// Players p00, p01, ... with display names to match.
pub fn generate_players(count: usize) -> Vec<Player> {
    (0..count)
        .map(|i| Player::new(format!("p{i:02}"), format!("Player {i:02}")))
        .collect()
}

/// Empty session with a fixed id, so every derived RNG stream is stable.
pub fn generate_session(mode: SessionMode, format: MatchFormat, num_courts: u32) -> Session {
    Session::with_id(Uuid::from_u128(0xC0FF_EE00), mode, format, num_courts)
}

/// Session with `count` active players whose wait timers run from the
/// test start, matching what `add_player` would have produced.
pub fn generate_populated_session(
    mode: SessionMode,
    format: MatchFormat,
    num_courts: u32,
    count: usize
) -> Session {
    let mut session = generate_session(mode, format, num_courts);
    for player in generate_players(count) {
        session.stats.insert(
            player.id.clone(),
            PlayerStats {
                wait_started_at: Some(test_start()),
                ..Default::default()
            }
        );
        session.players.push(player);
    }
    session
}

/// Manager over a populated session plus a handle to its manual clock.
pub fn generate_manager(
    mode: SessionMode,
    format: MatchFormat,
    num_courts: u32,
    count: usize
) -> (SessionManager<ManualClock>, ManualClock) {
    let session = generate_populated_session(mode, format, num_courts, count);
    let clock = ManualClock::starting_at(test_start());
    (SessionManager::with_clock(session, clock.clone()), clock)
}
