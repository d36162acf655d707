use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub display_name: String,
    pub active: bool,
    /// Optional pre-seeded rating used while the player is provisional.
    #[serde(default)]
    pub seed_rating: Option<f64>
}

impl Player {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Player {
        Player {
            id: id.into(),
            display_name: display_name.into(),
            active: true,
            seed_rating: None
        }
    }

    pub fn with_seed_rating(mut self, rating: f64) -> Player {
        self.seed_rating = Some(rating);
        self
    }
}

/// Per-session statistics for one player. Mutated only through the
/// orchestrator entry points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub games_played: u32,
    pub games_waited: u32,
    pub total_wait_secs: i64,
    pub wait_started_at: Option<DateTime<Utc>>,
    pub wins: u32,
    pub losses: u32,
    pub points_for: i64,
    pub points_against: i64,
    /// One entry per match partnered, in match order.
    pub partners: Vec<String>,
    /// One entry per opposing player per match, in match order.
    pub opponents: Vec<String>
}

impl PlayerStats {
    /// Accumulated wait plus the currently running timer, in seconds.
    pub fn effective_wait_secs(&self, now: DateTime<Utc>) -> i64 {
        let running = self
            .wait_started_at
            .map(|started| (now - started).num_seconds().max(0))
            .unwrap_or(0);
        self.total_wait_secs + running
    }

    /// Starts the wait timer if one is not already running.
    pub fn start_waiting(&mut self, now: DateTime<Utc>) {
        if self.wait_started_at.is_none() {
            self.wait_started_at = Some(now);
        }
    }

    /// Folds the running timer into the accumulated total and clears it.
    pub fn stop_waiting(&mut self, now: DateTime<Utc>) {
        if let Some(started) = self.wait_started_at.take() {
            self.total_wait_secs += (now - started).num_seconds().max(0);
        }
    }

    pub fn win_rate(&self) -> f64 {
        self.wins as f64 / self.games_played.max(1) as f64
    }

    pub fn avg_point_diff(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        (self.points_for - self.points_against) as f64 / self.games_played as f64
    }
}
