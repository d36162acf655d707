use crate::model::structures::{match_outcome::MatchOutcome, match_status::MatchStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub team1: i32,
    pub team2: i32
}

impl MatchScore {
    pub fn outcome(&self) -> MatchOutcome {
        if self.team1 > self.team2 {
            MatchOutcome::Team1Wins
        } else {
            MatchOutcome::Team2Wins
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: u64,
    pub court: u32,
    pub team1: Vec<String>,
    pub team2: Vec<String>,
    pub status: MatchStatus,
    #[serde(default)]
    pub score: Option<MatchScore>,
    pub created_at: DateTime<Utc>,
    /// True when the generator had to relax the roaming window to seat
    /// this match.
    #[serde(default)]
    pub cross_bracket: bool
}

impl Match {
    pub fn new(
        id: u64,
        court: u32,
        team1: Vec<String>,
        team2: Vec<String>,
        created_at: DateTime<Utc>
    ) -> Match {
        Match {
            id,
            court,
            team1,
            team2,
            status: MatchStatus::Waiting,
            score: None,
            created_at,
            cross_bracket: false
        }
    }

    pub fn players(&self) -> impl Iterator<Item = &String> {
        self.team1.iter().chain(self.team2.iter())
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players().any(|p| p == player_id)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True when both players are on the same team of this match.
    pub fn teammates(&self, a: &str, b: &str) -> bool {
        let on = |team: &[String]| team.iter().any(|p| p == a) && team.iter().any(|p| p == b);
        on(&self.team1) || on(&self.team2)
    }

    /// True when the players are on opposite teams of this match.
    pub fn opponents(&self, a: &str, b: &str) -> bool {
        let split = |x: &[String], y: &[String]| x.iter().any(|p| p == a) && y.iter().any(|p| p == b);
        split(&self.team1, &self.team2) || split(&self.team2, &self.team1)
    }

    /// Teammates of the given player within this match.
    pub fn partners_of(&self, player_id: &str) -> Vec<String> {
        let team = if self.team1.iter().any(|p| p == player_id) {
            &self.team1
        } else if self.team2.iter().any(|p| p == player_id) {
            &self.team2
        } else {
            return Vec::new();
        };
        team.iter().filter(|p| *p != player_id).cloned().collect()
    }

    /// Members of the opposite team, or empty when the player is absent.
    pub fn opponents_of(&self, player_id: &str) -> Vec<String> {
        if self.team1.iter().any(|p| p == player_id) {
            self.team2.clone()
        } else if self.team2.iter().any(|p| p == player_id) {
            self.team1.clone()
        } else {
            Vec::new()
        }
    }

    /// Winning team roster of a completed match.
    pub fn winning_team(&self) -> Option<&[String]> {
        match (self.status, self.score) {
            (MatchStatus::Completed, Some(score)) => Some(match score.outcome() {
                MatchOutcome::Team1Wins => &self.team1,
                MatchOutcome::Team2Wins => &self.team2
            }),
            _ => None
        }
    }

    pub fn losing_team(&self) -> Option<&[String]> {
        match (self.status, self.score) {
            (MatchStatus::Completed, Some(score)) => Some(match score.outcome() {
                MatchOutcome::Team1Wins => &self.team2,
                MatchOutcome::Team2Wins => &self.team1
            }),
            _ => None
        }
    }
}
