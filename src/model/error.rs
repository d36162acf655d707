use crate::model::structures::match_status::MatchStatus;
use thiserror::Error;

/// Errors surfaced by the session orchestrator. Invalid input and state
/// conflicts leave the session unmutated; an invariant violation indicates
/// a bug and is fatal to the session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("scores must be non-negative and not tied, got {team1}:{team2}")]
    InvalidScore { team1: i32, team2: i32 },

    #[error("player {0} is already active in the session")]
    DuplicatePlayer(String),

    #[error("player {0} is not in the session")]
    UnknownPlayer(String),

    #[error("match {0} is not in the session")]
    UnknownMatch(u64),

    #[error("match {match_id} is not in progress (status {status:?})")]
    MatchNotInProgress { match_id: u64, status: MatchStatus },

    #[error("session invariant violated: {details}")]
    InvariantViolation { details: String },

    #[error("snapshot decoding failed: {0}")]
    Snapshot(#[from] serde_json::Error)
}
