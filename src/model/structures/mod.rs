pub mod match_format;
pub mod match_outcome;
pub mod match_status;
pub mod mode;
pub mod seeding_option;
pub mod session_phase;
pub mod skill_tier;
pub mod wait_tier;
