// Default tuning values for the session engine. Config records start from
// these; tests instantiate the same defaults deterministically.

// Rating
pub const BASE_RATING: f64 = 1500.0;
pub const MIN_RATING: f64 = 800.0;
pub const MAX_RATING: f64 = 2200.0;
pub const PROVISIONAL_GAMES: u32 = 2;

// Hard repetition gaps (competitive variety)
pub const PARTNER_GAP_REQUIRED: u32 = 3;
pub const OPPONENT_GAP_REQUIRED: u32 = 2;
pub const SMALL_SESSION_THRESHOLD: usize = 8;

// Roaming (rank window) restrictions
pub const ROAMING_ACTIVE_FROM: usize = 12;
pub const ROAMING_WINDOW: f64 = 0.5;

// Wait tiers, measured in seconds from the shortest waiter
pub const MIN_GAP_SECS: i64 = 120;
pub const SIGNIFICANT_GAP_SECS: i64 = 720;
pub const EXTREME_GAP_SECS: i64 = 1200;

// Candidate pool sizing
pub const CANDIDATE_POOL_FLOOR: usize = 12;
pub const CANDIDATE_POOL_CEILING: usize = 16;
pub const CANDIDATE_UNCAPPED_BELOW: usize = 16;

// Adaptive phase boundaries and weights
pub const MID_PHASE_AVG_GAMES: f64 = 4.0;
pub const LATE_PHASE_AVG_GAMES: f64 = 6.0;
pub const EARLY_BALANCE_WEIGHT: f64 = 1.0;
pub const MID_BALANCE_WEIGHT: f64 = 3.0;
pub const LATE_BALANCE_WEIGHT: f64 = 5.0;
pub const MID_BALANCE_THRESHOLD: f64 = 300.0;
pub const LATE_BALANCE_THRESHOLD: f64 = 200.0;
pub const MAX_VARIETY_WEIGHT: f64 = 3.0;
pub const MIN_VARIETY_WEIGHT: f64 = 1.0;

// Scoring. The bonus ranges are interpolated linearly:
// perfect balance over closeness within the window, the Elite/Weak
// mismatch over the pair's rating gap (normalized from the minimum
// possible Elite-Weak gap of 250 across the next 350 points), and the
// tier matchup over tier height (Weak..Elite).
pub const PERFECT_BALANCE_WINDOW: f64 = 50.0;
pub const PERFECT_BALANCE_BONUS_MIN: f64 = 50.0;
pub const PERFECT_BALANCE_BONUS_MAX: f64 = 250.0;
pub const HOMOGENEOUS_PARTNER_BONUS: f64 = 75.0;
pub const MISMATCH_PENALTY_MIN: f64 = 50.0;
pub const MISMATCH_PENALTY_MAX: f64 = 100.0;
pub const MISMATCH_GAP_BASE: f64 = 250.0;
pub const MISMATCH_GAP_SPAN: f64 = 350.0;
pub const MATCHUP_BONUS_MIN: f64 = 40.0;
pub const MATCHUP_BONUS_MAX: f64 = 75.0;
pub const PARTNER_REPEAT_PENALTY: f64 = 50.0;
pub const OPPONENT_REPEAT_PENALTY: f64 = 30.0;
pub const WAIT_BONUS_NORMAL: f64 = 10.0;
pub const WAIT_BONUS_SIGNIFICANT: f64 = 500.0;
pub const WAIT_BONUS_EXTREME: f64 = 5000.0;

// Skill tier offsets, relative to base rating
pub const ELITE_TIER_OFFSET: f64 = 200.0;
pub const STRONG_TIER_OFFSET: f64 = 50.0;
pub const AVERAGE_TIER_OFFSET: f64 = -50.0;

// Upper bound on candidate combinations examined per court
pub const MAX_COMBINATIONS_PER_COURT: usize = 3000;

// Hypothetical score used by the outcome-dependency analyzer
pub const PLAUSIBLE_WINNING_SCORE: i32 = 11;
pub const PLAUSIBLE_LOSING_SCORE: i32 = 5;
