use crate::model::{constants, structures::seeding_option::SeedingOption};
use serde::{Deserialize, Serialize};

/// Rating bounds and the provisional cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub base_rating: f64,
    pub min_rating: f64,
    pub max_rating: f64,
    pub provisional_games: u32
}

impl Default for RatingConfig {
    fn default() -> Self {
        RatingConfig {
            base_rating: constants::BASE_RATING,
            min_rating: constants::MIN_RATING,
            max_rating: constants::MAX_RATING,
            provisional_games: constants::PROVISIONAL_GAMES
        }
    }
}

/// Hard repetition gaps. Below the small-session threshold both gaps
/// collapse to 1 (back-to-back stays forbidden).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepetitionConfig {
    pub partner_gap_required: u32,
    pub opponent_gap_required: u32,
    pub small_session_threshold: usize
}

impl Default for RepetitionConfig {
    fn default() -> Self {
        RepetitionConfig {
            partner_gap_required: constants::PARTNER_GAP_REQUIRED,
            opponent_gap_required: constants::OPPONENT_GAP_REQUIRED,
            small_session_threshold: constants::SMALL_SESSION_THRESHOLD
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoamingConfig {
    pub active_from: usize,
    pub window: f64
}

impl RoamingConfig {
    /// Half-width of the rank window at the given active player count.
    pub fn window_size(&self, active_count: usize) -> usize {
        (active_count as f64 * self.window).floor() as usize
    }
}

impl Default for RoamingConfig {
    fn default() -> Self {
        RoamingConfig {
            active_from: constants::ROAMING_ACTIVE_FROM,
            window: constants::ROAMING_WINDOW
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub min_gap_secs: i64,
    pub significant_gap_secs: i64,
    pub extreme_gap_secs: i64
}

impl Default for WaitConfig {
    fn default() -> Self {
        WaitConfig {
            min_gap_secs: constants::MIN_GAP_SECS,
            significant_gap_secs: constants::SIGNIFICANT_GAP_SECS,
            extreme_gap_secs: constants::EXTREME_GAP_SECS
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateConfig {
    pub pool_floor: usize,
    pub pool_ceiling: usize,
    pub uncapped_below: usize
}

impl CandidateConfig {
    /// Pool cap for the given availability, or None when every available
    /// player is a candidate.
    pub fn pool_size(&self, active_count: usize, available: usize) -> Option<usize> {
        if active_count > self.uncapped_below {
            Some(self.pool_floor.max(self.pool_ceiling.min(available / 2)))
        } else {
            None
        }
    }
}

impl Default for CandidateConfig {
    fn default() -> Self {
        CandidateConfig {
            pool_floor: constants::CANDIDATE_POOL_FLOOR,
            pool_ceiling: constants::CANDIDATE_POOL_CEILING,
            uncapped_below: constants::CANDIDATE_UNCAPPED_BELOW
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub mid_avg_games: f64,
    pub late_avg_games: f64,
    pub early_balance_weight: f64,
    pub mid_balance_weight: f64,
    pub late_balance_weight: f64,
    pub mid_balance_threshold: f64,
    pub late_balance_threshold: f64
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        AdaptiveConfig {
            mid_avg_games: constants::MID_PHASE_AVG_GAMES,
            late_avg_games: constants::LATE_PHASE_AVG_GAMES,
            early_balance_weight: constants::EARLY_BALANCE_WEIGHT,
            mid_balance_weight: constants::MID_BALANCE_WEIGHT,
            late_balance_weight: constants::LATE_BALANCE_WEIGHT,
            mid_balance_threshold: constants::MID_BALANCE_THRESHOLD,
            late_balance_threshold: constants::LATE_BALANCE_THRESHOLD
        }
    }
}

/// King-of-the-Court settings. An empty `court_ordering` means courts
/// 1..=N ranked Kings-first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KotcConfig {
    pub court_ordering: Vec<u32>,
    pub seeding_option: SeedingOption,
    pub first_byes: Vec<String>
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub rating: RatingConfig,
    pub repetition: RepetitionConfig,
    pub roaming: RoamingConfig,
    pub wait: WaitConfig,
    pub candidate: CandidateConfig,
    pub adaptive: AdaptiveConfig,
    pub king_of_court: KotcConfig
}

/// Partial configuration update. Sub-records are replaced wholesale;
/// untouched records keep their current values. Applied by the
/// orchestrator with no retroactive recomputation of stats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub rating: Option<RatingConfig>,
    pub repetition: Option<RepetitionConfig>,
    pub roaming: Option<RoamingConfig>,
    pub wait: Option<WaitConfig>,
    pub candidate: Option<CandidateConfig>,
    pub adaptive: Option<AdaptiveConfig>,
    pub king_of_court: Option<KotcConfig>,
    pub adaptive_disabled: Option<bool>,
    /// Some(None) clears a manual weight, Some(Some(w)) sets one.
    pub manual_balance_weight: Option<Option<f64>>
}

impl ConfigPatch {
    pub fn apply(self, config: &mut SessionConfig) -> (Option<bool>, Option<Option<f64>>) {
        if let Some(rating) = self.rating {
            config.rating = rating;
        }
        if let Some(repetition) = self.repetition {
            config.repetition = repetition;
        }
        if let Some(roaming) = self.roaming {
            config.roaming = roaming;
        }
        if let Some(wait) = self.wait {
            config.wait = wait;
        }
        if let Some(candidate) = self.candidate {
            config.candidate = candidate;
        }
        if let Some(adaptive) = self.adaptive {
            config.adaptive = adaptive;
        }
        if let Some(king_of_court) = self.king_of_court {
            config.king_of_court = king_of_court;
        }
        (self.adaptive_disabled, self.manual_balance_weight)
    }
}
