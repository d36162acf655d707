use crate::model::{
    adaptive::AdaptiveState,
    constants::{
        HOMOGENEOUS_PARTNER_BONUS, MATCHUP_BONUS_MAX, MATCHUP_BONUS_MIN, MISMATCH_GAP_BASE, MISMATCH_GAP_SPAN,
        MISMATCH_PENALTY_MAX, MISMATCH_PENALTY_MIN, OPPONENT_REPEAT_PENALTY, PARTNER_REPEAT_PENALTY,
        PERFECT_BALANCE_BONUS_MAX, PERFECT_BALANCE_BONUS_MIN, PERFECT_BALANCE_WINDOW
    },
    history::HistoryIndex,
    structures::skill_tier::SkillTier,
    wait::WaitAssessment
};
use itertools::Itertools;
use std::collections::HashMap;

/// One candidate way of turning a player group into two teams.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    pub team1: Vec<String>,
    pub team2: Vec<String>
}

impl Arrangement {
    pub fn players(&self) -> impl Iterator<Item = &String> {
        self.team1.iter().chain(self.team2.iter())
    }

    /// Within-team pairs (empty for singles).
    pub fn partner_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        for team in [&self.team1, &self.team2] {
            for pair in team.iter().combinations(2) {
                pairs.push((pair[0].as_str(), pair[1].as_str()));
            }
        }
        pairs
    }

    /// Cross-team pairs: four in doubles, one in singles.
    pub fn cross_pairs(&self) -> Vec<(&str, &str)> {
        self.team1
            .iter()
            .cartesian_product(self.team2.iter())
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect()
    }
}

/// Immutable inputs for scoring one arrangement.
pub struct ScoreContext<'a> {
    pub ratings: &'a HashMap<String, f64>,
    pub history: &'a HistoryIndex,
    pub adaptive: &'a AdaptiveState,
    pub wait: &'a WaitAssessment,
    pub base_rating: f64
}

impl ScoreContext<'_> {
    fn rating_of(&self, player_id: &str) -> f64 {
        self.ratings.get(player_id).copied().unwrap_or(self.base_rating)
    }

    fn team_avg(&self, team: &[String]) -> f64 {
        team.iter().map(|p| self.rating_of(p)).sum::<f64>() / team.len().max(1) as f64
    }

    fn tier_of(&self, player_id: &str) -> SkillTier {
        SkillTier::from_rating(self.rating_of(player_id), self.base_rating)
    }

    fn top_tier(&self, team: &[String]) -> SkillTier {
        team.iter().map(|p| self.tier_of(p)).max().unwrap_or(SkillTier::Average)
    }
}

/// Scores one arrangement; higher is better. None means the arrangement is
/// rejected outright by the balance threshold. Gate failures are handled by
/// the caller before scoring.
///
/// `relaxed` drops the homogeneous-partnership bonus, matching the
/// generator's last-resort pass.
pub fn score_arrangement(ctx: &ScoreContext, arrangement: &Arrangement, relaxed: bool) -> Option<f64> {
    let weight = ctx.adaptive.balance_weight;
    let weight_scale = weight / 5.0;

    let diff = (ctx.team_avg(&arrangement.team1) - ctx.team_avg(&arrangement.team2)).abs();
    if let Some(threshold) = ctx.adaptive.balance_threshold {
        if diff > threshold {
            return None;
        }
    }

    let mut score = -weight * diff;

    if diff <= PERFECT_BALANCE_WINDOW {
        let closeness = (PERFECT_BALANCE_WINDOW - diff) / PERFECT_BALANCE_WINDOW;
        score += (PERFECT_BALANCE_BONUS_MIN + closeness * (PERFECT_BALANCE_BONUS_MAX - PERFECT_BALANCE_BONUS_MIN))
            * weight_scale;
    }

    if ctx.adaptive.is_mid_or_late() {
        for team in [&arrangement.team1, &arrangement.team2] {
            if team.len() < 2 {
                continue;
            }
            let tiers: Vec<SkillTier> = team.iter().map(|p| ctx.tier_of(p)).collect();
            if !relaxed && tiers.iter().all_equal() {
                score += HOMOGENEOUS_PARTNER_BONUS * weight_scale;
            }
            let elite_weak =
                tiers.contains(&SkillTier::Elite) && tiers.contains(&SkillTier::Weak);
            if elite_weak {
                let (lo, hi) = team
                    .iter()
                    .map(|p| ctx.rating_of(p))
                    .fold((f64::MAX, f64::MIN), |(lo, hi), r| (lo.min(r), hi.max(r)));
                let gap = hi - lo;
                let severity = ((gap - MISMATCH_GAP_BASE) / MISMATCH_GAP_SPAN).clamp(0.0, 1.0);
                score -= (MISMATCH_PENALTY_MIN + severity * (MISMATCH_PENALTY_MAX - MISMATCH_PENALTY_MIN))
                    * weight_scale;
            }
        }

        let top1 = ctx.top_tier(&arrangement.team1);
        let top2 = ctx.top_tier(&arrangement.team2);
        if top1 == top2 {
            let height = top1.rank() as f64 / 3.0;
            score += (MATCHUP_BONUS_MIN + height * (MATCHUP_BONUS_MAX - MATCHUP_BONUS_MIN)) * weight_scale;
        }
    }

    let partner_repeats: u32 = arrangement
        .partner_pairs()
        .iter()
        .map(|(a, b)| ctx.history.partner_count(a, b))
        .sum();
    let opponent_repeats: u32 = arrangement
        .cross_pairs()
        .iter()
        .map(|(a, b)| ctx.history.opponent_count(a, b))
        .sum();
    score -= ctx.adaptive.variety_weight
        * (PARTNER_REPEAT_PENALTY * partner_repeats as f64 + OPPONENT_REPEAT_PENALTY * opponent_repeats as f64);

    score += arrangement.players().map(|p| ctx.wait.wait_bonus(p)).sum::<f64>();

    Some(score)
}
