use crate::config::StatementKeywords;
use crate::constants::{COURT_ISSUE_BONUS_CAP, COURT_STATEMENT_BONUS_CAP};
use crate::state::{GameState, Resource};

use super::{CourtState, CourtStrategy, IssueTag};

/// Static weights describing how a strategy lands with the court.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyProfile {
    pub support_bias: f64,
    pub temperature_push: f64,
    pub resource_stat: Resource,
    pub resource_weight: f64,
    pub issue_bonus: &'static [(IssueTag, f64)],
    pub cost: &'static [(Resource, i32)],
    pub momentum_weight: f64,
}

const RATIONAL: StrategyProfile = StrategyProfile {
    support_bias: 1.5,
    temperature_push: -5.0,
    resource_stat: Resource::Politics,
    resource_weight: 0.08,
    issue_bonus: &[
        (IssueTag::Supply, 1.2),
        (IssueTag::Stability, 1.1),
        (IssueTag::Risk, 0.8),
        (IssueTag::Governance, 1.0),
    ],
    cost: &[(Resource::Food, -1)],
    momentum_weight: 0.04,
};

const AUTHORITY: StrategyProfile = StrategyProfile {
    support_bias: 0.2,
    temperature_push: -9.0,
    resource_stat: Resource::Politics,
    resource_weight: 0.12,
    issue_bonus: &[
        (IssueTag::Time, 1.0),
        (IssueTag::Conflict, 0.9),
        (IssueTag::Risk, 0.4),
    ],
    cost: &[(Resource::Politics, -4), (Resource::Morale, -1)],
    momentum_weight: 0.04,
};

const EMOTIONAL: StrategyProfile = StrategyProfile {
    support_bias: 1.0,
    temperature_push: 11.0,
    resource_stat: Resource::Morale,
    resource_weight: 0.1,
    issue_bonus: &[
        (IssueTag::Morale, 1.2),
        (IssueTag::Momentum, 1.1),
        (IssueTag::Offense, 1.0),
    ],
    cost: &[(Resource::Morale, -2), (Resource::Food, -1)],
    momentum_weight: 0.09,
};

#[must_use]
pub const fn profile(strategy: CourtStrategy) -> &'static StrategyProfile {
    match strategy {
        CourtStrategy::RationalArgument => &RATIONAL,
        CourtStrategy::AuthorityPressure => &AUTHORITY,
        CourtStrategy::EmotionalMobilization => &EMOTIONAL,
    }
}

impl StrategyProfile {
    /// Pull from the strategy's backing stat relative to its neutral level.
    #[must_use]
    pub fn resource_modifier(&self, state: &GameState) -> f64 {
        let baseline = if self.resource_stat == Resource::Food { 75.0 } else { 50.0 };
        (f64::from(state.resource(self.resource_stat)) - baseline) * self.resource_weight / 10.0
    }

    /// Sum of bonuses for matching issue tags, capped.
    #[must_use]
    pub fn issue_modifier(&self, tags: &[IssueTag]) -> f64 {
        let total: f64 = tags
            .iter()
            .filter_map(|tag| {
                self.issue_bonus
                    .iter()
                    .find(|(bonus_tag, _)| bonus_tag == tag)
                    .map(|(_, bonus)| *bonus)
            })
            .sum();
        total.min(COURT_ISSUE_BONUS_CAP)
    }
}

fn hits(text: &str, words: &[String]) -> usize {
    words
        .iter()
        .filter(|word| !word.is_empty() && text.contains(&word.to_lowercase()))
        .count()
}

fn mentions_any(text: &str, words: &[String]) -> bool {
    hits(text, words) > 0
}

/// Extra support earned by a well-aimed statement, in `0..=4`.
///
/// One point for length, up to two for strategy keywords, and up to two for
/// addressing the session's live issues.
#[must_use]
pub fn statement_bonus(
    statement: &str,
    strategy: CourtStrategy,
    tags: &[IssueTag],
    keywords: &StatementKeywords,
) -> i32 {
    let text = statement.to_lowercase();
    let length_score = usize::from(text.trim().chars().count() >= keywords.min_length);
    let strategy_words = match strategy {
        CourtStrategy::RationalArgument => &keywords.rational,
        CourtStrategy::AuthorityPressure => &keywords.authority,
        CourtStrategy::EmotionalMobilization => &keywords.emotional,
    };
    let keyword_score = hits(&text, strategy_words).min(2);
    let issue_score = tags
        .iter()
        .filter(|tag| match tag {
            IssueTag::Supply => mentions_any(&text, &keywords.supply),
            IssueTag::Morale => mentions_any(&text, &keywords.morale),
            IssueTag::Risk => mentions_any(&text, &keywords.risk),
            IssueTag::Stability => mentions_any(&text, &keywords.stability),
            _ => false,
        })
        .count()
        .min(2);
    let total = i32::try_from(length_score + keyword_score + issue_score).unwrap_or(i32::MAX);
    total.min(COURT_STATEMENT_BONUS_CAP)
}

/// Classify free text by keyword counts. Ties fall back to reasoned argument.
#[must_use]
pub fn infer_strategy(statement: &str, keywords: &StatementKeywords) -> CourtStrategy {
    let text = statement.to_lowercase();
    let rational = hits(&text, &keywords.infer_rational);
    let authority = hits(&text, &keywords.infer_authority);
    let emotional = hits(&text, &keywords.infer_emotional);
    if authority > rational && authority >= emotional {
        CourtStrategy::AuthorityPressure
    } else if emotional > rational && emotional > authority {
        CourtStrategy::EmotionalMobilization
    } else {
        CourtStrategy::RationalArgument
    }
}

/// Strategy used when the player lets the session run on its own.
#[must_use]
pub fn auto_strategy(court: &CourtState) -> CourtStrategy {
    let has = |tag: IssueTag| court.current_issue_tags.contains(&tag);
    if court.support < 42 && (has(IssueTag::Morale) || has(IssueTag::Momentum)) {
        CourtStrategy::EmotionalMobilization
    } else if has(IssueTag::Supply) || has(IssueTag::Stability) || has(IssueTag::Risk) {
        CourtStrategy::RationalArgument
    } else if court.time_pressure <= 1 && court.support < 60 {
        CourtStrategy::AuthorityPressure
    } else if court.temperature < 15 && court.support >= 60 {
        CourtStrategy::EmotionalMobilization
    } else {
        CourtStrategy::RationalArgument
    }
}
