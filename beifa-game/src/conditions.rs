//! Named predicates gating options in the event graph.
//!
//! Content refers to conditions by name. Names are parsed once when the graph
//! loads; anything unrecognised is kept as [`Condition::Unknown`] and never
//! holds, so a typo disables the option instead of failing mid-play.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    CHANGAN_ASSAULT_FOOD, FINAL_ENTRY_FOOD, FINAL_ENTRY_PRESSURE, GUANZHONG_HOLD_TURNS,
    LONGYOU_READY_TURNS,
};
use crate::state::GameState;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    /// Longyou held long enough and not collapsed.
    LongyouReady,
    /// Guanzhong held long enough and the Longyou front intact.
    GuanzhongReady,
    ChapterIs(u8),
    ChapterAtLeast(u8),
    CanEnterFinal,
    CanAttackChangan,
    PostZhuge,
    NotPostZhuge,
    Unknown(String),
}

impl Condition {
    /// Parse a content name such as `chapter_is_3` or `longyou_ready`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        match name {
            "longyou_ready" => return Self::LongyouReady,
            "guanzhong_ready" => return Self::GuanzhongReady,
            "can_enter_final" => return Self::CanEnterFinal,
            "can_attack_changan" => return Self::CanAttackChangan,
            "post_zhuge" => return Self::PostZhuge,
            "not_post_zhuge" => return Self::NotPostZhuge,
            _ => {}
        }
        if let Some(chapter) = name
            .strip_prefix("chapter_is_")
            .and_then(|rest| rest.parse().ok())
        {
            return Self::ChapterIs(chapter);
        }
        if let Some(chapter) = name
            .strip_prefix("chapter_ge_")
            .and_then(|rest| rest.parse().ok())
        {
            return Self::ChapterAtLeast(chapter);
        }
        Self::Unknown(name.to_string())
    }

    #[must_use]
    pub fn holds(&self, state: &GameState) -> bool {
        match self {
            Self::LongyouReady => {
                state.longyou_turns >= LONGYOU_READY_TURNS && !state.longyou_collapsed
            }
            Self::GuanzhongReady => {
                state.guanzhong_turns >= GUANZHONG_HOLD_TURNS && !state.longyou_collapsed
            }
            Self::ChapterIs(chapter) => state.chapter == *chapter,
            Self::ChapterAtLeast(chapter) => state.chapter >= *chapter,
            Self::CanEnterFinal => final_push_ready(state, FINAL_ENTRY_FOOD),
            Self::CanAttackChangan => final_push_ready(state, CHANGAN_ASSAULT_FOOD),
            Self::PostZhuge => state.is_post_zhuge_era(),
            Self::NotPostZhuge => !state.is_post_zhuge_era(),
            Self::Unknown(_) => false,
        }
    }

    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

fn final_push_ready(state: &GameState, min_food: i32) -> bool {
    state.longyou_turns >= LONGYOU_READY_TURNS
        && state.wei_pressure >= FINAL_ENTRY_PRESSURE
        && state.food >= min_food
        && !state.longyou_collapsed
}

/// Absent conditions always hold.
#[must_use]
pub fn evaluate(condition: Option<&Condition>, state: &GameState) -> bool {
    condition.is_none_or(|condition| condition.holds(state))
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LongyouReady => f.write_str("longyou_ready"),
            Self::GuanzhongReady => f.write_str("guanzhong_ready"),
            Self::ChapterIs(chapter) => write!(f, "chapter_is_{chapter}"),
            Self::ChapterAtLeast(chapter) => write!(f, "chapter_ge_{chapter}"),
            Self::CanEnterFinal => f.write_str("can_enter_final"),
            Self::CanAttackChangan => f.write_str("can_attack_changan"),
            Self::PostZhuge => f.write_str("post_zhuge"),
            Self::NotPostZhuge => f.write_str("not_post_zhuge"),
            Self::Unknown(name) => f.write_str(name),
        }
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        value.to_string()
    }
}
