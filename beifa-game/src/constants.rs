//! Centralized balance and tuning constants for the Beifa campaign engine.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together ensures that balance can only be adjusted via
//! reviewed code changes rather than through the content document.

// Node and flag identifiers -------------------------------------------------
pub const WIN_NODE_ID: &str = "WIN";
pub const DEFEAT_NODE_ID: &str = "DEFEAT_SHU";
pub const CRISIS_NODE_ID: &str = "doom_total_offensive";
pub const CRISIS_CHECK_NODE_ID: &str = "doom_defense_check";

pub const FLAG_WOOD_OX_DONE: &str = "wood_ox_done";
pub const FLAG_JIETING_HELD: &str = "jieting_held";
pub const FLAG_POST_ZHUGE_ERA: &str = "post_zhuge_era";
pub const FLAG_CORE_LOST: &str = "core_lost";
pub const FLAG_DOOM_CHAIN_ACTIVE: &str = "doom_chain_active";

// Starting resources --------------------------------------------------------
pub const INITIAL_FOOD: i32 = 110;
pub const INITIAL_MORALE: i32 = 62;
pub const INITIAL_POLITICS: i32 = 48;
pub const INITIAL_WEI_PRESSURE: i32 = 2;
pub const INITIAL_HEALTH: i32 = 7;
pub const INITIAL_DOOM: i32 = 0;
pub const START_LOCATION: &str = "chengdu";
pub const START_CONTROLLED: [&str; 2] = ["chengdu", "hanzhong"];

// Resource bounds -----------------------------------------------------------
pub const MAX_FOOD_BASE: i32 = 160;
pub const MAX_FOOD_POST_ZHUGE: i32 = 128;
pub const MAX_MORALE: i32 = 100;
pub const MAX_POLITICS: i32 = 100;
pub const MAX_WEI_PRESSURE: i32 = 10;
pub const MAX_HEALTH: i32 = 10;
pub const MAX_DOOM: i32 = 20;
pub const MAX_HOLDING_TURNS: i32 = 99;
pub const LOG_CAPACITY: usize = 10;

// Turn advance --------------------------------------------------------------
pub const DOOM_THRESHOLD: i32 = 12;
pub const DOOM_BASE_GAIN: i32 = 1;
pub const DOOM_LOW_FOOD_BELOW: i32 = 60;
pub const DOOM_HIGH_PRESSURE_AT: i32 = 6;
pub const HEALTH_ATTRITION_CHAPTER: u8 = 4;
pub const ROUTE_PROGRESS_STEP_PER_TURN: f64 = 0.2;
pub const MAX_TURNS_PER_RUN: u32 = 220;

// Victory and readiness -----------------------------------------------------
pub const LONGYOU_READY_TURNS: i32 = 5;
pub const GUANZHONG_HOLD_TURNS: i32 = 3;
pub const FINAL_ENTRY_PRESSURE: i32 = 3;
pub const FINAL_ENTRY_FOOD: i32 = 65;
pub const CHANGAN_ASSAULT_FOOD: i32 = 70;

// Era transition ------------------------------------------------------------
pub const POST_ZHUGE_SUCCESS_MULTIPLIER: f64 = 0.7;
pub const POST_ZHUGE_EFFICIENCY_MULTIPLIER: f64 = 0.7;
pub const POST_ZHUGE_DOOM_BONUS: i32 = 1;
pub const POST_ZHUGE_POLITICS_DRAIN: i32 = 1;
pub const POST_ZHUGE_PRESSURE_BUMP: i32 = 1;

// Checks --------------------------------------------------------------------
pub const CHECK_PROBABILITY_FLOOR: f64 = 0.05;
pub const CHECK_PROBABILITY_CEILING: f64 = 0.95;
pub const UNKNOWN_CHECK_BASE: f64 = 0.5;
pub const CHECK_BASE_PROBABILITIES: [(&str, f64); 11] = [
    ("jieting_masu", 0.40),
    ("jieting_veteran", 0.65),
    ("longyou_rebellion", 0.28),
    ("supply_harass", 0.55),
    ("court_infighting", 0.40),
    ("wei_sortie", 0.22),
    ("wuzhang_sortie", 0.16),
    ("changan_assault_fast", 0.24),
    ("changan_assault_steady", 0.36),
    ("guanzhong_hold", 0.52),
    ("doom_defense", 0.42),
];
pub const MOMENTUM_LIMIT: i32 = 4;

// Court tuning --------------------------------------------------------------
pub const COURT_CRITICAL_FOOD: i32 = 62;
pub const COURT_CRITICAL_MORALE: i32 = 45;
pub const COURT_CRITICAL_DOOM: i32 = 8;
pub const COURT_CRITICAL_MOMENTUM: i32 = -2;
pub const COURT_SUPPORT_SEED_MIN: i32 = 20;
pub const COURT_SUPPORT_SEED_MAX: i32 = 84;
pub const COURT_SUPPORT_JITTER: f64 = 3.0;
pub const COURT_TEMPERATURE_JITTER: f64 = 4.0;
pub const COURT_TEMPERATURE_LIMIT: i32 = 100;
pub const COURT_SUPPORT_SHIFT_LIMIT: i32 = 18;
pub const COURT_TEMPERATURE_SHIFT_LIMIT: i32 = 20;
pub const COURT_SCORE_NOISE: f64 = 0.65;
pub const COURT_TEMPERATURE_NOISE: f64 = 2.0;
pub const COURT_ISSUE_BONUS_CAP: f64 = 2.6;
pub const COURT_MAX_ISSUE_TAGS: usize = 5;
pub const COURT_STATEMENT_MAX_CHARS: usize = 120;
pub const COURT_STATEMENT_BONUS_CAP: i32 = 4;
pub const COURT_AGGRESSIVE_TEMPERATURE: i32 = 32;
pub const COURT_CONSERVATIVE_TEMPERATURE: i32 = -26;
pub const COURT_OBSTRUCTION_FOOD_BELOW: i32 = 65;
pub const RESENTMENT_MAX: i32 = 20;
pub const STANCE_DRIFT_LIMIT: i32 = 6;

// Dialogue ------------------------------------------------------------------
pub const DIALOGUE_MIN_CHARS: usize = 4;
pub const DIALOGUE_MAX_CHARS: usize = 96;
pub const DIALOGUE_COOLDOWN_SECS: u64 = 12;
