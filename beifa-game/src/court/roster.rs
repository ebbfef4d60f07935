//! The seven ministers of the Shu court and their scripted lines.

use crate::config::CourtConfig;

use super::{CourtResult, CourtStrategy, NpcState, ResentmentRules, StrategyAffinity};

struct MinisterProfile {
    id: &'static str,
    display_name: &'static str,
    persona_tag: &'static str,
    camp: &'static str,
    base_stance: i32,
    influence: i32,
    /// Rational, authority, emotional.
    affinity: [f64; 3],
    /// Ignore, oppose, suppressed.
    resentment: [i32; 3],
}

const MINISTERS: [MinisterProfile; 7] = [
    MinisterProfile {
        id: "liu_shan",
        display_name: "Liu Shan",
        persona_tag: "young emperor",
        camp: "imperial",
        base_stance: 12,
        influence: 5,
        affinity: [0.45, 0.35, 0.5],
        resentment: [1, 1, 1],
    },
    MinisterProfile {
        id: "jiang_wan",
        display_name: "Jiang Wan",
        persona_tag: "chief administrator",
        camp: "administration",
        base_stance: -8,
        influence: 4,
        affinity: [0.9, -0.15, -0.2],
        resentment: [1, 2, 2],
    },
    MinisterProfile {
        id: "fei_yi",
        display_name: "Fei Yi",
        persona_tag: "mediator",
        camp: "moderate",
        base_stance: 4,
        influence: 3,
        affinity: [0.55, 0.1, 0.45],
        resentment: [1, 1, 1],
    },
    MinisterProfile {
        id: "yang_yi",
        display_name: "Yang Yi",
        persona_tag: "chief clerk",
        camp: "bureaucrat",
        base_stance: -26,
        influence: 4,
        affinity: [0.15, -0.6, -0.65],
        resentment: [2, 2, 3],
    },
    MinisterProfile {
        id: "dong_yun",
        display_name: "Dong Yun",
        persona_tag: "palace censor",
        camp: "institution",
        base_stance: -34,
        influence: 4,
        affinity: [0.7, -0.5, -0.8],
        resentment: [2, 2, 3],
    },
    MinisterProfile {
        id: "jiang_wei",
        display_name: "Jiang Wei",
        persona_tag: "hawk general",
        camp: "hawk",
        base_stance: 38,
        influence: 3,
        affinity: [0.2, 0.25, 0.9],
        resentment: [1, 2, 2],
    },
    MinisterProfile {
        id: "wei_yan",
        display_name: "Wei Yan",
        persona_tag: "vanguard general",
        camp: "vanguard",
        base_stance: 58,
        influence: 4,
        affinity: [-0.35, -0.3, 1.0],
        resentment: [2, 2, 3],
    },
];

/// Fresh roster in its fixed speaking order.
#[must_use]
pub fn default_roster() -> Vec<NpcState> {
    MINISTERS
        .iter()
        .map(|profile| NpcState {
            id: profile.id.to_string(),
            display_name: profile.display_name.to_string(),
            persona_tag: profile.persona_tag.to_string(),
            camp: profile.camp.to_string(),
            base_stance: profile.base_stance,
            stance: profile.base_stance,
            influence: profile.influence,
            affinity: StrategyAffinity {
                rational_argument: profile.affinity[0],
                authority_pressure: profile.affinity[1],
                emotional_mobilization: profile.affinity[2],
            },
            resentment_rules: ResentmentRules {
                ignore: profile.resentment[0],
                oppose: profile.resentment[1],
                suppressed: profile.resentment[2],
            },
            resentment: 0,
            ignored_rounds: 0,
        })
        .collect()
}

pub(super) const EMPEROR_ID: &str = "liu_shan";
pub(super) const CLERK_ID: &str = "yang_yi";
pub(super) const VANGUARD_ID: &str = "wei_yan";
pub(super) const CENSOR_ID: &str = "dong_yun";

pub(super) const OPENING_LINES: [(&str, &str); 7] = [
    ("jiang_wan", "Report the grain stores and the marching distance first. Empty talk helps no one."),
    ("yang_yi", "If the front errs again, who will bear the blame?"),
    ("wei_yan", "Hesitation only squanders the opening!"),
    ("yang_yi", "Wei Yan gambles with lives again. Who cleans up after him?"),
    ("fei_yi", "Let us agree on principles before we argue attack or defense."),
    ("dong_yun", "Orders may be workable, but the statutes must hold."),
    ("liu_shan", "Chancellor, settle the court with your counsel."),
];

pub(super) fn positive_line(npc_id: &str, strategy: CourtStrategy) -> &'static str {
    use CourtStrategy::{AuthorityPressure as A, EmotionalMobilization as E, RationalArgument as R};
    match (npc_id, strategy) {
        ("liu_shan", R) => "The reasoning is clear. We can issue an edict on it.",
        ("liu_shan", A) => "Set the order first, but do not wound the court.",
        ("liu_shan", E) => "The army's spirit can be used. We grant more time.",
        ("jiang_wan", R) => "The ledgers reconcile. This plan is workable.",
        ("jiang_wan", A) => "If the order is fixed, I will fill in the procedure.",
        ("jiang_wan", E) => "So long as the supply tables close, I support it.",
        ("fei_yi", R) => "Steady first, then move. Everyone can accept that.",
        ("fei_yi", A) => "A quick blade works. I will soften the hall for it.",
        ("fei_yi", E) => "These words calm the army and the people alike.",
        ("yang_yi", R) => "At least the evidence is complete this time.",
        ("yang_yi", A) => "Orders from one desk will speed things up.",
        ("yang_yi", E) => "If the losses are truly contained, I will not object for now.",
        ("dong_yun", R) => "It follows the statutes. I can countersign.",
        ("dong_yun", A) => "The order may stand, provided the review is kept.",
        ("dong_yun", E) => "If the people truly benefit, the institutions can bend.",
        ("jiang_wei", R) => "A sound plan. The vanguard can carry it out.",
        ("jiang_wei", A) => "Give the order and I march tonight.",
        ("jiang_wei", E) => "The soldiers want to fight. Let them.",
        ("wei_yan", R) => "Fine. With the grain settled, give me the Ziwu valley road.",
        ("wei_yan", A) => "At last, someone who gives orders!",
        ("wei_yan", E) => "That is the fire we need. On to Chang'an!",
        _ => "I will follow the court's decision.",
    }
}

pub(super) fn negative_line(npc_id: &str, strategy: CourtStrategy) -> &'static str {
    use CourtStrategy::{AuthorityPressure as A, EmotionalMobilization as E, RationalArgument as R};
    match (npc_id, strategy) {
        ("liu_shan", R) => "So many figures. We still cannot decide.",
        ("liu_shan", A) => "Pressing this hard will unsettle the ministers.",
        ("liu_shan", E) => "Fervor alone will not fill the granaries.",
        ("jiang_wan", R) => "The grain figures still do not add up.",
        ("jiang_wan", A) => "Orders without accounts will break the treasury.",
        ("jiang_wan", E) => "Passion is not a supply plan.",
        ("fei_yi", R) => "Sound, but the hall is not yet of one mind.",
        ("fei_yi", A) => "Force now will cost us goodwill later.",
        ("fei_yi", E) => "Stirring words, but they split the hall.",
        ("yang_yi", R) => "Numbers on paper. Who answers if they are wrong?",
        ("yang_yi", A) => "Command by intimidation? My objection goes on the record.",
        ("yang_yi", E) => "Gambling the state on feelings again.",
        ("dong_yun", R) => "The review is incomplete. I cannot seal this.",
        ("dong_yun", A) => "Not even the chancellor may bypass the statutes.",
        ("dong_yun", E) => "This court does not govern by sentiment.",
        ("jiang_wei", R) => "Endless counting while the enemy regroups.",
        ("jiang_wei", A) => "Orders without fire will not move the men.",
        ("jiang_wei", E) => "Even spirit needs a clear objective.",
        ("wei_yan", R) => "Ledgers! Give me ten thousand men instead.",
        ("wei_yan", A) => "Orders from the rear will lose us this war.",
        ("wei_yan", E) => "Speeches. The enemy does not fear speeches.",
        _ => "I have reservations.",
    }
}

pub(super) const RIVALRY_VANGUARD_LINE: &str = "All accounts and no fighting!";
pub(super) const RIVALRY_CLERK_LINE: &str = "If the surprise march fails, the treasury falls first.";

/// Emperor's read of the room after a round. Bands sit eight points inside
/// the pass and fail thresholds.
pub(super) const fn progress_line(support: i32, time_pressure: i32, cfg: &CourtConfig) -> &'static str {
    if support >= cfg.pass_threshold - 8 {
        "The court is coming together. One more push."
    } else if support <= cfg.fail_threshold + 8 {
        "The divide is too wide. Perhaps another approach?"
    } else if time_pressure <= 1 {
        "Time is nearly out. We must decide."
    } else {
        "Continue the debate."
    }
}

pub(super) const fn settlement_line(result: CourtResult) -> &'static str {
    match result {
        CourtResult::Pass => "So be it. The edict goes out today.",
        CourtResult::TimeoutPass => "Barely agreed. Proceed with care.",
        CourtResult::Fail => "The court cannot back this. Hold for now.",
        CourtResult::TimeoutFail => "Time has run out. The matter must wait.",
    }
}
