//! Engine tunables loaded from JSON with per-field defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Safety valve for chained check nodes resolved in one transition.
    #[serde(default = "EngineConfig::default_check_chain_limit")]
    pub check_chain_limit: u32,
    /// Diagnostics entries retained per session.
    #[serde(default = "EngineConfig::default_diagnostics_limit")]
    pub diagnostics_limit: usize,
    #[serde(default)]
    pub court: CourtConfig,
}

impl EngineConfig {
    const fn default_check_chain_limit() -> u32 {
        32
    }

    const fn default_diagnostics_limit() -> usize {
        256
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the document is malformed or a field is out
    /// of bounds.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate all tunables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=256).contains(&self.check_chain_limit) {
            return Err(ConfigError::RangeViolation {
                field: "check_chain_limit",
                min: 1,
                max: 256,
                value: i64::from(self.check_chain_limit),
            });
        }
        if self.diagnostics_limit == 0 {
            return Err(ConfigError::MinViolation {
                field: "diagnostics_limit",
                min: 1,
                value: 0,
            });
        }
        self.court.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            check_chain_limit: Self::default_check_chain_limit(),
            diagnostics_limit: Self::default_diagnostics_limit(),
            court: CourtConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtConfig {
    /// Turns between scheduled sessions.
    #[serde(default = "CourtConfig::default_trigger_interval")]
    pub trigger_interval: u32,
    #[serde(default = "CourtConfig::default_pass_threshold")]
    pub pass_threshold: i32,
    #[serde(default = "CourtConfig::default_fail_threshold")]
    pub fail_threshold: i32,
    /// Support needed for a timeout to count as a pass.
    #[serde(default = "CourtConfig::default_timeout_pass_midline")]
    pub timeout_pass_midline: i32,
    #[serde(default = "CourtConfig::default_resentment_threshold")]
    pub resentment_threshold: i32,
    #[serde(default = "CourtConfig::default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "CourtConfig::default_fast_forward_round_cap")]
    pub fast_forward_round_cap: u32,
    #[serde(default)]
    pub keywords: StatementKeywords,
}

impl CourtConfig {
    const fn default_trigger_interval() -> u32 {
        3
    }

    const fn default_pass_threshold() -> i32 {
        72
    }

    const fn default_fail_threshold() -> i32 {
        18
    }

    const fn default_timeout_pass_midline() -> i32 {
        52
    }

    const fn default_resentment_threshold() -> i32 {
        9
    }

    const fn default_history_limit() -> usize {
        8
    }

    const fn default_fast_forward_round_cap() -> u32 {
        10
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger_interval == 0 {
            return Err(ConfigError::MinViolation {
                field: "court.trigger_interval",
                min: 1,
                value: 0,
            });
        }
        for (field, value) in [
            ("court.pass_threshold", self.pass_threshold),
            ("court.fail_threshold", self.fail_threshold),
            ("court.timeout_pass_midline", self.timeout_pass_midline),
        ] {
            if !(0..=100).contains(&value) {
                return Err(ConfigError::RangeViolation {
                    field,
                    min: 0,
                    max: 100,
                    value: i64::from(value),
                });
            }
        }
        if self.fail_threshold >= self.timeout_pass_midline
            || self.timeout_pass_midline >= self.pass_threshold
        {
            return Err(ConfigError::ThresholdOrder {
                fail: self.fail_threshold,
                midline: self.timeout_pass_midline,
                pass: self.pass_threshold,
            });
        }
        if !(1..=20).contains(&self.resentment_threshold) {
            return Err(ConfigError::RangeViolation {
                field: "court.resentment_threshold",
                min: 1,
                max: 20,
                value: i64::from(self.resentment_threshold),
            });
        }
        if self.history_limit == 0 {
            return Err(ConfigError::MinViolation {
                field: "court.history_limit",
                min: 1,
                value: 0,
            });
        }
        if self.fast_forward_round_cap == 0 {
            return Err(ConfigError::MinViolation {
                field: "court.fast_forward_round_cap",
                min: 1,
                value: 0,
            });
        }
        self.keywords.validate()
    }
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            trigger_interval: Self::default_trigger_interval(),
            pass_threshold: Self::default_pass_threshold(),
            fail_threshold: Self::default_fail_threshold(),
            timeout_pass_midline: Self::default_timeout_pass_midline(),
            resentment_threshold: Self::default_resentment_threshold(),
            history_limit: Self::default_history_limit(),
            fast_forward_round_cap: Self::default_fast_forward_round_cap(),
            keywords: StatementKeywords::default(),
        }
    }
}

/// Keyword tables used to score and classify free-text court statements.
///
/// Matching is case-insensitive substring search on the statement. The
/// `infer_*` tables classify a statement sent without a strategy; the
/// narrower strategy tables score its bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementKeywords {
    #[serde(default = "StatementKeywords::default_min_length")]
    pub min_length: usize,
    #[serde(default = "StatementKeywords::default_rational")]
    pub rational: Vec<String>,
    #[serde(default = "StatementKeywords::default_authority")]
    pub authority: Vec<String>,
    #[serde(default = "StatementKeywords::default_emotional")]
    pub emotional: Vec<String>,
    #[serde(default = "StatementKeywords::default_infer_rational")]
    pub infer_rational: Vec<String>,
    #[serde(default = "StatementKeywords::default_infer_authority")]
    pub infer_authority: Vec<String>,
    #[serde(default = "StatementKeywords::default_infer_emotional")]
    pub infer_emotional: Vec<String>,
    #[serde(default = "StatementKeywords::default_supply")]
    pub supply: Vec<String>,
    #[serde(default = "StatementKeywords::default_morale")]
    pub morale: Vec<String>,
    #[serde(default = "StatementKeywords::default_risk")]
    pub risk: Vec<String>,
    #[serde(default = "StatementKeywords::default_stability")]
    pub stability: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

impl StatementKeywords {
    const fn default_min_length() -> usize {
        18
    }

    fn default_rational() -> Vec<String> {
        words(&[
            "evidence", "data", "logistics", "supply", "risk", "证据", "可行", "补给", "风险", "粮",
        ])
    }

    fn default_authority() -> Vec<String> {
        words(&[
            "command",
            "discipline",
            "order",
            "authority",
            "军令",
            "问责",
            "命令",
            "服从",
        ])
    }

    fn default_emotional() -> Vec<String> {
        words(&[
            "morale", "people", "hope", "spirit", "士气", "军心", "民心", "将士",
        ])
    }

    fn default_infer_rational() -> Vec<String> {
        words(&[
            "evidence", "feasible", "supply", "logistics", "budget", "risk", "numbers", "data",
            "粮", "补给", "可行", "证据", "制度", "风险",
        ])
    }

    fn default_infer_authority() -> Vec<String> {
        words(&[
            "edict",
            "command",
            "discipline",
            "obey",
            "accountability",
            "authority",
            "order",
            "军令",
            "命令",
            "压制",
            "问责",
            "服从",
        ])
    }

    fn default_infer_emotional() -> Vec<String> {
        words(&[
            "morale", "troops", "people", "hope", "loyalty", "momentum", "spirit", "士气", "军心",
            "民心", "将士", "乘胜",
        ])
    }

    fn default_supply() -> Vec<String> {
        words(&["supply", "logistics", "补给", "粮"])
    }

    fn default_morale() -> Vec<String> {
        words(&["morale", "士气", "军心"])
    }

    fn default_risk() -> Vec<String> {
        words(&["risk", "风险"])
    }

    fn default_stability() -> Vec<String> {
        words(&["stability", "order", "稳", "制度"])
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, list) in [
            ("court.keywords.rational", &self.rational),
            ("court.keywords.authority", &self.authority),
            ("court.keywords.emotional", &self.emotional),
            ("court.keywords.infer_rational", &self.infer_rational),
            ("court.keywords.infer_authority", &self.infer_authority),
            ("court.keywords.infer_emotional", &self.infer_emotional),
        ] {
            if list.iter().all(|word| word.trim().is_empty()) {
                return Err(ConfigError::EmptyKeywords { field });
            }
        }
        Ok(())
    }
}

impl Default for StatementKeywords {
    fn default() -> Self {
        Self {
            min_length: Self::default_min_length(),
            rational: Self::default_rational(),
            authority: Self::default_authority(),
            emotional: Self::default_emotional(),
            infer_rational: Self::default_infer_rational(),
            infer_authority: Self::default_infer_authority(),
            infer_emotional: Self::default_infer_emotional(),
            supply: Self::default_supply(),
            morale: Self::default_morale(),
            risk: Self::default_risk(),
            stability: Self::default_stability(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config document is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: i64,
        value: i64,
    },
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("court thresholds must satisfy fail {fail} < midline {midline} < pass {pass}")]
    ThresholdOrder { fail: i32, midline: i32, pass: i32 },
    #[error("{field} must contain at least one keyword")]
    EmptyKeywords { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = EngineConfig::from_json("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.court.pass_threshold, 72);
        assert_eq!(cfg.court.fast_forward_round_cap, 10);
        assert!(cfg.court.keywords.rational.iter().any(|w| w == "补给"));
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = EngineConfig::from_json(
            r#"{"court": {"trigger_interval": 5, "keywords": {"authority": ["decree"]}}}"#,
        )
        .unwrap();
        assert_eq!(cfg.court.trigger_interval, 5);
        assert_eq!(cfg.court.keywords.authority, vec!["decree".to_string()]);
        assert_eq!(cfg.court.keywords.min_length, 18);
        assert_eq!(cfg.check_chain_limit, 32);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err = EngineConfig::from_json(r#"{"court": {"fail_threshold": 60}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdOrder { .. }));
    }

    #[test]
    fn out_of_range_values_report_field() {
        let err = EngineConfig::from_json(r#"{"check_chain_limit": 0}"#).unwrap_err();
        assert!(err.to_string().contains("check_chain_limit"));
        let err = EngineConfig::from_json(r#"{"court": {"keywords": {"emotional": [" "]}}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyKeywords { .. }));
    }
}
