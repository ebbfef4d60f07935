//! Player actions accepted by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::court::CourtStrategy;
use crate::error::EngineError;

/// Raw payload fields. Which ones are required depends on the action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_hint: Option<String>,
}

impl ActionPayload {
    #[must_use]
    pub fn option(option_id: impl Into<String>) -> Self {
        Self {
            option_id: Some(option_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn strategy(strategy: impl Into<String>) -> Self {
        Self {
            strategy: Some(strategy.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn statement(statement: impl Into<String>, hint: Option<&str>) -> Self {
        Self {
            statement: Some(statement.into()),
            strategy_hint: hint.map(ToString::to_string),
            ..Self::default()
        }
    }
}

/// Action kinds understood by the turn controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ChooseOption,
    NextTurn,
    CourtStrategy,
    CourtStatement,
    CourtFastForward,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChooseOption => "choose_option",
            Self::NextTurn => "next_turn",
            Self::CourtStrategy => "court_strategy",
            Self::CourtStatement => "court_statement",
            Self::CourtFastForward => "court_fast_forward",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "choose_option" | "recover_choice" | "court_choice" | "defense_choice" => {
                Ok(Self::ChooseOption)
            }
            "next_turn" => Ok(Self::NextTurn),
            "court_strategy" => Ok(Self::CourtStrategy),
            "court_statement" => Ok(Self::CourtStatement),
            "court_fast_forward" => Ok(Self::CourtFastForward),
            other => Err(EngineError::invalid(other, "unsupported action")),
        }
    }
}

/// A parsed, validated action ready for the turn controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ChooseOption { option_id: String },
    NextTurn,
    CourtStrategy { strategy: CourtStrategy },
    CourtStatement {
        statement: String,
        hint: Option<CourtStrategy>,
    },
    CourtFastForward,
}

impl Action {
    /// Parse an action name and its payload.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidAction` for unknown names, missing
    /// required fields, or an unparseable strategy.
    pub fn parse(name: &str, payload: &ActionPayload) -> Result<Self, EngineError> {
        let kind: ActionKind = name.parse()?;
        let action = match kind {
            ActionKind::ChooseOption => {
                let option_id = required(kind, payload.option_id.as_deref(), "option_id")?;
                Self::ChooseOption {
                    option_id: option_id.to_string(),
                }
            }
            ActionKind::NextTurn => Self::NextTurn,
            ActionKind::CourtStrategy => {
                let raw = required(kind, payload.strategy.as_deref(), "strategy")?;
                Self::CourtStrategy {
                    strategy: parse_strategy(kind, raw)?,
                }
            }
            ActionKind::CourtStatement => {
                let statement = required(kind, payload.statement.as_deref(), "statement")?;
                let hint = payload
                    .strategy_hint
                    .as_deref()
                    .map(str::trim)
                    .filter(|raw| !raw.is_empty())
                    .map(|raw| parse_strategy(kind, raw))
                    .transpose()?;
                Self::CourtStatement {
                    statement: statement.to_string(),
                    hint,
                }
            }
            ActionKind::CourtFastForward => Self::CourtFastForward,
        };
        Ok(action)
    }

    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::ChooseOption { .. } => ActionKind::ChooseOption,
            Self::NextTurn => ActionKind::NextTurn,
            Self::CourtStrategy { .. } => ActionKind::CourtStrategy,
            Self::CourtStatement { .. } => ActionKind::CourtStatement,
            Self::CourtFastForward => ActionKind::CourtFastForward,
        }
    }

    /// Canonical payload for replay records.
    #[must_use]
    pub fn payload(&self) -> ActionPayload {
        match self {
            Self::ChooseOption { option_id } => ActionPayload::option(option_id.clone()),
            Self::CourtStrategy { strategy } => ActionPayload::strategy(strategy.as_str()),
            Self::CourtStatement { statement, hint } => {
                ActionPayload::statement(statement.clone(), hint.map(CourtStrategy::as_str))
            }
            Self::NextTurn | Self::CourtFastForward => ActionPayload::default(),
        }
    }
}

fn required<'a>(
    kind: ActionKind,
    value: Option<&'a str>,
    field: &str,
) -> Result<&'a str, EngineError> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| EngineError::invalid(kind.as_str(), format!("missing `{field}`")))
}

fn parse_strategy(kind: ActionKind, raw: &str) -> Result<CourtStrategy, EngineError> {
    raw.parse()
        .map_err(|err| EngineError::invalid(kind.as_str(), format!("{err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_names_alias_choose_option() {
        for name in ["recover_choice", "court_choice", "defense_choice"] {
            let action = Action::parse(name, &ActionPayload::option("fortify")).unwrap();
            assert_eq!(action.kind(), ActionKind::ChooseOption);
        }
    }

    #[test]
    fn unsupported_name_is_invalid() {
        let err = Action::parse("teleport", &ActionPayload::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAction { ref action, .. } if action == "teleport"));
    }

    #[test]
    fn missing_fields_are_reported() {
        let err = Action::parse("choose_option", &ActionPayload::default()).unwrap_err();
        assert!(err.to_string().contains("option_id"));
        let err = Action::parse("court_strategy", &ActionPayload::option("x")).unwrap_err();
        assert!(err.to_string().contains("strategy"));
        let err = Action::parse("court_statement", &ActionPayload::statement("  ", None))
            .unwrap_err();
        assert!(err.to_string().contains("statement"));
    }

    #[test]
    fn strategies_and_hints_parse() {
        let action = Action::parse("court_strategy", &ActionPayload::strategy("pressure")).unwrap();
        assert_eq!(
            action,
            Action::CourtStrategy {
                strategy: CourtStrategy::AuthorityPressure
            }
        );
        let action = Action::parse(
            "court_statement",
            &ActionPayload::statement("Hold the line", Some("emotion")),
        )
        .unwrap();
        assert_eq!(
            action.payload().strategy_hint.as_deref(),
            Some("emotional_mobilization")
        );
        let err = Action::parse("court_strategy", &ActionPayload::strategy("bribery")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAction { .. }));
    }
}
