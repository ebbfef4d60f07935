use thiserror::Error;

use crate::state::Phase;

/// Structural problems in the event graph. Raised once at load; a graph that
/// fails any rule is never used.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("event document is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("node `{0}` is defined more than once")]
    DuplicateNode(String),
    #[error("start node `{0}` does not exist")]
    MissingStart(String),
    #[error("route `{route}` endpoint `{place}` is not a known place")]
    RouteEndpoint { route: String, place: String },
    #[error("node `{0}` has no outgoing edge")]
    NoOutgoingEdge(String),
    #[error("terminal node `{0}` is not one of the allowed terminal ids")]
    IllegalTerminal(String),
    #[error("node `{node}` references unknown place `{place}`")]
    UnknownPlace { node: String, place: String },
    #[error("node `{node}` references unknown route `{route}`")]
    UnknownRoute { node: String, route: String },
    #[error("node `{node}` sits at `{location}` but route `{route}` starts at `{origin}`")]
    RouteOriginMismatch {
        node: String,
        route: String,
        location: String,
        origin: String,
    },
    #[error("edge `{from}` -> `{to}` targets a missing node")]
    DanglingEdge { from: String, to: String },
    #[error("terminal node `{0}` is missing")]
    MissingTerminal(String),
    #[error("no terminal node is reachable from `{0}`")]
    NoTerminalReachable(String),
    #[error("buffer phase `{0}` has no nodes")]
    EmptyBufferZone(Phase),
    #[error("buffer phase `{0}` cannot be entered from another phase")]
    SealedBufferEntry(Phase),
    #[error("buffer phase `{0}` cannot be left for another phase")]
    SealedBufferExit(Phase),
}

/// Errors surfaced through the action surface.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("game `{0}` not found")]
    NotFound(String),
    #[error("invalid action `{action}`: {reason}")]
    InvalidAction { action: String, reason: String },
    #[error("content corruption: {0}")]
    ContentCorruption(String),
    #[error(transparent)]
    Structural(#[from] GraphError),
    #[error("session store failed: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
    pub(crate) fn invalid(action: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}
