//! Validated narrative graph.
//!
//! The campaign is a directed graph of choice, check, and terminal nodes. The
//! document is parsed and validated once; a graph that breaks any structural
//! rule is rejected whole.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

use crate::conditions::Condition;
use crate::constants::{DEFEAT_NODE_ID, WIN_NODE_ID};
use crate::effects::Effects;
use crate::error::GraphError;
use crate::places::PlaceCatalog;
use crate::state::Phase;

const EVENTS_JSON: &str = include_str!("../assets/data/events.json");

pub const ALLOWED_TERMINALS: [&str; 2] = [WIN_NODE_ID, DEFEAT_NODE_ID];

/// Placement metadata attached to every node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    pub location: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gain_control: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lose_control: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub next: String,
    #[serde(default, skip_serializing_if = "Effects::is_empty")]
    pub effects: Effects,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node_type", rename_all = "snake_case")]
pub enum NodeKind {
    Choice {
        options: Vec<ChoiceOption>,
    },
    Check {
        check: String,
        #[serde(default)]
        success_next: Option<String>,
        #[serde(default)]
        fail_next: Option<String>,
        #[serde(default)]
        success_effects: Effects,
        #[serde(default)]
        fail_effects: Effects,
    },
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub meta: NodeMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    /// Outgoing edge targets. Checks list success before failure.
    #[must_use]
    pub fn edges(&self) -> SmallVec<[&str; 4]> {
        match &self.kind {
            NodeKind::Choice { options } => options.iter().map(|opt| opt.next.as_str()).collect(),
            NodeKind::Check {
                success_next,
                fail_next,
                ..
            } => success_next
                .iter()
                .chain(fail_next.iter())
                .map(String::as_str)
                .collect(),
            NodeKind::Terminal => SmallVec::new(),
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal)
    }

    #[must_use]
    pub const fn is_check(&self) -> bool {
        matches!(self.kind, NodeKind::Check { .. })
    }

    #[must_use]
    pub fn option(&self, option_id: &str) -> Option<&ChoiceOption> {
        match &self.kind {
            NodeKind::Choice { options } => options.iter().find(|opt| opt.id == option_id),
            _ => None,
        }
    }
}

/// Serialized form of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub start_node: String,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct EventGraph {
    start: String,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl EventGraph {
    /// The compiled-in campaign, validated against the standard catalog.
    ///
    /// # Errors
    ///
    /// Returns `GraphError` if the bundled content is malformed.
    pub fn standard() -> Result<Self, GraphError> {
        Self::from_json(EVENTS_JSON, &PlaceCatalog::standard())
    }

    /// Parse and validate a graph document.
    ///
    /// # Errors
    ///
    /// Returns `GraphError` when the JSON is malformed or any structural rule
    /// fails.
    pub fn from_json(raw: &str, catalog: &PlaceCatalog) -> Result<Self, GraphError> {
        let document: GraphDocument = serde_json::from_str(raw.trim_start_matches('\u{feff}'))?;
        Self::from_document(document, catalog)
    }

    /// Build and validate a graph from an already-parsed document.
    ///
    /// # Errors
    ///
    /// Returns `GraphError` when any structural rule fails.
    pub fn from_document(document: GraphDocument, catalog: &PlaceCatalog) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(document.nodes.len());
        for (position, node) in document.nodes.iter().enumerate() {
            if index.insert(node.id.clone(), position).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }
        let graph = Self {
            start: document.start_node,
            nodes: document.nodes,
            index,
        };
        graph.validate(catalog)?;
        Ok(graph)
    }

    #[must_use]
    pub fn start(&self) -> &str {
        &self.start
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    /// Nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn phase_of(&self, id: &str) -> Option<Phase> {
        self.node(id).and_then(|node| node.phase)
    }

    /// Run every structural rule, stopping at the first violation.
    ///
    /// # Errors
    ///
    /// Returns the first `GraphError` found.
    pub fn validate(&self, catalog: &PlaceCatalog) -> Result<(), GraphError> {
        if self.node(&self.start).is_none() {
            return Err(GraphError::MissingStart(self.start.clone()));
        }

        for (route_id, route) in catalog.routes() {
            for place in [&route.origin, &route.destination] {
                if !catalog.has_place(place) {
                    return Err(GraphError::RouteEndpoint {
                        route: route_id.to_string(),
                        place: place.clone(),
                    });
                }
            }
        }

        for node in &self.nodes {
            self.validate_node(node, catalog)?;
        }

        for terminal in ALLOWED_TERMINALS {
            if self.node(terminal).is_none() {
                return Err(GraphError::MissingTerminal(terminal.to_string()));
            }
        }

        let reachable = self.reachable_from(&self.start);
        if !ALLOWED_TERMINALS.iter().any(|id| reachable.contains(id)) {
            return Err(GraphError::NoTerminalReachable(self.start.clone()));
        }

        for phase in Phase::BUFFERS {
            self.validate_buffer(phase)?;
        }
        Ok(())
    }

    fn validate_node(&self, node: &Node, catalog: &PlaceCatalog) -> Result<(), GraphError> {
        let edges = node.edges();
        if node.is_terminal() {
            if !ALLOWED_TERMINALS.contains(&node.id.as_str()) {
                return Err(GraphError::IllegalTerminal(node.id.clone()));
            }
        } else if edges.is_empty() {
            return Err(GraphError::NoOutgoingEdge(node.id.clone()));
        }

        let meta = &node.meta;
        let places = std::iter::once(&meta.location)
            .chain(&meta.gain_control)
            .chain(&meta.lose_control);
        for place in places {
            if !catalog.has_place(place) {
                return Err(GraphError::UnknownPlace {
                    node: node.id.clone(),
                    place: place.clone(),
                });
            }
        }

        if let Some(route_id) = &meta.route_id {
            let route = catalog.route(route_id).ok_or_else(|| GraphError::UnknownRoute {
                node: node.id.clone(),
                route: route_id.clone(),
            })?;
            if meta.location != route.origin {
                return Err(GraphError::RouteOriginMismatch {
                    node: node.id.clone(),
                    route: route_id.clone(),
                    location: meta.location.clone(),
                    origin: route.origin.clone(),
                });
            }
        }

        for target in edges {
            if self.node(target).is_none() {
                return Err(GraphError::DanglingEdge {
                    from: node.id.clone(),
                    to: target.to_string(),
                });
            }
        }
        Ok(())
    }

    fn reachable_from<'a>(&'a self, start: &'a str) -> HashSet<&'a str> {
        let mut reachable = HashSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !reachable.insert(current) {
                continue;
            }
            if let Some(node) = self.node(current) {
                stack.extend(node.edges());
            }
        }
        reachable
    }

    fn validate_buffer(&self, phase: Phase) -> Result<(), GraphError> {
        let in_zone = |node: &Node| node.phase == Some(phase);
        if !self.nodes.iter().any(in_zone) {
            return Err(GraphError::EmptyBufferZone(phase));
        }
        let mut has_entry = false;
        let mut has_exit = false;
        for node in &self.nodes {
            for target in node.edges() {
                let target_phase = self.phase_of(target);
                if target_phase == Some(phase) && !in_zone(node) {
                    has_entry = true;
                }
                if in_zone(node) && target_phase != Some(phase) {
                    has_exit = true;
                }
            }
        }
        if !has_entry {
            return Err(GraphError::SealedBufferEntry(phase));
        }
        if !has_exit {
            return Err(GraphError::SealedBufferExit(phase));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CRISIS_CHECK_NODE_ID, CRISIS_NODE_ID};

    #[test]
    fn bundled_campaign_validates() {
        let graph = EventGraph::standard().unwrap();
        assert!(graph.node(graph.start()).is_some());
        assert!(graph.node(CRISIS_NODE_ID).is_some());
        assert!(graph.node(CRISIS_CHECK_NODE_ID).is_some_and(Node::is_check));
        assert!(graph.len() >= 30);
        assert!(
            graph
                .nodes()
                .filter(|node| node.is_terminal())
                .all(|node| ALLOWED_TERMINALS.contains(&node.id.as_str()))
        );
    }

    #[test]
    fn bundled_conditions_are_all_known() {
        let graph = EventGraph::standard().unwrap();
        for node in graph.nodes() {
            if let NodeKind::Choice { options } = &node.kind {
                for option in options {
                    if let Some(condition) = &option.condition {
                        assert!(condition.is_known(), "{}: {condition}", option.id);
                    }
                }
            }
        }
    }

    #[test]
    fn check_edges_list_success_first() {
        let node: Node = serde_json::from_value(serde_json::json!({
            "id": "c",
            "meta": {"location": "hanzhong"},
            "node_type": "check",
            "check": "supply_harass",
            "success_next": "a",
            "fail_next": "b"
        }))
        .unwrap();
        assert_eq!(node.edges().as_slice(), &["a", "b"]);
        let half: Node = serde_json::from_value(serde_json::json!({
            "id": "c",
            "meta": {"location": "hanzhong"},
            "node_type": "check",
            "check": "supply_harass",
            "fail_next": "b"
        }))
        .unwrap();
        assert_eq!(half.edges().as_slice(), &["b"]);
    }
}
