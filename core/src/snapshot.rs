//! Dataset records handed over by the upstream graph builder.
//!
//! Adjacency, component membership and provenance arrive precomputed; this
//! crate only resolves ids into the arena (see [`crate::GraphModel`]).

use serde::{Deserialize, Serialize};

use crate::error::FilterResult;
use crate::model::{ComponentId, EntryId, NodeId};

/// One node as produced by the graph builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(default)]
    pub label: String,
    /// Feature (column) the node's label was taken from.
    #[serde(default)]
    pub feature: String,
    #[serde(default)]
    pub neighbours: Vec<NodeId>,
    #[serde(default)]
    pub entries: Vec<EntryId>,
    pub component: ComponentId,
}

/// An undirected link between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source: NodeId,
    pub target: NodeId,
}

/// A precomputed connected component and the provenance it aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: ComponentId,
    #[serde(default)]
    pub entries: Vec<EntryId>,
}

/// A complete dataset: what [`crate::GraphModel::from_snapshot`] consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

impl GraphSnapshot {
    /// Parse a snapshot from its JSON form.
    pub fn from_json(json: &str) -> FilterResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> FilterResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_snapshot() {
        let snap = GraphSnapshot::from_json(
            r#"{
                "nodes": [
                    {"id": 1, "neighbours": [2], "entries": ["e1"], "component": 0},
                    {"id": 2, "label": "acme", "feature": "company",
                     "neighbours": [1], "component": 0}
                ],
                "links": [{"source": 1, "target": 2}],
                "components": [{"id": 0, "entries": ["e1"]}]
            }"#,
        )
        .unwrap();

        assert_eq!(snap.nodes.len(), 2);
        assert_eq!(snap.nodes[0].label, "");
        assert_eq!(snap.nodes[1].feature, "company");
        assert!(snap.nodes[1].entries.is_empty());
        assert_eq!(snap.links, vec![LinkRecord { source: 1, target: 2 }]);
        assert_eq!(snap.components[0].entries, vec!["e1".to_string()]);
    }

    #[test]
    fn test_parse_rejects_missing_component() {
        let err = GraphSnapshot::from_json(r#"{"nodes": [{"id": 1}]}"#).unwrap_err();
        assert!(matches!(err, crate::FilterError::InvalidSnapshot(_)));
    }

    #[test]
    fn test_json_roundtrip_preserves_empty_graph() {
        let snap = GraphSnapshot::default();
        let back = GraphSnapshot::from_json(&snap.to_json().unwrap()).unwrap();
        assert_eq!(back, snap);
    }
}
