use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};

/// How the same-provenance walk expands its worklist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceWalk {
    /// Every visited node enqueues its neighbours; the entry match only
    /// decides visibility. Reaches matches behind non-matching hops.
    #[default]
    Transitive,
    /// Only matching nodes enqueue their neighbours.
    MatchedOnly,
}

/// Engine settings. Every field has a default, so a partial JSON document
/// (or `{}`) is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether nodes without neighbours show up in whole-graph views.
    pub orphan_node_visibility: bool,
    /// Global "draw links" flag handed to rendering.
    pub link_visibility: bool,
    /// Minimum selection size for the intersection variants (>= 1).
    pub min_mutual_selection: usize,
    pub provenance_walk: ProvenanceWalk,
    /// Feature used to colour nodes until the user picks another.
    pub default_color_scheme: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            orphan_node_visibility: true,
            link_visibility: true,
            min_mutual_selection: 2,
            provenance_walk: ProvenanceWalk::Transitive,
            default_color_scheme: "component".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> FilterResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| FilterError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FilterResult<()> {
        if self.min_mutual_selection == 0 {
            return Err(FilterError::InvalidConfig(
                "min_mutual_selection must be at least 1".to_string(),
            ));
        }
        if self.default_color_scheme.trim().is_empty() {
            return Err(FilterError::InvalidConfig(
                "default_color_scheme must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = EngineConfig::default();
        assert!(c.orphan_node_visibility);
        assert!(c.link_visibility);
        assert_eq!(c.min_mutual_selection, 2);
        assert_eq!(c.provenance_walk, ProvenanceWalk::Transitive);
        assert_eq!(c.default_color_scheme, "component");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let c = EngineConfig::from_json(
            r#"{"orphan_node_visibility": false, "provenance_walk": "matched_only"}"#,
        )
        .unwrap();
        assert!(!c.orphan_node_visibility);
        assert_eq!(c.provenance_walk, ProvenanceWalk::MatchedOnly);
        assert_eq!(c.min_mutual_selection, 2);
    }

    #[test]
    fn test_rejects_zero_min_selection() {
        let err = EngineConfig::from_json(r#"{"min_mutual_selection": 0}"#).unwrap_err();
        assert!(matches!(err, FilterError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_blank_color_scheme() {
        let err = EngineConfig::from_json(r#"{"default_color_scheme": "  "}"#).unwrap_err();
        assert!(matches!(err, FilterError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(FilterError::InvalidConfig(_))
        ));
    }
}
