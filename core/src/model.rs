use std::collections::{BTreeSet, HashMap};

use tracing::info;

use crate::error::{FilterError, FilterResult};
use crate::snapshot::GraphSnapshot;

/// Stable node identifier assigned by the graph builder.
pub type NodeId = u64;

/// Precomputed connected-component identifier.
pub type ComponentId = i64;

/// Provenance identifier: the source record a node was derived from.
pub type EntryId = String;

/// Position of a node inside the model's arena. Only meaningful for the
/// model it came from; a dataset replacement invalidates every index.
pub type NodeIndex = usize;

/// A graph node plus its cached adjacency and provenance.
///
/// `neighbours` holds ids; `neighbour_objects` holds the same relation as
/// arena indices so traversals never need an id lookup per hop. Both are
/// non-owning.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub feature: String,
    pub neighbours: BTreeSet<NodeId>,
    pub entries: BTreeSet<EntryId>,
    pub component: ComponentId,
    pub(crate) neighbour_objects: Vec<NodeIndex>,
    pub(crate) selected: bool,
    pub(crate) visible: bool,
}

impl Node {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Mirror of the selection collaborator's state, refreshed by every
    /// engine operation.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// A node with no neighbours at all.
    pub fn is_orphan(&self) -> bool {
        self.neighbours.is_empty()
    }

    pub fn neighbour_objects(&self) -> &[NodeIndex] {
        &self.neighbour_objects
    }

    /// True if this node shares at least one provenance entry with `entries`.
    pub fn shares_entry_with(&self, entries: &BTreeSet<EntryId>) -> bool {
        self.entries.iter().any(|e| entries.contains(e))
    }
}

/// An undirected link. Endpoints always resolve (checked on load).
#[derive(Debug, Clone)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    pub(crate) source_index: NodeIndex,
    pub(crate) target_index: NodeIndex,
    pub(crate) visible: bool,
}

impl Link {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True if either endpoint is `id`.
    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }

    pub fn endpoints(&self) -> (NodeIndex, NodeIndex) {
        (self.source_index, self.target_index)
    }
}

/// A precomputed connected component.
#[derive(Debug, Clone)]
pub struct Component {
    pub id: ComponentId,
    pub entries: BTreeSet<EntryId>,
}

/// In-memory dataset: node arena + id index, links and components.
///
/// Built once per loaded dataset and replaced wholesale when the dataset
/// changes. Only the filtering engine writes `visible` (crate-private).
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    links: Vec<Link>,
    components: Vec<Component>,
    node_index: HashMap<NodeId, NodeIndex>,
    component_index: HashMap<ComponentId, usize>,
}

impl GraphModel {
    /// Build the arena from a snapshot, resolving every neighbour id and
    /// link endpoint. Fails on the first id that does not resolve.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> FilterResult<Self> {
        let GraphSnapshot {
            nodes: node_records,
            links: link_records,
            components: component_records,
        } = snapshot;

        let mut node_index = HashMap::with_capacity(node_records.len());
        for (idx, record) in node_records.iter().enumerate() {
            if node_index.insert(record.id, idx).is_some() {
                return Err(FilterError::DuplicateNode(record.id));
            }
        }

        let mut nodes = Vec::with_capacity(node_records.len());
        for record in node_records {
            let neighbours: BTreeSet<NodeId> = record.neighbours.into_iter().collect();
            let neighbour_objects = neighbours
                .iter()
                .map(|nb| {
                    node_index
                        .get(nb)
                        .copied()
                        .ok_or(FilterError::NodeNotFound(*nb))
                })
                .collect::<FilterResult<Vec<_>>>()?;

            nodes.push(Node {
                id: record.id,
                label: record.label,
                feature: record.feature,
                neighbours,
                entries: record.entries.into_iter().collect(),
                component: record.component,
                neighbour_objects,
                selected: false,
                visible: true,
            });
        }

        let mut links = Vec::with_capacity(link_records.len());
        for record in link_records {
            let (source_index, target_index) = match (
                node_index.get(&record.source),
                node_index.get(&record.target),
            ) {
                (Some(&s), Some(&t)) => (s, t),
                _ => {
                    return Err(FilterError::DanglingLink {
                        from: record.source,
                        to: record.target,
                    })
                }
            };
            links.push(Link {
                source: record.source,
                target: record.target,
                source_index,
                target_index,
                visible: true,
            });
        }

        let mut component_index = HashMap::with_capacity(component_records.len());
        let components: Vec<Component> = component_records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| {
                component_index.insert(record.id, idx);
                Component {
                    id: record.id,
                    entries: record.entries.into_iter().collect(),
                }
            })
            .collect();

        info!(
            nodes = nodes.len(),
            links = links.len(),
            components = components.len(),
            "graph model built"
        );

        Ok(Self {
            nodes,
            links,
            components,
            node_index,
            component_index,
        })
    }

    /// Parse and build in one step.
    pub fn from_json(json: &str) -> FilterResult<Self> {
        Self::from_snapshot(GraphSnapshot::from_json(json)?)
    }

    /// Resolve a node id to its arena index.
    pub fn index_of(&self, id: NodeId) -> FilterResult<NodeIndex> {
        self.node_index
            .get(&id)
            .copied()
            .ok_or(FilterError::NodeNotFound(id))
    }

    pub fn find_node(&self, id: NodeId) -> FilterResult<&Node> {
        self.index_of(id).map(|idx| &self.nodes[idx])
    }

    pub fn find_component(&self, id: ComponentId) -> FilterResult<&Component> {
        self.component_index
            .get(&id)
            .map(|&idx| &self.components[idx])
            .ok_or(FilterError::ComponentNotFound(id))
    }

    /// Node at an arena index obtained from this model.
    pub fn node_at(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Iterate the node objects adjacent to `idx`.
    pub fn neighbour_nodes(&self, idx: NodeIndex) -> impl Iterator<Item = &Node> {
        self.nodes[idx]
            .neighbour_objects
            .iter()
            .map(move |&nb| &self.nodes[nb])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Ids of currently visible nodes, in arena order.
    pub fn visible_node_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.visible)
            .map(|n| n.id)
            .collect()
    }

    pub fn visible_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.visible).count()
    }

    pub fn visible_link_count(&self) -> usize {
        self.links.iter().filter(|l| l.visible).count()
    }

    /// Overwrite every node and link flag in one pass. Both slices must be
    /// arena-sized; the engine builds them from this model.
    pub(crate) fn apply_visibility(&mut self, nodes: &[bool], links: &[bool]) {
        debug_assert_eq!(nodes.len(), self.nodes.len());
        debug_assert_eq!(links.len(), self.links.len());

        for (node, &visible) in self.nodes.iter_mut().zip(nodes) {
            node.visible = visible;
        }
        for (link, &visible) in self.links.iter_mut().zip(links) {
            link.visible = visible;
        }
    }

    /// Set the orphan nodes' flag only, leaving everything else alone.
    pub(crate) fn apply_orphan_visibility(
        &mut self,
        visible: bool,
        component: Option<ComponentId>,
    ) {
        for node in self.nodes.iter_mut().filter(|n| n.is_orphan()) {
            if component.map_or(true, |c| node.component == c) {
                node.visible = visible;
            }
        }
    }

    /// Mirror the selection collaborator's state onto the nodes.
    pub(crate) fn mirror_selection(&mut self, selected: &[NodeIndex]) {
        for node in self.nodes.iter_mut() {
            node.selected = false;
        }
        for &idx in selected {
            self.nodes[idx].selected = true;
        }
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let nodes_mem: usize = self
            .nodes
            .iter()
            .map(|n| {
                size_of::<Node>()
                    + n.label.len()
                    + n.feature.len()
                    + n.neighbours.len() * (size_of::<NodeId>() + size_of::<NodeIndex>() + 16)
                    + n.entries.iter().map(|e| e.len() + 24).sum::<usize>()
            })
            .sum();
        let links_mem = self.links.len() * size_of::<Link>();
        let index_mem = self.node_index.len() * (size_of::<NodeId>() + size_of::<NodeIndex>() + 8);

        nodes_mem + links_mem + index_mem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ComponentRecord, LinkRecord, NodeRecord};

    fn node(id: NodeId, neighbours: &[NodeId], component: ComponentId) -> NodeRecord {
        NodeRecord {
            id,
            neighbours: neighbours.to_vec(),
            entries: vec![format!("e{}", id)],
            component,
            ..Default::default()
        }
    }

    fn pair_with_orphan() -> GraphSnapshot {
        GraphSnapshot {
            nodes: vec![node(1, &[2], 0), node(2, &[1], 0), node(3, &[], 1)],
            links: vec![LinkRecord { source: 1, target: 2 }],
            components: vec![
                ComponentRecord { id: 0, entries: vec!["e1".into(), "e2".into()] },
                ComponentRecord { id: 1, entries: vec!["e3".into()] },
            ],
        }
    }

    #[test]
    fn test_build_resolves_neighbour_objects() {
        let g = GraphModel::from_snapshot(pair_with_orphan()).unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.link_count(), 1);

        let idx = g.index_of(1).unwrap();
        let nbs: Vec<NodeId> = g.neighbour_nodes(idx).map(|n| n.id).collect();
        assert_eq!(nbs, vec![2]);
        assert!(g.find_node(3).unwrap().is_orphan());
        assert!(!g.find_node(1).unwrap().is_orphan());
    }

    #[test]
    fn test_find_node_not_found() {
        let g = GraphModel::from_snapshot(pair_with_orphan()).unwrap();
        assert!(matches!(g.find_node(99), Err(FilterError::NodeNotFound(99))));
    }

    #[test]
    fn test_find_component() {
        let g = GraphModel::from_snapshot(pair_with_orphan()).unwrap();
        let c = g.find_component(0).unwrap();
        assert!(c.entries.contains("e2"));
        assert!(matches!(
            g.find_component(5),
            Err(FilterError::ComponentNotFound(5))
        ));
    }

    #[test]
    fn test_dangling_link_rejected() {
        let mut snap = pair_with_orphan();
        snap.links.push(LinkRecord { source: 1, target: 42 });
        let err = GraphModel::from_snapshot(snap).unwrap_err();
        assert!(matches!(err, FilterError::DanglingLink { from: 1, to: 42 }));
    }

    #[test]
    fn test_unresolved_neighbour_rejected() {
        let mut snap = pair_with_orphan();
        snap.nodes[2].neighbours.push(77);
        let err = GraphModel::from_snapshot(snap).unwrap_err();
        assert!(matches!(err, FilterError::NodeNotFound(77)));
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut snap = pair_with_orphan();
        snap.nodes.push(node(2, &[], 0));
        assert!(matches!(
            GraphModel::from_snapshot(snap),
            Err(FilterError::DuplicateNode(2))
        ));
    }

    #[test]
    fn test_duplicate_neighbour_ids_collapse() {
        let mut snap = pair_with_orphan();
        snap.nodes[0].neighbours = vec![2, 2, 2];
        let g = GraphModel::from_snapshot(snap).unwrap();
        let n = g.find_node(1).unwrap();
        assert_eq!(n.neighbours.len(), 1);
        assert_eq!(n.neighbour_objects().len(), 1);
    }

    #[test]
    fn test_apply_visibility_overwrites_everything() {
        let mut g = GraphModel::from_snapshot(pair_with_orphan()).unwrap();
        g.apply_visibility(&[false, true, false], &[false]);
        assert_eq!(g.visible_node_ids(), vec![2]);
        assert_eq!(g.visible_link_count(), 0);
    }

    #[test]
    fn test_orphan_visibility_scoped_to_component() {
        let mut g = GraphModel::from_snapshot(pair_with_orphan()).unwrap();
        g.apply_orphan_visibility(false, Some(0));
        assert!(g.find_node(3).unwrap().is_visible());
        g.apply_orphan_visibility(false, None);
        assert!(!g.find_node(3).unwrap().is_visible());
        assert!(g.find_node(1).unwrap().is_visible());
    }

    #[test]
    fn test_from_json() {
        let g = GraphModel::from_json(
            r#"{"nodes": [{"id": 5, "component": 2}], "components": [{"id": 2}]}"#,
        )
        .unwrap();
        assert_eq!(g.find_node(5).unwrap().component, 2);
        assert!(g.memory_usage() > 0);
    }
}
