use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;

use tracing::{debug, info, warn};

use crate::collaborators::{OriginSource, RowFilter, SelectionSource, TableView};
use crate::config::{EngineConfig, ProvenanceWalk};
use crate::error::{FilterError, FilterResult};
use crate::model::{ComponentId, EntryId, GraphModel, Link, Node, NodeId, NodeIndex};
use crate::neighbour::{mutual_neighbours, mutual_neighbours_anchored_to_origin};

/// Component sentinel meaning "no component isolated, show all".
pub const ALL_COMPONENTS: ComponentId = -1;

/// Why the current visible subset was chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SelfCentricMode {
    #[default]
    None,
    Direct,
    Intersection,
    Union,
    OriginIntersection,
    OnlySelected,
    SameEntry,
    SelectedComponent,
}

impl SelfCentricMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SelfCentricMode::None => "none",
            SelfCentricMode::Direct => "direct",
            SelfCentricMode::Intersection => "intersection",
            SelfCentricMode::Union => "union",
            SelfCentricMode::OriginIntersection => "origin_union",
            SelfCentricMode::OnlySelected => "only_selected_nodes",
            SelfCentricMode::SameEntry => "same_entry",
            SelfCentricMode::SelectedComponent => "selected_component",
        }
    }
}

impl fmt::Display for SelfCentricMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine call that produced a [`VisibilityChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadDataset,
    Reset,
    ShowOnlySelected,
    ShowDirectFromOrigin,
    ShowMulti { only_mutual: bool, mutual_with_origin: bool },
    ShowSameProvenance { with_selected_nodes: bool },
    IsolateComponent(ComponentId),
    OrphanPolicy(bool),
    LinkVisibility(bool),
}

/// Summary handed to observers after each completed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityChange {
    pub operation: Operation,
    pub mode: SelfCentricMode,
    pub self_centric: bool,
    pub visible_nodes: usize,
    pub visible_links: usize,
}

/// Notified once per completed operation, after every flag is written.
pub trait VisibilityObserver {
    fn visibility_changed(&mut self, graph: &GraphModel, change: &VisibilityChange);
}

impl<F> VisibilityObserver for F
where
    F: FnMut(&GraphModel, &VisibilityChange),
{
    fn visibility_changed(&mut self, graph: &GraphModel, change: &VisibilityChange) {
        self(graph, change)
    }
}

/// Read-only snapshot of the engine's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineState {
    pub self_centric: bool,
    pub mode: SelfCentricMode,
    pub origin: Option<NodeId>,
    pub orphan_node_visibility: bool,
    pub link_visibility: bool,
    pub visible_component: ComponentId,
}

/// Per-node and per-link flags computed before anything is written.
struct VisibilityPlan {
    nodes: Vec<bool>,
    links: Vec<bool>,
}

impl VisibilityPlan {
    /// Nodes from a predicate, links from the resulting node flags.
    fn build<N, L>(graph: &GraphModel, node_rule: N, link_rule: L) -> Self
    where
        N: Fn(NodeIndex, &Node) -> bool,
        L: Fn(&Link, &[bool]) -> bool,
    {
        let nodes: Vec<bool> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(idx, node)| node_rule(idx, node))
            .collect();
        let links = graph.links().iter().map(|l| link_rule(l, &nodes)).collect();
        Self { nodes, links }
    }
}

fn both_endpoints(link: &Link, nodes: &[bool]) -> bool {
    let (s, t) = link.endpoints();
    nodes[s] && nodes[t]
}

/// Computes which nodes and links are visible for each selection gesture
/// and tracks the self-centric mode that explains the current subset.
///
/// Owns the dataset for the purpose of `visible` mutation. Selection,
/// pending origin and table view are injected collaborators.
pub struct VisibilityFilterEngine<S, O, T> {
    graph: GraphModel,
    selection: S,
    origin_source: O,
    table: T,
    config: EngineConfig,
    self_centric: bool,
    mode: SelfCentricMode,
    origin: Option<NodeIndex>,
    orphan_node_visibility: bool,
    link_visibility: bool,
    visible_component: ComponentId,
    observers: Vec<Box<dyn VisibilityObserver>>,
}

impl<S, O, T> VisibilityFilterEngine<S, O, T>
where
    S: SelectionSource,
    O: OriginSource,
    T: TableView,
{
    pub fn new(graph: GraphModel, selection: S, origin_source: O, table: T) -> Self {
        Self::with_config(graph, selection, origin_source, table, EngineConfig::default())
    }

    /// Build an engine and apply the default whole-graph view.
    pub fn with_config(
        graph: GraphModel,
        selection: S,
        origin_source: O,
        table: T,
        config: EngineConfig,
    ) -> Self {
        let mut engine = Self {
            graph,
            selection,
            origin_source,
            table,
            orphan_node_visibility: config.orphan_node_visibility,
            link_visibility: config.link_visibility,
            config,
            self_centric: false,
            mode: SelfCentricMode::None,
            origin: None,
            visible_component: ALL_COMPONENTS,
            observers: Vec::new(),
        };
        let plan = engine.default_plan(None);
        engine.graph.apply_visibility(&plan.nodes, &plan.links);
        engine
    }

    pub fn subscribe(&mut self, observer: Box<dyn VisibilityObserver>) {
        self.observers.push(observer);
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn selection(&self) -> &S {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut S {
        &mut self.selection
    }

    pub fn origin_source(&self) -> &O {
        &self.origin_source
    }

    pub fn origin_source_mut(&mut self) -> &mut O {
        &mut self.origin_source
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_self_centric(&self) -> bool {
        self.self_centric
    }

    pub fn mode(&self) -> SelfCentricMode {
        self.mode
    }

    pub fn origin_node(&self) -> Option<&Node> {
        self.origin.map(|idx| self.graph.node_at(idx))
    }

    pub fn visible_component(&self) -> ComponentId {
        self.visible_component
    }

    pub fn link_visibility(&self) -> bool {
        self.link_visibility
    }

    pub fn orphan_node_visibility(&self) -> bool {
        self.orphan_node_visibility
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            self_centric: self.self_centric,
            mode: self.mode,
            origin: self.origin_node().map(|n| n.id),
            orphan_node_visibility: self.orphan_node_visibility,
            link_visibility: self.link_visibility,
            visible_component: self.visible_component,
        }
    }

    // ---------------------------------------------------------------------
    // Dataset lifecycle
    // ---------------------------------------------------------------------

    /// Replace the dataset and return the engine to its initial state.
    /// Selected ids and a pending origin missing from the new dataset are
    /// dropped from their collaborators.
    pub fn load_dataset(&mut self, graph: GraphModel) {
        self.graph = graph;
        self.prune_stale_references();
        self.self_centric = false;
        self.mode = SelfCentricMode::None;
        self.origin = None;
        self.visible_component = ALL_COMPONENTS;
        self.table.set_visible_rows(RowFilter::All);

        let plan = self.default_plan(None);
        self.graph.apply_visibility(&plan.nodes, &plan.links);
        info!(
            nodes = self.graph.node_count(),
            links = self.graph.link_count(),
            "dataset loaded"
        );
        self.finish(Operation::LoadDataset);
    }

    // ---------------------------------------------------------------------
    // Filter operations
    // ---------------------------------------------------------------------

    /// Leave self-centric mode: everything visible, orphans per policy.
    /// No-op when no self-centric filter is active.
    ///
    /// The component axis is not restored: `visible_component` and the
    /// table's row filter keep whatever `isolate_component` last set.
    pub fn reset(&mut self) {
        if !self.self_centric {
            return;
        }

        let plan = self.default_plan(None);
        self.graph.apply_visibility(&plan.nodes, &plan.links);
        self.origin = None;
        self.self_centric = false;
        self.mode = SelfCentricMode::None;
        self.finish(Operation::Reset);
    }

    /// Show the selected nodes and the links between them.
    pub fn show_only_selected(&mut self) -> FilterResult<()> {
        let selected = self.resolve_selection()?;
        let selected_set: HashSet<NodeIndex> = selected.iter().copied().collect();

        let plan = VisibilityPlan::build(
            &self.graph,
            |idx, _| selected_set.contains(&idx),
            both_endpoints,
        );

        self.commit(&selected, plan, SelfCentricMode::OnlySelected);
        self.finish(Operation::ShowOnlySelected);
        Ok(())
    }

    /// Show the origin and its direct neighbours. Adopts the pending origin
    /// when none is set, and makes sure the origin is selected.
    pub fn show_direct_from_origin(&mut self) -> FilterResult<()> {
        let (origin, adopted) = match self.origin {
            Some(idx) => (idx, false),
            None => {
                let Some(id) = self.origin_source.pending_origin_node() else {
                    warn!("direct view requested with no origin available");
                    return Err(FilterError::MissingOrigin);
                };
                (self.graph.index_of(id)?, true)
            }
        };
        let mut selected = self.resolve_selection()?;

        let origin_node = self.graph.node_at(origin);
        let origin_id = origin_node.id;
        let plan = VisibilityPlan::build(
            &self.graph,
            |idx, node| idx == origin || origin_node.neighbours.contains(&node.id),
            |link, _| link.touches(origin_id),
        );

        if !selected.contains(&origin) {
            self.selection.toggle_selection(origin_id);
            selected.push(origin);
        }
        self.origin = Some(origin);
        self.commit(&selected, plan, SelfCentricMode::Direct);
        if adopted {
            self.origin_source.dismiss();
        }
        self.finish(Operation::ShowDirectFromOrigin);
        Ok(())
    }

    /// Union or intersection view over the current selection.
    ///
    /// - `only_mutual = false`: every neighbour of any selected node.
    /// - `only_mutual = true`: neighbours adjacent to at least two selected
    ///   nodes, or with `mutual_with_origin`, adjacent to the origin and to
    ///   another selected node.
    pub fn show_multi(&mut self, only_mutual: bool, mutual_with_origin: bool) -> FilterResult<()> {
        let selected = self.resolve_selection()?;
        let selected_ids: Vec<NodeId> =
            selected.iter().map(|&i| self.graph.node_at(i).id).collect();

        if only_mutual && selected_ids.len() < self.config.min_mutual_selection {
            warn!(
                selected = selected_ids.len(),
                required = self.config.min_mutual_selection,
                "intersection view needs more selected nodes"
            );
            return Err(FilterError::InsufficientSelection {
                required: self.config.min_mutual_selection,
                selected: selected_ids.len(),
            });
        }

        let groups: Vec<Vec<NodeId>> = match (only_mutual, mutual_with_origin) {
            (true, true) => {
                let origin = self.origin_node().ok_or(FilterError::MissingOrigin)?.id;
                mutual_neighbours_anchored_to_origin(&self.graph, &selected_ids, origin)?
            }
            (true, false) => mutual_neighbours(&self.graph, &selected_ids)?,
            (false, _) => selected
                .iter()
                .map(|&i| self.graph.node_at(i).neighbours.iter().copied().collect())
                .collect(),
        };

        let main: HashSet<NodeId> = selected_ids.iter().copied().collect();
        let extra: HashSet<NodeId> = groups.into_iter().flatten().collect();

        let plan = VisibilityPlan::build(
            &self.graph,
            |_, node| main.contains(&node.id) || extra.contains(&node.id),
            |link, _| {
                let source_main = main.contains(&link.source);
                let target_main = main.contains(&link.target);
                if only_mutual {
                    let touches_extra =
                        extra.contains(&link.source) || extra.contains(&link.target);
                    ((source_main || target_main) && touches_extra) || (source_main && target_main)
                } else {
                    source_main || target_main
                }
            },
        );

        let mode = match (only_mutual, mutual_with_origin) {
            (true, true) => SelfCentricMode::OriginIntersection,
            (true, false) => SelfCentricMode::Intersection,
            (false, _) => SelfCentricMode::Union,
        };
        self.commit(&selected, plan, mode);
        self.finish(Operation::ShowMulti {
            only_mutual,
            mutual_with_origin,
        });
        Ok(())
    }

    /// Flood outward from the seed (selection or origin) and show every
    /// reached node sharing a provenance entry with the seed.
    ///
    /// The target entries are fixed from the seed; the worklist grows as
    /// nodes are visited and is deduplicated on enqueue.
    pub fn show_same_provenance(&mut self, with_selected_nodes: bool) -> FilterResult<()> {
        let selected = self.resolve_selection()?;
        let seed: Vec<NodeIndex> = if with_selected_nodes {
            selected.clone()
        } else {
            match self.origin {
                Some(origin) => vec![origin],
                None => {
                    warn!("same-provenance view requested with no origin set");
                    return Err(FilterError::MissingOrigin);
                }
            }
        };

        let reached = self.walk_same_provenance(&seed);
        let plan =
            VisibilityPlan::build(&self.graph, |idx, _| reached.contains(&idx), both_endpoints);

        self.commit(&selected, plan, SelfCentricMode::SameEntry);
        self.finish(Operation::ShowSameProvenance { with_selected_nodes });
        Ok(())
    }

    /// Show a single component (or all with [`ALL_COMPONENTS`]) and narrow
    /// the table view to its rows. Independent of the self-centric mode.
    pub fn isolate_component(&mut self, component_id: ComponentId) -> FilterResult<()> {
        let plan = if component_id == ALL_COMPONENTS {
            self.table.set_visible_rows(RowFilter::All);
            self.default_plan(None)
        } else {
            let entries: BTreeSet<EntryId> =
                self.graph.find_component(component_id)?.entries.clone();
            self.table.set_visible_rows(RowFilter::Entries(&entries));
            self.default_plan(Some(component_id))
        };

        self.graph.apply_visibility(&plan.nodes, &plan.links);
        self.visible_component = component_id;
        self.finish(Operation::IsolateComponent(component_id));
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Display policies
    // ---------------------------------------------------------------------

    /// Change the orphan policy. Re-applied at once unless a self-centric
    /// filter currently decides visibility.
    pub fn set_orphan_node_visibility(&mut self, visible: bool) {
        self.orphan_node_visibility = visible;
        if !self.self_centric {
            let component =
                (self.visible_component != ALL_COMPONENTS).then_some(self.visible_component);
            self.graph.apply_orphan_visibility(visible, component);
        }
        self.finish(Operation::OrphanPolicy(visible));
    }

    pub fn toggle_orphan_node_visibility(&mut self) {
        self.set_orphan_node_visibility(!self.orphan_node_visibility);
    }

    /// Global "draw links" flag; per-link flags are untouched.
    pub fn set_link_visibility(&mut self, visible: bool) {
        self.link_visibility = visible;
        self.finish(Operation::LinkVisibility(visible));
    }

    pub fn toggle_link_visibility(&mut self) {
        self.set_link_visibility(!self.link_visibility);
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn prune_stale_references(&mut self) {
        let stale: Vec<NodeId> = self
            .selection
            .selected_node_ids()
            .into_iter()
            .filter(|&id| self.graph.index_of(id).is_err())
            .collect();
        if !stale.is_empty() {
            warn!(?stale, "deselecting nodes missing from the new dataset");
        }
        for id in stale {
            self.selection.toggle_selection(id);
        }

        if let Some(pending) = self.origin_source.pending_origin_node() {
            if self.graph.index_of(pending).is_err() {
                warn!(pending, "dismissing pending origin missing from the new dataset");
                self.origin_source.dismiss();
            }
        }
    }

    fn resolve_selection(&self) -> FilterResult<Vec<NodeIndex>> {
        self.selection
            .selected_node_ids()
            .into_iter()
            .map(|id| self.graph.index_of(id))
            .collect()
    }

    /// Whole-graph view, optionally restricted to one component. Orphans
    /// follow the policy; links need both endpoints visible.
    fn default_plan(&self, component: Option<ComponentId>) -> VisibilityPlan {
        let orphans = self.orphan_node_visibility;
        match component {
            None => VisibilityPlan {
                nodes: self
                    .graph
                    .nodes()
                    .iter()
                    .map(|n| !n.is_orphan() || orphans)
                    .collect(),
                links: vec![true; self.graph.link_count()],
            },
            Some(c) => VisibilityPlan::build(
                &self.graph,
                |_, n| n.component == c && (!n.is_orphan() || orphans),
                both_endpoints,
            ),
        }
    }

    fn walk_same_provenance(&self, seed: &[NodeIndex]) -> HashSet<NodeIndex> {
        let target: BTreeSet<EntryId> = seed
            .iter()
            .flat_map(|&idx| self.graph.node_at(idx).entries.iter().cloned())
            .collect();

        let mut reached: HashSet<NodeIndex> = seed.iter().copied().collect();
        let mut queued: HashSet<NodeIndex> = HashSet::new();
        let mut worklist: VecDeque<NodeIndex> = VecDeque::new();
        for &idx in seed {
            for &nb in self.graph.node_at(idx).neighbour_objects() {
                if queued.insert(nb) {
                    worklist.push_back(nb);
                }
            }
        }

        let transitive = self.config.provenance_walk == ProvenanceWalk::Transitive;
        while let Some(current) = worklist.pop_front() {
            let node = self.graph.node_at(current);
            let matched = node.shares_entry_with(&target);
            if matched {
                reached.insert(current);
            }
            if matched || transitive {
                for &nb in node.neighbour_objects() {
                    if queued.insert(nb) {
                        worklist.push_back(nb);
                    }
                }
            }
        }

        reached
    }

    fn commit(&mut self, selected: &[NodeIndex], plan: VisibilityPlan, mode: SelfCentricMode) {
        self.graph.mirror_selection(selected);
        self.graph.apply_visibility(&plan.nodes, &plan.links);
        self.self_centric = true;
        self.mode = mode;
    }

    fn finish(&mut self, operation: Operation) {
        let change = VisibilityChange {
            operation,
            mode: self.mode,
            self_centric: self.self_centric,
            visible_nodes: self.graph.visible_node_count(),
            visible_links: self.graph.visible_link_count(),
        };
        debug!(
            ?operation,
            mode = %change.mode,
            visible_nodes = change.visible_nodes,
            visible_links = change.visible_links,
            "visibility updated"
        );
        self.notify_change(&change);
    }

    fn notify_change(&mut self, change: &VisibilityChange) {
        for observer in self.observers.iter_mut() {
            observer.visibility_changed(&self.graph, change);
        }
    }
}
