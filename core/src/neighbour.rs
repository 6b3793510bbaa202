use std::collections::HashSet;

use crate::error::FilterResult;
use crate::model::{GraphModel, NodeId};

/// Rule deciding whether a node counts as a neighbour of a candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighbourRule {
    /// Adjacent to the origin and to at least one candidate.
    AnchoredToOrigin(NodeId),
    /// Adjacent to at least `n` candidates. `None` (or `Some(0)`) means
    /// every candidate.
    CountThreshold(Option<usize>),
}

/// Is `node_id` a qualifying neighbour of `candidates` under `rule`?
///
/// Fails with `NodeNotFound` if `node_id` does not resolve. An empty
/// candidate set never qualifies.
pub fn is_qualifying_neighbour(
    graph: &GraphModel,
    node_id: NodeId,
    candidates: &[NodeId],
    rule: NeighbourRule,
) -> FilterResult<bool> {
    let node = graph.find_node(node_id)?;

    match rule {
        NeighbourRule::AnchoredToOrigin(origin) => Ok(node.neighbours.contains(&origin)
            && candidates.iter().any(|c| node.neighbours.contains(c))),
        NeighbourRule::CountThreshold(threshold) => {
            let candidate_set: HashSet<NodeId> = candidates.iter().copied().collect();
            let needed = threshold
                .filter(|&t| t > 0)
                .unwrap_or(candidate_set.len());
            if needed == 0 {
                return Ok(false);
            }

            let mut count = 0;
            for nb in &node.neighbours {
                if candidate_set.contains(nb) {
                    count += 1;
                    if count == needed {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        }
    }
}

/// For each selected node (in selection order), the neighbours that are not
/// selected themselves and that are adjacent to both `origin` and some other
/// selected node. The origin's own group is empty.
pub fn mutual_neighbours_anchored_to_origin(
    graph: &GraphModel,
    selected: &[NodeId],
    origin: NodeId,
) -> FilterResult<Vec<Vec<NodeId>>> {
    let selected_set: HashSet<NodeId> = selected.iter().copied().collect();
    let without_origin: Vec<NodeId> = selected.iter().copied().filter(|&id| id != origin).collect();

    selected
        .iter()
        .map(|&id| {
            if id == origin {
                return Ok(Vec::new());
            }
            neighbour_group(graph, id, &selected_set, |nb| {
                is_qualifying_neighbour(
                    graph,
                    nb,
                    &without_origin,
                    NeighbourRule::AnchoredToOrigin(origin),
                )
            })
        })
        .collect()
}

/// For each selected node (in selection order), the unselected neighbours
/// adjacent to at least two selected nodes.
pub fn mutual_neighbours(
    graph: &GraphModel,
    selected: &[NodeId],
) -> FilterResult<Vec<Vec<NodeId>>> {
    let selected_set: HashSet<NodeId> = selected.iter().copied().collect();

    selected
        .iter()
        .map(|&id| {
            neighbour_group(graph, id, &selected_set, |nb| {
                is_qualifying_neighbour(graph, nb, selected, NeighbourRule::CountThreshold(Some(2)))
            })
        })
        .collect()
}

/// Neighbours of `id` outside `exclude` that pass `qualifies`.
fn neighbour_group<F>(
    graph: &GraphModel,
    id: NodeId,
    exclude: &HashSet<NodeId>,
    mut qualifies: F,
) -> FilterResult<Vec<NodeId>>
where
    F: FnMut(NodeId) -> FilterResult<bool>,
{
    let node = graph.find_node(id)?;
    let mut group = Vec::new();
    for &nb in &node.neighbours {
        if !exclude.contains(&nb) && qualifies(nb)? {
            group.push(nb);
        }
    }
    Ok(group)
}
