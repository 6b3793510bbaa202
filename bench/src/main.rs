use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::time::Instant;

use graph_filter_core::{
    CategoricalColorAssigner, ComponentId, ComponentRecord, EngineConfig, FilterResult,
    GraphModel, GraphSnapshot, GraphView, InMemoryEngine, LinkRecord, NodeId, NodeRecord,
    PendingOrigin, SelectionSet, SelectionSource, TableRow, TableRows, ALL_COMPONENTS,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mode = args.get(1).map(|s| s.as_str()).unwrap_or("all");
    let node_count: u64 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(200_000)
        .max(2);

    if mode == "help" || mode == "--help" {
        println!("Usage: graph-filter-bench [mode] [node_count]");
        println!();
        println!("Modes:");
        println!("  all         Run all generators and benchmark each (default)");
        println!("  scalefree   Preferential attachment via edge sampling (hub-and-spoke)");
        println!("  smallworld  Watts-Strogatz ring lattice + shortcuts");
        println!("  random      Erdos-Renyi uniform random edges");
        println!("  barbell     Two dense cliques connected by a thin bridge");
        println!("  islands     Many small disconnected clusters plus orphans");
        println!();
        println!("Default node_count: 200000");
        return;
    }

    let generators: Vec<(&str, fn(u64) -> EdgeList)> = match mode {
        "scalefree" => vec![("Scale-free (edge sampling)", gen_scale_free)],
        "smallworld" => vec![("Small-world (Watts-Strogatz)", gen_small_world)],
        "random" => vec![("Erdos-Renyi random", gen_random)],
        "barbell" => vec![("Barbell (clique-bridge-clique)", gen_barbell)],
        "islands" => vec![("Islands (clusters + orphans)", gen_islands)],
        "all" => vec![
            ("Scale-free (edge sampling)", gen_scale_free as fn(u64) -> EdgeList),
            ("Small-world (Watts-Strogatz)", gen_small_world),
            ("Erdos-Renyi random", gen_random),
            ("Barbell (clique-bridge-clique)", gen_barbell),
            ("Islands (clusters + orphans)", gen_islands),
        ],
        _ => {
            eprintln!("Unknown mode: {}. Use --help for options.", mode);
            return;
        }
    };

    println!("graph-filter-bench");
    println!("==================");
    println!();

    for (name, generator) in generators {
        if let Err(e) = run_benchmark(name, generator, node_count) {
            error!(generator = name, error = %e, "benchmark aborted");
            std::process::exit(1);
        }
    }
}

fn run_benchmark(
    name: &str,
    generator: fn(u64) -> EdgeList,
    node_count: u64,
) -> FilterResult<()> {
    println!("--- {} ---", name);
    println!("Target: {} nodes", node_count);

    let t = Instant::now();
    let edges = generator(node_count);
    let snapshot = build_snapshot(&edges, 42);
    let rows = table_rows(&snapshot);
    let graph = GraphModel::from_snapshot(snapshot)?;
    println!(
        "Built in {:.2}s: {} nodes, {} links, {} components, ~{:.0}MB",
        t.elapsed().as_secs_f64(),
        graph.node_count(),
        graph.link_count(),
        graph.components().len(),
        graph.memory_usage() as f64 / 1_048_576.0
    );

    let hub = pick_hub(&graph);
    let hub_neighbours: Vec<NodeId> = graph
        .neighbour_nodes(graph.index_of(hub)?)
        .take(2)
        .map(|n| n.id)
        .collect();
    let largest_component = largest_component(&graph);

    let config = EngineConfig {
        default_color_scheme: LABEL_FEATURE.to_string(),
        ..EngineConfig::default()
    };
    let mut engine = InMemoryEngine::with_config(
        graph,
        SelectionSet::new(),
        PendingOrigin::new(),
        TableRows::new(rows),
        config,
    );
    engine.origin_source_mut().set(hub);
    for &id in &hub_neighbours {
        engine.selection_mut().toggle_selection(id);
    }

    println!();
    println!("{:<28} {:>12} {:>12} {:>10}", "operation", "nodes", "links", "time");
    println!("{:-<28} {:->12} {:->12} {:->10}", "", "", "", "");

    timed(&mut engine, "direct (from hub)", |e| e.show_direct_from_origin())?;
    timed(&mut engine, "only selected", |e| e.show_only_selected())?;
    timed(&mut engine, "union", |e| e.show_multi(false, false))?;
    if engine.selection().selected_node_ids().len() >= engine.config().min_mutual_selection {
        timed(&mut engine, "intersection", |e| e.show_multi(true, false))?;
        timed(&mut engine, "intersection with origin", |e| e.show_multi(true, true))?;
    }
    timed(&mut engine, "same provenance (origin)", |e| e.show_same_provenance(false))?;
    timed(&mut engine, "same provenance (selected)", |e| e.show_same_provenance(true))?;
    timed(&mut engine, "reset", |e| {
        e.reset();
        Ok(())
    })?;
    timed(&mut engine, "isolate largest component", |e| {
        e.isolate_component(largest_component)
    })?;
    timed(&mut engine, "isolate all", |e| e.isolate_component(ALL_COMPONENTS))?;

    // Distinct label values per feature column, in first-seen order.
    let mut values: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for node in engine.graph().nodes() {
        if seen.insert((node.feature.as_str(), node.label.as_str())) {
            values
                .entry(node.feature.as_str())
                .or_default()
                .push(node.label.as_str());
        }
    }
    let mut colors = CategoricalColorAssigner::from_config(engine.config());
    let t = Instant::now();
    for (feature, labels) in &values {
        colors.assign(labels.as_slice(), feature, GraphView::Overview);
    }
    let assigned = colors
        .selected_colors(GraphView::Overview)
        .map_or(0, |m| m.len());
    println!(
        "{:<28} {:>12} {:>12} {:>8.1}ms",
        "color assignment",
        assigned,
        "-",
        t.elapsed().as_secs_f64() * 1000.0
    );
    println!();

    info!(generator = name, "benchmark finished");
    Ok(())
}

fn timed<F>(engine: &mut InMemoryEngine, label: &str, op: F) -> FilterResult<()>
where
    F: FnOnce(&mut InMemoryEngine) -> FilterResult<()>,
{
    let t = Instant::now();
    op(engine)?;
    let elapsed = t.elapsed();
    println!(
        "{:<28} {:>12} {:>12} {:>8.1}ms",
        label,
        engine.graph().visible_node_count(),
        engine.graph().visible_link_count(),
        elapsed.as_secs_f64() * 1000.0
    );
    Ok(())
}

/// Highest-degree node; ties broken by id.
fn pick_hub(graph: &GraphModel) -> NodeId {
    graph
        .nodes()
        .iter()
        .max_by(|a, b| {
            a.neighbours
                .len()
                .cmp(&b.neighbours.len())
                .then(b.id.cmp(&a.id))
        })
        .map(|n| n.id)
        .unwrap_or(0)
}

fn largest_component(graph: &GraphModel) -> ComponentId {
    let mut sizes: HashMap<ComponentId, usize> = HashMap::new();
    for node in graph.nodes() {
        *sizes.entry(node.component).or_default() += 1;
    }
    sizes
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(id, _)| id)
        .unwrap_or(ALL_COMPONENTS)
}

// ---------------------------------------------------------------------------
// Snapshot construction. Stands in for the upstream graph builder:
// adjacency, component labels and provenance entries.
// ---------------------------------------------------------------------------

/// Feature column every generated label is taken from.
const LABEL_FEATURE: &str = "label";

/// Generated topology: node count, labels and undirected edges.
struct EdgeList {
    node_count: u64,
    labels: Vec<&'static str>,
    edges: Vec<(u64, u64)>,
}

impl EdgeList {
    fn new(node_count: u64) -> Self {
        Self {
            node_count,
            labels: vec!["Concept"; node_count as usize],
            edges: Vec::new(),
        }
    }

    fn add(&mut self, a: u64, b: u64) {
        if a != b {
            self.edges.push((a, b));
        }
    }
}

fn build_snapshot(list: &EdgeList, seed: u64) -> GraphSnapshot {
    let n = list.node_count as usize;
    let mut rng = FastRng::new(seed);

    let mut adjacency: Vec<Vec<NodeId>> = vec![Vec::new(); n];
    let mut seen: HashSet<(u64, u64)> = HashSet::with_capacity(list.edges.len());
    let mut links = Vec::with_capacity(list.edges.len());
    for &(a, b) in &list.edges {
        let key = (a.min(b), a.max(b));
        if seen.insert(key) {
            adjacency[a as usize].push(b);
            adjacency[b as usize].push(a);
            links.push(LinkRecord {
                source: a,
                target: b,
            });
        }
    }

    // Component labelling by BFS, ids in discovery order.
    let mut component_of: Vec<ComponentId> = vec![-1; n];
    let mut next_component: ComponentId = 0;
    for start in 0..n {
        if component_of[start] >= 0 {
            continue;
        }
        component_of[start] = next_component;
        let mut queue: VecDeque<usize> = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &nb in &adjacency[current] {
                if component_of[nb as usize] < 0 {
                    component_of[nb as usize] = next_component;
                    queue.push_back(nb as usize);
                }
            }
        }
        next_component += 1;
    }

    // Each node comes from one or two source records out of a shared pool.
    let pool = (list.node_count / 4).max(1);
    let mut component_entries: Vec<Vec<String>> = vec![Vec::new(); next_component as usize];
    let nodes: Vec<NodeRecord> = (0..n)
        .map(|i| {
            let mut entries = vec![format!("rec_{}", rng.next(pool))];
            if rng.next(4) == 0 {
                entries.push(format!("rec_{}", rng.next(pool)));
            }
            component_entries[component_of[i] as usize].extend(entries.iter().cloned());
            NodeRecord {
                id: i as NodeId,
                label: list.labels[i].to_string(),
                feature: LABEL_FEATURE.to_string(),
                neighbours: std::mem::take(&mut adjacency[i]),
                entries,
                component: component_of[i],
            }
        })
        .collect();

    let components = component_entries
        .into_iter()
        .enumerate()
        .map(|(id, mut entries)| {
            entries.sort();
            entries.dedup();
            ComponentRecord {
                id: id as ComponentId,
                entries,
            }
        })
        .collect();

    GraphSnapshot {
        nodes,
        links,
        components,
    }
}

fn table_rows(snapshot: &GraphSnapshot) -> Vec<TableRow> {
    let mut entries: Vec<&String> = snapshot.nodes.iter().flat_map(|n| n.entries.iter()).collect();
    entries.sort();
    entries.dedup();
    entries
        .into_iter()
        .map(|e| TableRow {
            entry: e.clone(),
            fields: Default::default(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Generators: O(n + edges), single-threaded, deterministic
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Scale-free via edge-list sampling (O(edges), not O(n²)).
///
/// Preferential attachment by picking a random existing edge and connecting
/// to one of its endpoints. Nodes with more edges are more likely to be picked.
fn gen_scale_free(node_count: u64) -> EdgeList {
    let edges_per_node = 4u64;
    let mut list = EdgeList::new(node_count);
    let mut rng = FastRng::new(12345);

    let mut edge_endpoints: Vec<u64> =
        Vec::with_capacity((node_count * edges_per_node * 2) as usize);

    // Seed: small clique
    let seed = 5u64.min(node_count);
    for i in 0..seed {
        for j in (i + 1)..seed {
            list.add(i, j);
            edge_endpoints.push(i);
            edge_endpoints.push(j);
        }
    }

    for new_node in seed..node_count {
        let attach = edges_per_node.min(new_node);
        for _ in 0..attach {
            let idx = rng.next(edge_endpoints.len() as u64) as usize;
            let target = edge_endpoints[idx];
            if target != new_node {
                list.add(new_node, target);
                edge_endpoints.push(new_node);
                edge_endpoints.push(target);
            }
        }
    }

    list
}

/// Small-world (Watts-Strogatz): ring lattice + random rewiring.
fn gen_small_world(node_count: u64) -> EdgeList {
    let k = 4u64;
    let p = 0.05f64;
    let mut list = EdgeList::new(node_count);
    let mut rng = FastRng::new(67890);

    for i in 0..node_count {
        for j in 1..=k {
            let neighbor = (i + j) % node_count;
            if rng.next_f64() < p {
                let rewired = rng.next(node_count);
                list.add(i, if rewired != i { rewired } else { neighbor });
            } else {
                list.add(i, neighbor);
            }
        }
    }

    list
}

/// Erdos-Renyi: ~4 uniform random edges per node, no structure. Leaves a
/// few orphans at this density.
fn gen_random(node_count: u64) -> EdgeList {
    let mut list = EdgeList::new(node_count);
    let mut rng = FastRng::new(54321);

    for _ in 0..node_count * 2 {
        let from = rng.next(node_count);
        let to = rng.next(node_count);
        list.add(from, to);
    }

    list
}

/// Barbell: two dense clusters joined by a chain of bridge nodes.
fn gen_barbell(node_count: u64) -> EdgeList {
    let bridge_len = 10u64.min(node_count / 2);
    let clique_size = (node_count - bridge_len) / 2;
    let mut list = EdgeList::new(node_count);
    let mut rng = FastRng::new(99999);

    if clique_size < 2 {
        return list;
    }

    for i in 0..clique_size {
        list.labels[i as usize] = "ClusterA";
        for _ in 0..8u64.min(clique_size - 1) {
            list.add(i, rng.next(clique_size));
        }
    }

    let bridge_start = clique_size;
    for i in 0..bridge_len {
        let id = bridge_start + i;
        list.labels[id as usize] = "Bridge";
        list.add(id - 1, id);
    }

    let b_start = bridge_start + bridge_len;
    list.add(b_start - 1, b_start);
    for i in 0..clique_size {
        list.labels[(b_start + i) as usize] = "ClusterB";
        for _ in 0..8u64.min(clique_size - 1) {
            list.add(b_start + i, b_start + rng.next(clique_size));
        }
    }

    list
}

/// Many small clusters (3–12 nodes, chain plus a few chords) with every
/// twentieth node left as an orphan. Exercises component isolation.
fn gen_islands(node_count: u64) -> EdgeList {
    let mut list = EdgeList::new(node_count);
    let mut rng = FastRng::new(77777);

    let mut next: u64 = 0;
    while next < node_count {
        if next % 20 == 0 {
            list.labels[next as usize] = "Orphan";
            next += 1;
            continue;
        }
        let size = (3 + rng.next(10)).min(node_count - next);
        for i in 1..size {
            list.add(next + i - 1, next + i);
        }
        for _ in 0..size / 3 {
            list.add(next + rng.next(size), next + rng.next(size));
        }
        next += size;
    }

    list
}
