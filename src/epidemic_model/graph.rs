use {
    std::cell::OnceCell,
    net_ensembles::Graph,
    rand::{Rng, SeedableRng},
    rand_distr::{Distribution, Normal, Poisson},
    rand_pcg::Pcg64,
    crate::{error::*, misc_types::rng_from_seed},
    super::*,
};

pub type PopulationTopology = Graph<NodeState>;

/// Lazily filled node lists, valid until `reset_cached_values`
#[derive(Clone, Default)]
struct NodeListCache{
    infected: OnceCell<Vec<NodeId>>,
    clear: OnceCell<Vec<NodeId>>,
    immune: OnceCell<Vec<NodeId>>,
    alive: OnceCell<Vec<NodeId>>,
    dead: OnceCell<Vec<NodeId>>,
    isolated: OnceCell<Vec<NodeId>>,
    masked: OnceCell<Vec<NodeId>>,
}

/// Contact network of the population together with the true
/// health of every node.
///
/// The `current_*_nodes` lists are cached. Whoever mutates nodes has to call
/// [`PopulationGraph::reset_cached_values`] before relying on fresh lists.
#[derive(Clone)]
pub struct PopulationGraph{
    topology: PopulationTopology,
    /// community index of each node
    communities: Vec<usize>,
    considered_immune_threshold: f64,
    rng: Pcg64,
    cache: NodeListCache,
}

impl PopulationGraph{
    /// Random partition graph: community sizes are Poisson distributed around a
    /// normally jittered mean, nodes are connected with `p_in` inside their community
    /// and with `p_out` across communities
    pub fn generate(options: &GraphOptions) -> Result<Self>
    {
        options.validate()?;
        let mut rng = rng_from_seed(options.seed);
        let sizes = community_sizes(options, &mut rng)?;

        let communities: Vec<usize> = sizes.iter()
            .enumerate()
            .flat_map(|(community, &size)| std::iter::repeat(community).take(size))
            .collect();
        let n = communities.len();

        let mut topology = PopulationTopology::new(n);
        for i in 0..n{
            for j in i+1..n{
                let p = if communities[i] == communities[j]{
                    options.p_in
                } else {
                    options.p_out
                };
                if rng.gen::<f64>() < p{
                    topology.add_edge(i, j)
                        .map_err(|e| EpidemicError::Topology(i, j, format!("{e:?}")))?;
                }
            }
        }
        tracing::debug!(
            "generated population of {} nodes in {} communities with {} edges",
            n,
            sizes.len(),
            topology.edge_count()
        );

        Ok(Self{
            topology,
            communities,
            considered_immune_threshold: options.considered_immune_threshold,
            rng,
            cache: NodeListCache::default()
        })
    }

    pub fn reseed(&mut self, rng: &mut Pcg64)
    {
        self.rng = Pcg64::seed_from_u64(rng.gen());
    }

    pub fn reset_cached_values(&mut self)
    {
        self.cache = NodeListCache::default();
    }

    pub fn topology(&self) -> &PopulationTopology
    {
        &self.topology
    }

    pub fn node(&self, id: NodeId) -> &NodeState
    {
        self.topology.at(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeState
    {
        self.topology.at_mut(id)
    }

    /// Mutable access to all current neighbours of `id`
    pub fn neighbours_mut(&mut self, id: NodeId) -> impl Iterator<Item = &mut NodeState>
    {
        self.topology
            .contained_iter_neighbors_mut_with_index(id)
            .map(|(_, neighbour)| neighbour)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeState>
    {
        self.topology.contained_iter()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut NodeState>
    {
        self.topology.contained_iter_mut()
    }

    pub fn neighbours(&self, id: NodeId) -> Vec<NodeId>
    {
        self.topology
            .contained_iter_neighbors_with_index(id)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn vertex_count(&self) -> usize
    {
        self.topology.vertex_count()
    }

    pub fn edge_count(&self) -> usize
    {
        self.topology.edge_count()
    }

    pub fn community_of(&self, id: NodeId) -> usize
    {
        self.communities[id]
    }

    pub fn community_count(&self) -> usize
    {
        self.communities.last().map_or(0, |&c| c + 1)
    }

    pub fn considered_immune_threshold(&self) -> f64
    {
        self.considered_immune_threshold
    }

    /// All edges as ordered pairs `[i, j]` with `i < j`
    pub fn edges(&self) -> Vec<[NodeId; 2]>
    {
        let mut vec = Vec::with_capacity(self.edge_count());
        for j in 0..self.vertex_count(){
            for (n_index, _) in self.topology.contained_iter_neighbors_with_index(j){
                if j < n_index{
                    vec.push([j, n_index]);
                }
            }
        }
        vec.sort_unstable();
        vec
    }

    fn filter_nodes<F>(&self, filter: F) -> Vec<NodeId>
    where F: Fn(&NodeState) -> bool
    {
        self.topology
            .contained_iter()
            .enumerate()
            .filter(|(_, node)| filter(node))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn current_infected_nodes(&self) -> &[NodeId]
    {
        self.cache.infected.get_or_init(|| self.filter_nodes(NodeState::is_infected))
    }

    pub fn current_clear_nodes(&self) -> &[NodeId]
    {
        self.cache.clear.get_or_init(|| self.filter_nodes(NodeState::is_clear))
    }

    pub fn current_immune_nodes(&self) -> &[NodeId]
    {
        let threshold = self.considered_immune_threshold;
        self.cache.immune.get_or_init(|| self.filter_nodes(|node| node.is_immune(threshold)))
    }

    pub fn current_alive_nodes(&self) -> &[NodeId]
    {
        self.cache.alive.get_or_init(|| self.filter_nodes(|node| node.alive))
    }

    pub fn current_dead_nodes(&self) -> &[NodeId]
    {
        self.cache.dead.get_or_init(|| self.filter_nodes(|node| !node.alive))
    }

    pub fn current_isolated_nodes(&self) -> &[NodeId]
    {
        self.cache.isolated.get_or_init(|| self.filter_nodes(NodeState::is_isolated))
    }

    pub fn current_masked_nodes(&self) -> &[NodeId]
    {
        self.cache.masked.get_or_init(|| self.filter_nodes(NodeState::is_masked))
    }

    /// Removes every current edge of `id` with probability `effectiveness`.
    /// The removed edges are remembered on the node, so isolating an
    /// isolated node again cuts further into what is left.
    ///
    /// Returns the number of removed edges
    pub fn isolate_node(&mut self, id: NodeId, effectiveness: f64) -> Result<usize>
    {
        let neighbours = self.neighbours(id);
        let mut removed = Vec::new();
        for other in neighbours{
            if self.rng.gen::<f64>() < effectiveness{
                self.topology.remove_edge(id, other)
                    .map_err(|e| EpidemicError::Topology(id, other, format!("{e:?}")))?;
                removed.push(other);
            }
        }
        let count = removed.len();
        let node = self.topology.at_mut(id);
        node.removed_edges.append(&mut removed);
        node.isolated = true;
        Ok(count)
    }

    /// Restores each edge removed by isolation with probability `effectiveness`.
    /// The node stays isolated until all of them are back.
    ///
    /// Returns the number of restored edges
    pub fn reconnect_node(&mut self, id: NodeId, effectiveness: f64) -> Result<usize>
    {
        let removed = std::mem::take(&mut self.topology.at_mut(id).removed_edges);
        let mut still_removed = Vec::new();
        let mut restored = 0;
        for other in removed{
            if self.rng.gen::<f64>() < effectiveness{
                // the edge might have been restored through the other node already
                let connected = self.topology
                    .contained_iter_neighbors_with_index(id)
                    .any(|(index, _)| index == other);
                if !connected{
                    self.topology.add_edge(id, other)
                        .map_err(|e| EpidemicError::Topology(id, other, format!("{e:?}")))?;
                }
                restored += 1;
            } else {
                still_removed.push(other);
            }
        }
        let node = self.topology.at_mut(id);
        node.isolated = !still_removed.is_empty();
        node.removed_edges = still_removed;
        Ok(restored)
    }

    pub fn mask_node(&mut self, id: NodeId, protection: f64)
    {
        self.topology.at_mut(id).mask = protection;
    }

    pub fn unmask_node(&mut self, id: NodeId)
    {
        self.topology.at_mut(id).mask = 0.0;
    }
}

fn community_sizes(options: &GraphOptions, rng: &mut Pcg64) -> Result<Vec<usize>>
{
    let jitter = Normal::new(options.community_size_mean, options.community_size_std)
        .map_err(|e| EpidemicError::InvalidOption{
            name: "community_size_std",
            reason: e.to_string()
        })?;
    let mut sizes = Vec::with_capacity(options.community_n);
    for _ in 0..options.community_n{
        let mean: f64 = jitter.sample(rng);
        let poisson = Poisson::new(mean.max(1.0))
            .map_err(|e| EpidemicError::InvalidOption{
                name: "community_size_mean",
                reason: e.to_string()
            })?;
        let size: f64 = poisson.sample(rng);
        sizes.push((size as usize).max(1));
    }
    Ok(sizes)
}

impl HealthView for PopulationGraph{
    fn infected_nodes(&self) -> &[NodeId]
    {
        self.current_infected_nodes()
    }

    fn clear_nodes(&self) -> &[NodeId]
    {
        self.current_clear_nodes()
    }

    fn immune_nodes(&self) -> &[NodeId]
    {
        self.current_immune_nodes()
    }

    fn alive_nodes(&self) -> &[NodeId]
    {
        self.current_alive_nodes()
    }

    fn dead_nodes(&self) -> &[NodeId]
    {
        self.current_dead_nodes()
    }

    fn isolated_nodes(&self) -> &[NodeId]
    {
        self.current_isolated_nodes()
    }

    fn masked_nodes(&self) -> &[NodeId]
    {
        self.current_masked_nodes()
    }

    fn degree(&self, node: NodeId) -> usize
    {
        self.topology.degree(node).unwrap_or(0)
    }

    fn population_size(&self) -> usize
    {
        self.vertex_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(seed: Option<u64>) -> GraphOptions
    {
        GraphOptions{
            community_n: 5,
            community_size_mean: 10.0,
            community_size_std: 1.0,
            p_in: 0.5,
            p_out: 0.05,
            considered_immune_threshold: 0.3,
            seed
        }
    }

    /// a node with at least `min` edges
    fn well_connected(graph: &PopulationGraph, min: usize) -> NodeId
    {
        (0..graph.vertex_count())
            .max_by_key(|&i| graph.degree(i))
            .filter(|&i| graph.degree(i) >= min)
            .expect("graph too sparse for test")
    }

    #[test]
    fn same_seed_same_edges() {
        let a = PopulationGraph::generate(&options(Some(42))).unwrap();
        let b = PopulationGraph::generate(&options(Some(42))).unwrap();
        assert_eq!(a.vertex_count(), b.vertex_count());
        assert_eq!(a.edges(), b.edges());

        let c = PopulationGraph::generate(&options(Some(43))).unwrap();
        assert_ne!(a.edges(), c.edges());
    }

    #[test]
    fn unseeded_graphs_differ() {
        let a = PopulationGraph::generate(&options(None)).unwrap();
        let b = PopulationGraph::generate(&options(None)).unwrap();
        assert!(a.vertex_count() != b.vertex_count() || a.edges() != b.edges());
    }

    #[test]
    fn fresh_nodes_are_healthy() {
        let graph = PopulationGraph::generate(&options(Some(1))).unwrap();
        assert_eq!(graph.community_count(), 5);
        assert_eq!(graph.current_clear_nodes().len(), graph.vertex_count());
        assert_eq!(graph.current_alive_nodes().len(), graph.vertex_count());
        assert!(graph.current_infected_nodes().is_empty());
        assert!(graph.current_dead_nodes().is_empty());
        assert!(graph.current_immune_nodes().is_empty());
    }

    #[test]
    fn cache_is_kept_until_reset() {
        let mut graph = PopulationGraph::generate(&options(Some(2))).unwrap();
        assert!(graph.current_infected_nodes().is_empty());
        graph.node_mut(3).infected = 1;
        assert!(graph.current_infected_nodes().is_empty());
        graph.reset_cached_values();
        assert_eq!(graph.current_infected_nodes(), &[3]);
        assert!(!graph.current_clear_nodes().contains(&3));
    }

    #[test]
    fn immune_list_respects_threshold() {
        let mut graph = PopulationGraph::generate(&options(Some(2))).unwrap();
        graph.node_mut(0).immune = 0.9;
        graph.node_mut(1).immune = 0.1;
        graph.reset_cached_values();
        assert_eq!(graph.current_immune_nodes(), &[0]);
    }

    #[test]
    fn full_isolation_round_trip() {
        let mut graph = PopulationGraph::generate(&options(Some(3))).unwrap();
        let id = well_connected(&graph, 2);
        let original = graph.neighbours(id);
        let edges = graph.edge_count();

        let removed = graph.isolate_node(id, 1.0).unwrap();
        assert_eq!(removed, original.len());
        assert_eq!(graph.degree(id), 0);
        assert!(graph.node(id).isolated);
        graph.reset_cached_values();
        assert_eq!(graph.current_isolated_nodes(), &[id]);

        graph.reconnect_node(id, 1.0).unwrap();
        let mut restored = graph.neighbours(id);
        restored.sort_unstable();
        let mut expected = original;
        expected.sort_unstable();
        assert_eq!(restored, expected);
        assert_eq!(graph.edge_count(), edges);
        assert!(!graph.node(id).isolated);
    }

    #[test]
    fn partial_reconnection_converges() {
        let mut graph = PopulationGraph::generate(&options(Some(4))).unwrap();
        let id = well_connected(&graph, 3);
        let edges = graph.edge_count();

        graph.isolate_node(id, 0.1).unwrap();
        graph.isolate_node(id, 0.1).unwrap();
        for _ in 0..200{
            graph.reconnect_node(id, 0.7).unwrap();
        }
        assert_eq!(graph.edge_count(), edges);
        assert!(!graph.node(id).isolated);
        assert!(graph.node(id).removed_edges.is_empty());
    }

    #[test]
    fn partial_reconnection_keeps_node_isolated() {
        let mut graph = PopulationGraph::generate(&GraphOptions{
            community_n: 3,
            community_size_mean: 20.0,
            p_in: 0.9,
            ..options(Some(6))
        }).unwrap();
        let id = well_connected(&graph, 12);
        let degree = graph.degree(id);

        graph.isolate_node(id, 1.0).unwrap();
        let restored = graph.reconnect_node(id, 0.3).unwrap();
        let node = graph.node(id);
        assert!(node.isolated);
        assert!(!node.removed_edges.is_empty());
        assert!(graph.degree(id) > 0);
        assert_eq!(graph.degree(id), restored);
        assert_eq!(restored + node.removed_edges.len(), degree);
        graph.reset_cached_values();
        assert!(graph.current_isolated_nodes().contains(&id));
    }

    #[test]
    fn repeated_isolation_compounds() {
        let mut graph = PopulationGraph::generate(&options(Some(5))).unwrap();
        let id = well_connected(&graph, 2);
        let degree = graph.degree(id);
        let first = graph.isolate_node(id, 0.5).unwrap();
        let second = graph.isolate_node(id, 1.0).unwrap();
        assert_eq!(first + second, degree);
        assert_eq!(graph.node(id).removed_edges.len(), degree);
        assert_eq!(graph.degree(id), 0);
    }

    #[test]
    fn masks_do_not_touch_edges() {
        let mut graph = PopulationGraph::generate(&options(Some(6))).unwrap();
        let edges = graph.edge_count();
        graph.mask_node(2, 0.4);
        graph.reset_cached_values();
        assert_eq!(graph.current_masked_nodes(), &[2]);
        assert_eq!(graph.node(2).mask, 0.4);
        graph.unmask_node(2);
        graph.reset_cached_values();
        assert!(graph.current_masked_nodes().is_empty());
        assert_eq!(graph.edge_count(), edges);
    }
}
