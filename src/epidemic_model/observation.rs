use {
    std::cell::OnceCell,
    serde::{Serialize, Deserialize},
    rand::Rng,
    rand_pcg::Pcg64,
    crate::{error::*, misc_types::rng_from_seed},
    super::*,
};

#[derive(Clone, Default)]
struct KnownListCache{
    infected: OnceCell<Vec<NodeId>>,
    clear: OnceCell<Vec<NodeId>>,
    immune: OnceCell<Vec<NodeId>>,
    alive: OnceCell<Vec<NodeId>>,
    dead: OnceCell<Vec<NodeId>>,
    isolated: OnceCell<Vec<NodeId>>,
    masked: OnceCell<Vec<NodeId>>,
    unknown: OnceCell<Vec<NodeId>>,
}

/// Partial observability on top of the [`PopulationGraph`].
///
/// A randomized testing process decides which nodes have their true health
/// revealed. The `current_*_nodes` lists only contain what is known, unless
/// `test_rate >= 1` in which case they are the true lists.
#[derive(Clone)]
pub struct ObservationSpace{
    graph: PopulationGraph,
    test_rate: f64,
    test_validity_period: usize,
    rng: Pcg64,
    cache: KnownListCache,
}

impl ObservationSpace{
    pub fn new(graph: PopulationGraph, options: &ObservationOptions) -> Result<Self>
    {
        options.validate()?;
        Ok(Self{
            graph,
            test_rate: options.test_rate,
            test_validity_period: options.test_validity_period,
            rng: rng_from_seed(options.seed),
            cache: KnownListCache::default()
        })
    }

    pub fn graph(&self) -> &PopulationGraph
    {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut PopulationGraph
    {
        &mut self.graph
    }

    pub fn test_rate(&self) -> f64
    {
        self.test_rate
    }

    pub fn test_validity_period(&self) -> usize
    {
        self.test_validity_period
    }

    pub fn has_full_information(&self) -> bool
    {
        self.test_rate >= 1.0
    }

    /// Resets the known lists together with the lists of the graph
    pub fn reset_cached_values(&mut self)
    {
        self.cache = KnownListCache::default();
        self.graph.reset_cached_values();
    }

    /// Tests clear nodes with probability `test_rate / 2` and infected nodes
    /// with probability `2 * test_rate`. Nodes already known to be infected
    /// are tested every step.
    ///
    /// Returns the number of tests
    pub fn test_population(&mut self, step: usize) -> usize
    {
        let clear_chance = (self.test_rate / 2.0).min(1.0);
        let infected_chance = (self.test_rate * 2.0).min(1.0);
        let clear = self.graph.current_clear_nodes().to_vec();
        let infected = self.graph.current_infected_nodes().to_vec();

        let mut tests = 0;
        for id in clear{
            if self.rng.gen::<f64>() < clear_chance{
                self.graph.node_mut(id).last_tested = Some(step);
                tests += 1;
            }
        }
        for id in infected{
            let known = self.graph.node(id).status.infected();
            if known || self.rng.gen::<f64>() < infected_chance{
                self.graph.node_mut(id).last_tested = Some(step);
                tests += 1;
            }
        }
        tests
    }

    /// Turns this step's test results into observed statuses and expires
    /// outdated negative results. Deaths are always observed.
    ///
    /// Returns the number of nodes newly known to be infected
    pub fn update_observed_statuses(&mut self, step: usize) -> usize
    {
        let threshold = self.graph.considered_immune_threshold();
        let validity = self.test_validity_period;
        let mut known_new_infections = 0;

        for node in self.graph.nodes_mut(){
            if !node.alive{
                node.status.set(StatusChange::Alive(false));
                continue;
            }
            if node.was_tested_at(step){
                if node.infected > 0{
                    if !node.status.infected(){
                        known_new_infections += 1;
                    }
                    node.status.set(StatusChange::Infected(true));
                } else {
                    node.status.set(StatusChange::Clear(true));
                    node.status.set(StatusChange::Immune(node.is_immune(threshold)));
                }
            } else if let Some(last) = node.last_tested{
                let expired = step.saturating_sub(last) > validity;
                if expired && (node.status.clear() || node.status.immune()){
                    node.status.reset_to_unknown();
                }
            }
            node.status.set(StatusChange::Isolated(node.isolated));
        }
        known_new_infections
    }

    fn filter_status<F>(&self, filter: F) -> Vec<NodeId>
    where F: Fn(&NodeState) -> bool
    {
        self.graph
            .nodes()
            .enumerate()
            .filter(|(_, node)| filter(node))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn current_infected_nodes(&self) -> &[NodeId]
    {
        if self.has_full_information(){
            return self.graph.current_infected_nodes();
        }
        self.cache.infected.get_or_init(
            || self.filter_status(|node| node.status.alive() && node.status.infected())
        )
    }

    pub fn current_clear_nodes(&self) -> &[NodeId]
    {
        if self.has_full_information(){
            return self.graph.current_clear_nodes();
        }
        self.cache.clear.get_or_init(|| self.filter_status(|node| node.status.clear()))
    }

    pub fn current_immune_nodes(&self) -> &[NodeId]
    {
        if self.has_full_information(){
            return self.graph.current_immune_nodes();
        }
        self.cache.immune.get_or_init(|| self.filter_status(|node| node.status.immune()))
    }

    pub fn current_alive_nodes(&self) -> &[NodeId]
    {
        if self.has_full_information(){
            return self.graph.current_alive_nodes();
        }
        self.cache.alive.get_or_init(|| self.filter_status(|node| node.status.alive()))
    }

    pub fn current_dead_nodes(&self) -> &[NodeId]
    {
        if self.has_full_information(){
            return self.graph.current_dead_nodes();
        }
        self.cache.dead.get_or_init(|| self.filter_status(|node| !node.status.alive()))
    }

    pub fn current_isolated_nodes(&self) -> &[NodeId]
    {
        if self.has_full_information(){
            return self.graph.current_isolated_nodes();
        }
        self.cache.isolated.get_or_init(|| self.filter_status(|node| node.status.isolated()))
    }

    /// Masks are handed out by the agent, so they are always known
    pub fn current_masked_nodes(&self) -> &[NodeId]
    {
        self.graph.current_masked_nodes()
    }

    /// Alive nodes of which neither infection nor a negative test is known
    pub fn current_unknown_nodes(&self) -> &[NodeId]
    {
        if self.has_full_information(){
            return &[];
        }
        self.cache.unknown.get_or_init(|| self.filter_status(|node| node.status.is_unknown()))
    }

    pub fn snapshot(&self) -> ObservationSnapshot
    {
        ObservationSnapshot{
            infected: self.current_infected_nodes().to_vec(),
            clear: self.current_clear_nodes().to_vec(),
            immune: self.current_immune_nodes().to_vec(),
            dead: self.current_dead_nodes().to_vec(),
            isolated: self.current_isolated_nodes().to_vec(),
            masked: self.current_masked_nodes().to_vec(),
            unknown: self.current_unknown_nodes().to_vec(),
        }
    }
}

impl HealthView for ObservationSpace{
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
        self.graph.degree(node)
    }

    fn population_size(&self) -> usize
    {
        self.graph.vertex_count()
    }
}

/// Owned copy of the known node lists at the end of a step
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ObservationSnapshot{
    pub infected: Vec<NodeId>,
    pub clear: Vec<NodeId>,
    pub immune: Vec<NodeId>,
    pub dead: Vec<NodeId>,
    pub isolated: Vec<NodeId>,
    pub masked: Vec<NodeId>,
    pub unknown: Vec<NodeId>,
}
