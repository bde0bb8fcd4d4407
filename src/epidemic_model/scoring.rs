use {
    serde::{Serialize, Deserialize},
    super::*,
};

/// Parts of a turn score, kept apart for logging
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct TurnScore{
    /// reward for contacts of nodes that are not infected
    pub connectivity_yield: f64,
    pub infection_penalty: f64,
    pub death_penalty: f64,
    pub action_cost: f64,
}

impl TurnScore{
    pub fn total(&self) -> f64
    {
        self.connectivity_yield - self.infection_penalty - self.death_penalty - self.action_cost
    }
}

#[derive(Clone, Debug)]
pub struct Scoring{
    options: ScoringOptions,
}

impl Scoring{
    pub fn new(options: &ScoringOptions) -> Self
    {
        Self{options: options.clone()}
    }

    /// Scores one turn on any view of the population: the true graph
    /// for the real score or the observation space for what an agent sees
    pub fn score_turn<V>(&self, view: &V, action_cost: f64) -> TurnScore
    where V: HealthView
    {
        let infected = view.infected_nodes();
        let connections: usize = view.alive_nodes()
            .iter()
            .filter(|&&id| infected.binary_search(&id).is_err())
            .map(|&id| view.degree(id))
            .sum();
        TurnScore{
            connectivity_yield: self.options.yield_per_connection * connections as f64,
            infection_penalty: self.options.infection_penalty * infected.len() as f64,
            death_penalty: self.options.death_penalty * view.dead_nodes().len() as f64,
            action_cost: self.options.action_cost_weight * action_cost,
        }
    }
}
