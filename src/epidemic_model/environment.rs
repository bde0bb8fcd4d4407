use {
    std::collections::BTreeMap,
    serde::{Serialize, Deserialize},
    rand::{Rng, seq::SliceRandom},
    rand_pcg::Pcg64,
    crate::{error::*, misc_types::rng_from_seed},
    super::*,
};

/// What the agent gets to see after a step
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Observation{
    pub known: ObservationSnapshot,
    pub action_costs: BTreeMap<Action, f64>,
    pub actions_completed: BTreeMap<Action, usize>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StepResult{
    pub observation: Observation,
    /// observed score of the turn
    pub reward: f64,
    pub done: bool,
    pub record: StepRecord,
}

#[derive(Clone, Copy, Debug, Default)]
struct Totals{
    infections: usize,
    deaths: usize,
    recoveries: usize,
    known_infections: usize,
    score: f64,
    observed_score: f64,
}

/// One simulation run: owns the population, the disease, the observer
/// and everything that is logged along the way.
///
/// There is no `Clone`: a copy would replay the same random trajectory.
/// Independent runs come from [`Environment::replicate`].
pub struct Environment{
    options: EnvironmentOptions,
    observation: ObservationSpace,
    disease: Disease,
    healthcare: Healthcare,
    actions: ActionSpace,
    scoring: Scoring,
    history: History,
    rng: Pcg64,
    step: usize,
    total_steps: usize,
    totals: Totals,
}

impl Environment{
    /// Without a graph seed one is drawn here, so that replicates
    /// share the topology of their parent
    pub fn new(options: &EnvironmentOptions) -> Result<Self>
    {
        options.validate()?;
        let mut options = options.clone();
        if options.graph.seed.is_none(){
            options.graph.seed = Some(rng_from_seed(None).gen());
        }

        let graph = PopulationGraph::generate(&options.graph)?;
        Ok(Self{
            observation: ObservationSpace::new(graph, &options.observation)?,
            disease: Disease::new(&options.disease)?,
            healthcare: Healthcare::new(&options.healthcare)?,
            actions: ActionSpace::new(&options.actions)?,
            scoring: Scoring::new(&options.scoring),
            history: History::new(),
            rng: rng_from_seed(options.simulation.seed),
            step: 0,
            total_steps: 0,
            totals: Totals::default(),
            options
        })
    }

    /// Fresh environment with the same configuration and population.
    /// Disease, observer, actions and the graph's own generator get new
    /// seeds drawn from `rng`, the seeding of infections keeps its seed
    pub fn replicate(&self, rng: &mut Pcg64) -> Result<Self>
    {
        let mut options = self.options.clone();
        options.disease.seed = Some(rng.gen());
        options.observation.seed = Some(rng.gen());
        options.actions.seed = Some(rng.gen());
        let mut env = Self::new(&options)?;
        env.observation.graph_mut().reseed(rng);
        Ok(env)
    }

    pub fn options(&self) -> &EnvironmentOptions
    {
        &self.options
    }

    pub fn graph(&self) -> &PopulationGraph
    {
        self.observation.graph()
    }

    pub fn observation_space(&self) -> &ObservationSpace
    {
        &self.observation
    }

    pub fn action_space(&mut self) -> &mut ActionSpace
    {
        &mut self.actions
    }

    pub fn history(&self) -> &History
    {
        &self.history
    }

    pub fn into_history(self) -> History
    {
        self.history
    }

    /// number of completed steps
    pub fn current_step(&self) -> usize
    {
        self.step
    }

    pub fn total_steps(&self) -> usize
    {
        self.total_steps
    }

    pub fn is_done(&self) -> bool
    {
        self.step >= self.total_steps
    }

    /// Allows `steps` more calls of [`Environment::step`] before `done` is reported
    pub fn extend_horizon(&mut self, steps: usize)
    {
        self.total_steps += steps;
    }

    fn reset_cached_values(&mut self)
    {
        self.observation.reset_cached_values();
    }

    fn random_clear_node(&mut self) -> Option<NodeId>
    {
        self.observation
            .graph()
            .current_clear_nodes()
            .choose(&mut self.rng)
            .copied()
    }

    fn seed_infections(&mut self) -> usize
    {
        let mut seeded = 0;
        if self.step == 0{
            let chosen: Vec<NodeId> = self.observation
                .graph()
                .current_clear_nodes()
                .choose_multiple(&mut self.rng, self.options.simulation.initial_infections)
                .copied()
                .collect();
            for id in chosen{
                self.disease.force_infect(self.observation.graph_mut().node_mut(id));
                seeded += 1;
            }
            self.reset_cached_values();
        }
        if self.rng.gen::<f64>() < self.options.simulation.random_infection_chance{
            if let Some(id) = self.random_clear_node(){
                self.disease.force_infect(self.observation.graph_mut().node_mut(id));
                seeded += 1;
            }
        }
        seeded
    }

    /// One hop of transmission from every node in `sources`
    fn infect_neighbours(&mut self, sources: &[NodeId]) -> usize
    {
        let mut new_infections = 0;
        for &id in sources{
            let source = self.observation.graph().node(id).clone();
            new_infections += self.disease
                .try_to_infect_multiple(&source, self.observation.graph_mut().neighbours_mut(id))
                .into_iter()
                .filter(|&infected| infected)
                .count();
        }
        new_infections
    }

    /// Advances the simulation by one step after applying `actions` in order.
    ///
    /// Targets are not checked for being sensible, e.g. treating a clear
    /// node just costs the treatment.
    pub fn step(&mut self, actions: &[(Action, NodeId)]) -> Result<StepResult>
    {
        let step = self.step;
        let population = self.observation.graph().vertex_count();
        for &(_, target) in actions{
            if target >= population{
                return Err(EpidemicError::InvalidOption{
                    name: "target",
                    reason: format!("node {target} not in population of {population}")
                });
            }
        }

        self.reset_cached_values();
        let seeded_infections = self.seed_infections();
        self.reset_cached_values();

        let mut record = StepRecord{step, seeded_infections, ..StepRecord::default()};
        let mut action_costs = BTreeMap::new();
        let mut actions_completed = BTreeMap::new();
        for &(action, target) in actions{
            let outcome = self.actions.apply(
                action,
                target,
                step,
                &mut self.disease,
                &mut self.observation
            )?;
            record.action_cost += outcome.cost;
            *action_costs.entry(action).or_insert(0.0) += outcome.cost;
            *actions_completed.entry(action).or_insert(0) += 1;
            match outcome.conclusion{
                Some(Conclusion::Died) => record.deaths += 1,
                Some(Conclusion::Recovered) => record.recoveries += 1,
                _ => ()
            }
        }
        record.actions_taken = actions.len();
        self.reset_cached_values();

        let infected = self.observation.graph().current_infected_nodes().to_vec();
        record.new_infections = self.infect_neighbours(&infected);

        record.healthcare_penalty = self.healthcare
            .recovery_rate_penalty(infected.len() + record.new_infections);
        for id in infected{
            let node = self.observation.graph_mut().node_mut(id);
            match self.disease.conclude(node, 0.0, record.healthcare_penalty){
                Conclusion::Died => record.deaths += 1,
                Conclusion::Recovered => record.recoveries += 1,
                _ => ()
            }
        }
        self.reset_cached_values();

        record.tests = self.observation.test_population(step);
        record.known_new_infections = self.observation.update_observed_statuses(step);
        self.reset_cached_values();

        let immune = self.observation.graph().current_immune_nodes().to_vec();
        for id in immune{
            self.disease.decay_immunity(self.observation.graph_mut().node_mut(id));
        }
        self.reset_cached_values();

        let score = self.scoring.score_turn(self.observation.graph(), record.action_cost);
        let observed_score = self.scoring.score_turn(&self.observation, record.action_cost);

        let totals = &mut self.totals;
        totals.infections += seeded_infections + record.new_infections;
        totals.deaths += record.deaths;
        totals.recoveries += record.recoveries;
        totals.known_infections += record.known_new_infections;
        totals.score += score.total();
        totals.observed_score += observed_score.total();

        let graph = self.observation.graph();
        let alive = graph.current_alive_nodes().len().max(1) as f64;
        record.total_infections = totals.infections;
        record.total_deaths = totals.deaths;
        record.total_recoveries = totals.recoveries;
        record.known_total_infections = totals.known_infections;
        record.current_infected = graph.current_infected_nodes().len();
        record.current_clear = graph.current_clear_nodes().len();
        record.current_immune = graph.current_immune_nodes().len();
        record.current_isolated = graph.current_isolated_nodes().len();
        record.current_masked = graph.current_masked_nodes().len();
        record.known_infected = self.observation.current_infected_nodes().len();
        record.known_clear = self.observation.current_clear_nodes().len();
        record.known_immune = self.observation.current_immune_nodes().len();
        record.known_unknown = self.observation.current_unknown_nodes().len();
        record.prop_infected = record.current_infected as f64 / alive;
        record.prop_known_infected = record.known_infected as f64 / alive;
        record.score = score.total();
        record.observed_score = observed_score.total();
        record.total_score = totals.score;
        record.total_observed_score = totals.observed_score;
        record.edges = graph.edge_count();
        self.history.log(&record);

        tracing::debug!(
            "step {}: {} new infections, {} infected, {} deaths, score {:.3}",
            step,
            record.new_infections,
            record.current_infected,
            record.deaths,
            record.score
        );

        self.step += 1;
        Ok(StepResult{
            observation: Observation{
                known: self.observation.snapshot(),
                action_costs,
                actions_completed
            },
            reward: record.observed_score,
            done: self.is_done(),
            record
        })
    }

    /// Runs `steps` steps without interventions
    pub fn run(&mut self, steps: usize) -> Result<()>
    {
        self.run_with(steps, |_, _| ())
    }

    /// Runs `steps` steps without interventions, `observer` sees every step
    pub fn run_with<F>(&mut self, steps: usize, mut observer: F) -> Result<()>
    where F: FnMut(&Self, &StepResult)
    {
        self.extend_horizon(steps);
        for _ in 0..steps{
            let result = self.step(&[])?;
            observer(self, &result);
        }
        tracing::info!(
            "finished {} steps: {} infections, {} deaths, total score {:.3}",
            self.step,
            self.totals.infections,
            self.totals.deaths,
            self.totals.score
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(seed: u64) -> EnvironmentOptions
    {
        let mut options = EnvironmentOptions::default().seeded(seed);
        options.graph.community_n = 4;
        options
    }

    #[test]
    fn same_seed_same_history() {
        let mut a = Environment::new(&options(3)).unwrap();
        let mut b = Environment::new(&options(3)).unwrap();
        a.run(20).unwrap();
        b.run(20).unwrap();
        assert_eq!(a.history(), b.history());
    }

    #[test]
    fn done_once_horizon_is_reached() {
        let mut env = Environment::new(&options(4)).unwrap();
        env.extend_horizon(2);
        assert!(!env.step(&[]).unwrap().done);
        assert!(env.step(&[]).unwrap().done);
        assert_eq!(env.current_step(), 2);
        env.run(3).unwrap();
        assert_eq!(env.current_step(), 5);
        assert_eq!(env.total_steps(), 5);
        assert_eq!(env.history().len(), 5);
    }

    #[test]
    fn initial_infections_are_seeded_once() {
        let mut o = options(5);
        o.simulation.initial_infections = 4;
        o.simulation.random_infection_chance = 0.0;
        let mut env = Environment::new(&o).unwrap();
        let first = env.step(&[]).unwrap();
        assert_eq!(first.record.seeded_infections, 4);
        let second = env.step(&[]).unwrap();
        assert_eq!(second.record.seeded_infections, 0);
    }

    #[test]
    fn vaccination_is_observed() {
        let mut o = options(6);
        o.simulation.initial_infections = 0;
        o.simulation.random_infection_chance = 0.0;
        let mut env = Environment::new(&o).unwrap();
        let result = env.step(&[(Action::Vaccinate, 0)]).unwrap();
        let node = env.graph().node(0);
        assert!(node.immune > 0.0);
        assert!(node.status.immune());
        assert!(result.observation.known.immune.contains(&0));
        assert_eq!(result.observation.actions_completed[&Action::Vaccinate], 1);
        assert_eq!(
            result.observation.action_costs[&Action::Vaccinate],
            o.actions.vaccinate_cost
        );
        // already immune, still fine
        env.step(&[(Action::Vaccinate, 0)]).unwrap();
    }

    #[test]
    fn unknown_targets_are_rejected() {
        let mut env = Environment::new(&options(7)).unwrap();
        let n = env.graph().vertex_count();
        assert!(env.step(&[(Action::Treat, n)]).is_err());
        assert_eq!(env.current_step(), 0);
    }

    #[test]
    fn infections_are_observed_with_delay() {
        let mut o = options(8);
        o.observation.test_rate = 0.0;
        o.simulation.initial_infections = 5;
        let mut env = Environment::new(&o).unwrap();
        env.step(&[]).unwrap();
        assert!(!env.graph().current_infected_nodes().is_empty());
        assert!(env.observation_space().current_infected_nodes().is_empty());

        let target = env.graph().current_infected_nodes()[0];
        // every action counts as a test
        env.step(&[(Action::ProvideMask, target)]).unwrap();
        let node = env.graph().node(target);
        if node.infected > 0{
            assert!(env.observation_space().current_infected_nodes().contains(&target));
        }
    }

    #[test]
    fn replicates_share_the_population() {
        let env = Environment::new(&options(9)).unwrap();
        let mut rng = rng_from_seed(Some(1));
        let a = env.replicate(&mut rng).unwrap();
        let b = env.replicate(&mut rng).unwrap();
        assert_eq!(a.graph().edges(), env.graph().edges());
        assert_eq!(b.graph().edges(), env.graph().edges());
        assert_ne!(a.options().disease.seed, b.options().disease.seed);
        assert_eq!(a.options().simulation.seed, env.options().simulation.seed);
    }

    #[test]
    fn replicate_runs_its_own_course() {
        let mut parent = Environment::new(&options(10)).unwrap();
        let mut child = parent.replicate(&mut rng_from_seed(Some(2))).unwrap();
        parent.run(30).unwrap();
        child.run(30).unwrap();
        assert_eq!(parent.graph().vertex_count(), child.graph().vertex_count());
        assert_ne!(parent.history(), child.history());
    }

    #[test]
    fn unseeded_graph_gets_a_seed() {
        let env = Environment::new(&EnvironmentOptions::default()).unwrap();
        assert!(env.options().graph.seed.is_some());
    }
}
