use {
    std::fmt,
    serde::{Serialize, Deserialize},
    rand::{Rng, SeedableRng, seq::SliceRandom},
    rand_pcg::Pcg64,
    crate::{error::*, misc_types::rng_from_seed},
    super::*,
};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action{
    Nothing,
    Vaccinate,
    Isolate,
    Reconnect,
    Treat,
    ProvideMask,
    RemoveMask,
}

impl Action{
    pub const ALL: [Action; 7] = [
        Action::Nothing,
        Action::Vaccinate,
        Action::Isolate,
        Action::Reconnect,
        Action::Treat,
        Action::ProvideMask,
        Action::RemoveMask,
    ];

    pub fn name(self) -> &'static str
    {
        match self{
            Self::Nothing => "nothing",
            Self::Vaccinate => "vaccinate",
            Self::Isolate => "isolate",
            Self::Reconnect => "reconnect",
            Self::Treat => "treat",
            Self::ProvideMask => "provide_mask",
            Self::RemoveMask => "remove_mask",
        }
    }

    pub fn index(self) -> usize
    {
        self as usize
    }
}

impl fmt::Display for Action{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// What applying an action did, beyond its cost
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionOutcome{
    pub cost: f64,
    /// set for `Treat`
    pub conclusion: Option<Conclusion>,
}

/// Catalogue of interventions with their costs and efficiencies
#[derive(Clone, Debug)]
pub struct ActionSpace{
    options: ActionOptions,
    rng: Pcg64,
}

impl ActionSpace{
    pub fn new(options: &ActionOptions) -> Result<Self>
    {
        options.validate()?;
        Ok(Self{
            options: options.clone(),
            rng: rng_from_seed(options.seed)
        })
    }

    pub fn cost(&self, action: Action) -> f64
    {
        let o = &self.options;
        match action{
            Action::Nothing => o.nothing_cost,
            Action::Vaccinate => o.vaccinate_cost,
            Action::Isolate => o.isolate_cost,
            Action::Reconnect => o.reconnect_cost,
            Action::Treat => o.treat_cost,
            Action::ProvideMask => o.mask_cost,
            Action::RemoveMask => o.remove_mask_cost,
        }
    }

    /// Applies `action` to `target` at `step` without checking whether it makes sense.
    /// Every action besides `Nothing` brings the target in contact with
    /// the healthcare system and therefore counts as a test.
    pub fn apply(
        &mut self,
        action: Action,
        target: NodeId,
        step: usize,
        disease: &mut Disease,
        observation: &mut ObservationSpace
    ) -> Result<ActionOutcome>
    {
        let o = &self.options;
        let graph = observation.graph_mut();
        let mut conclusion = None;
        if action != Action::Nothing && !graph.node(target).alive{
            // charged, but the dead stay untouched
            if action == Action::Treat{
                conclusion = Some(Conclusion::NotInfected);
            }
            tracing::trace!("step {}: {} on dead node {}", step, action, target);
            return Ok(ActionOutcome{cost: self.cost(action), conclusion});
        }
        match action{
            Action::Nothing => {
                return Ok(ActionOutcome{cost: o.nothing_cost, conclusion});
            },
            Action::Vaccinate => {
                disease.give_immunity(graph.node_mut(target), Some(o.vaccinate_efficiency));
            },
            Action::Isolate => {
                graph.isolate_node(target, o.isolate_efficiency)?;
                graph.node_mut(target).status.set(StatusChange::Isolated(true));
            },
            Action::Reconnect => {
                graph.reconnect_node(target, o.reconnect_efficiency)?;
                let node = graph.node_mut(target);
                let isolated = node.isolated;
                node.status.set(StatusChange::Isolated(isolated));
            },
            Action::Treat => {
                conclusion = Some(
                    disease.conclude(
                        graph.node_mut(target),
                        o.treatment_conclusion_chance,
                        o.treatment_recovery_rate_modifier
                    )
                );
            },
            Action::ProvideMask => graph.mask_node(target, o.mask_efficiency),
            Action::RemoveMask => graph.unmask_node(target),
        }
        graph.node_mut(target).last_tested = Some(step);
        tracing::trace!("step {}: {} node {}", step, action, target);
        Ok(ActionOutcome{cost: self.cost(action), conclusion})
    }

    /// Number of targets that can actually be served
    pub fn check_available_targets(requested: usize, available: &[NodeId]) -> usize
    {
        requested.min(available.len())
    }

    /// Exactly `n` entries: up to `n` distinct targets drawn uniformly from
    /// `available`, padded with `None` once `available` is exhausted.
    /// Uses its own generator unless a seed is given
    pub fn select_random_target(
        &mut self,
        n: usize,
        available: &[NodeId],
        seed: Option<u64>
    ) -> Vec<Option<NodeId>>
    {
        let take = Self::check_available_targets(n, available);
        let chosen: Vec<NodeId> = match seed{
            Some(seed) => {
                let mut rng = Pcg64::seed_from_u64(seed);
                available.choose_multiple(&mut rng, take).copied().collect()
            },
            None => available.choose_multiple(&mut self.rng, take).copied().collect()
        };
        chosen.into_iter()
            .map(Some)
            .chain(std::iter::repeat(None))
            .take(n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Setup{
        actions: ActionSpace,
        disease: Disease,
        observation: ObservationSpace,
    }

    fn setup(seed: u64) -> Setup
    {
        let graph = PopulationGraph::generate(&GraphOptions{
            community_n: 3,
            p_in: 0.6,
            seed: Some(seed),
            ..GraphOptions::default()
        }).unwrap();
        Setup{
            actions: ActionSpace::new(&ActionOptions{
                seed: Some(seed),
                ..ActionOptions::default()
            }).unwrap(),
            disease: Disease::new(&DiseaseOptions{seed: Some(seed), ..DiseaseOptions::default()}).unwrap(),
            observation: ObservationSpace::new(graph, &ObservationOptions::default()).unwrap()
        }
    }

    impl Setup{
        fn apply(&mut self, action: Action, target: NodeId, step: usize) -> ActionOutcome
        {
            self.actions
                .apply(action, target, step, &mut self.disease, &mut self.observation)
                .unwrap()
        }
    }

    #[test]
    fn target_padding() {
        let mut s = setup(1);
        let available: Vec<NodeId> = (1..10).collect();
        let targets = s.actions.select_random_target(12, &available, Some(3));
        assert_eq!(targets.len(), 12);
        let mut chosen: Vec<NodeId> = targets.iter().flatten().copied().collect();
        assert_eq!(targets.iter().filter(|t| t.is_none()).count(), 3);
        chosen.sort_unstable();
        assert_eq!(chosen, available);

        let targets = s.actions.select_random_target(4, &available, None);
        assert_eq!(targets.len(), 4);
        assert!(targets.iter().all(|t| t.is_some()));

        assert_eq!(s.actions.select_random_target(2, &[], None), vec![None, None]);
    }

    #[test]
    fn seeded_selection_is_reproducible() {
        let mut s = setup(2);
        let available: Vec<NodeId> = (0..50).collect();
        assert_eq!(
            s.actions.select_random_target(10, &available, Some(8)),
            s.actions.select_random_target(10, &available, Some(8))
        );
    }

    #[test]
    fn costs_come_from_options() {
        let mut s = setup(3);
        let options = ActionOptions::default();
        assert_eq!(s.apply(Action::Nothing, 0, 0).cost, options.nothing_cost);
        assert_eq!(s.apply(Action::Vaccinate, 0, 0).cost, options.vaccinate_cost);
        assert_eq!(s.apply(Action::Treat, 0, 0).cost, options.treat_cost);
        assert_eq!(s.apply(Action::ProvideMask, 0, 0).cost, options.mask_cost);
        for action in Action::ALL{
            assert_eq!(s.actions.cost(action), s.apply(action, 1, 1).cost);
        }
    }

    #[test]
    fn vaccination_grants_immunity_and_counts_as_test() {
        let mut s = setup(4);
        s.apply(Action::Vaccinate, 2, 7);
        let node = s.observation.graph().node(2);
        assert_eq!(node.immune, ActionOptions::default().vaccinate_efficiency);
        assert!(node.was_tested_at(7));
        // vaccinating again is fine
        s.apply(Action::Vaccinate, 2, 8);
    }

    #[test]
    fn isolate_and_reconnect_update_status() {
        let mut s = setup(5);
        let target = (0..s.observation.graph().vertex_count())
            .max_by_key(|&i| s.observation.graph().degree(i))
            .unwrap();
        s.apply(Action::Isolate, target, 0);
        assert!(s.observation.graph().node(target).status.isolated());
        for step in 1..100{
            s.apply(Action::Reconnect, target, step);
        }
        let node = s.observation.graph().node(target);
        assert!(!node.isolated);
        assert!(!node.status.isolated());
    }

    #[test]
    fn treating_a_clear_node_is_harmless() {
        let mut s = setup(6);
        let outcome = s.apply(Action::Treat, 0, 0);
        assert_eq!(outcome.conclusion, Some(Conclusion::NotInfected));
        assert!(s.observation.graph().node(0).alive);
    }

    #[test]
    fn the_dead_stay_dead() {
        let mut s = setup(8);
        let target = (0..s.observation.graph().vertex_count())
            .max_by_key(|&i| s.observation.graph().degree(i))
            .unwrap();
        s.observation.graph_mut().node_mut(target).kill();
        let degree = s.observation.graph().degree(target);
        for (step, action) in Action::ALL.into_iter().enumerate(){
            let outcome = s.apply(action, target, step);
            assert_eq!(outcome.cost, s.actions.cost(action));
            let node = s.observation.graph().node(target);
            assert!(!node.alive);
            assert_eq!(node.infected, 0);
            assert_eq!(node.immune, 0.0);
            assert_eq!(node.mask, 0.0);
            assert!(!node.isolated);
            assert!(node.removed_edges.is_empty());
            assert!(!node.status.isolated());
            assert_eq!(s.observation.graph().degree(target), degree);
        }
    }

    #[test]
    fn masks() {
        let mut s = setup(7);
        s.apply(Action::ProvideMask, 1, 0);
        assert_eq!(s.observation.graph().node(1).mask, ActionOptions::default().mask_efficiency);
        s.apply(Action::RemoveMask, 1, 1);
        assert_eq!(s.observation.graph().node(1).mask, 0.0);
    }
}
