use {
    serde::{Serialize, Deserialize},
    crate::{error::*, epidemic_model::*, misc_types::TargetPool},
};

/// Decides which interventions to apply before each step
pub trait Policy
{
    fn choose(&mut self, env: &mut Environment) -> Vec<(Action, NodeId)>;
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct DoNothing;

impl Policy for DoNothing{
    fn choose(&mut self, _: &mut Environment) -> Vec<(Action, NodeId)>
    {
        Vec::new()
    }
}

/// Apply `action` to up to `per_step` random nodes of `pool` every step
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct TargetRule{
    pub action: Action,
    pub pool: TargetPool,
    pub per_step: usize,
}

/// Rules are applied in order, each one sees the known lists of the
/// previous step
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RandomTargeting{
    pub rules: Vec<TargetRule>,
}

impl Policy for RandomTargeting{
    fn choose(&mut self, env: &mut Environment) -> Vec<(Action, NodeId)>
    {
        let mut chosen = Vec::new();
        for rule in self.rules.iter(){
            let available = pool_members(env.observation_space(), rule.pool);
            let n = ActionSpace::check_available_targets(rule.per_step, &available);
            let targets = env.action_space().select_random_target(n, &available, None);
            chosen.extend(
                targets.into_iter()
                    .flatten()
                    .map(|target| (rule.action, target))
            );
        }
        chosen
    }
}

/// Policy as it appears in a parameter file
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum PolicyConfig{
    DoNothing,
    RandomTargeting(RandomTargeting),
}

impl Default for PolicyConfig{
    fn default() -> Self {
        Self::RandomTargeting(
            RandomTargeting{
                rules: vec![
                    TargetRule{action: Action::Isolate, pool: TargetPool::KnownInfected, per_step: 2},
                    TargetRule{action: Action::Vaccinate, pool: TargetPool::Unknown, per_step: 1},
                ]
            }
        )
    }
}

impl Policy for PolicyConfig{
    fn choose(&mut self, env: &mut Environment) -> Vec<(Action, NodeId)>
    {
        match self{
            Self::DoNothing => DoNothing.choose(env),
            Self::RandomTargeting(policy) => policy.choose(env),
        }
    }
}

/// Known members of `pool`
pub fn pool_members(observation: &ObservationSpace, pool: TargetPool) -> Vec<NodeId>
{
    let members = match pool{
        TargetPool::KnownInfected => observation.current_infected_nodes(),
        TargetPool::KnownClear => observation.current_clear_nodes(),
        TargetPool::KnownImmune => observation.current_immune_nodes(),
        TargetPool::Unknown => observation.current_unknown_nodes(),
        TargetPool::Isolated => observation.current_isolated_nodes(),
        TargetPool::Masked => observation.current_masked_nodes(),
        TargetPool::Alive => observation.current_alive_nodes(),
    };
    members.to_vec()
}

/// Runs `steps` steps of `env`, asking `policy` for the actions of each step
pub fn run_policy<P>(env: &mut Environment, steps: usize, policy: &mut P) -> Result<()>
where P: Policy + ?Sized
{
    env.extend_horizon(steps);
    for _ in 0..steps{
        let actions = policy.choose(env);
        env.step(&actions)?;
    }
    Ok(())
}
