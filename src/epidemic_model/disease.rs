use {
    rand::Rng,
    rand_distr::{Distribution, Normal},
    rand_pcg::Pcg64,
    crate::{error::*, misc_types::*},
    super::*,
};

/// How a call to [`Disease::conclude`] ended for a node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conclusion{
    /// node was not infected (or dead), nothing happened
    NotInfected,
    /// infection goes on for at least one more step
    Ongoing,
    Recovered,
    Died,
}

/// Stochastic rules of the disease for single nodes or node pairs.
/// Knows nothing about the population as a whole.
#[derive(Clone)]
pub struct Disease{
    virulence: f64,
    recovery_rate: f64,
    duration: Normal<f64>,
    immunity: Normal<f64>,
    immunity_decay: Normal<f64>,
    rng: Pcg64,
}

fn normal(name: &'static str, mean: f64, std: f64) -> Result<Normal<f64>>
{
    Normal::new(mean, std)
        .map_err(|e| EpidemicError::InvalidOption{name, reason: e.to_string()})
}

impl Disease{
    pub fn new(options: &DiseaseOptions) -> Result<Self>
    {
        options.validate()?;
        Ok(Self{
            virulence: options.virulence,
            recovery_rate: options.recovery_rate,
            duration: normal("duration_std", options.duration_mean, options.duration_std)?,
            immunity: normal("immunity_std", options.immunity_mean, options.immunity_std)?,
            immunity_decay: normal(
                "immunity_decay_std",
                options.immunity_decay_mean,
                options.immunity_decay_std
            )?,
            rng: rng_from_seed(options.seed)
        })
    }

    pub fn virulence(&self) -> f64
    {
        self.virulence
    }

    pub fn recovery_rate(&self) -> f64
    {
        self.recovery_rate
    }

    /// Each modifier `m` scales the virulence by `1 - m`. The result is kept
    /// within [`MIN_VIRULENCE`, `MAX_VIRULENCE`] after every factor
    pub fn modified_virulence(base: f64, modifiers: &[f64]) -> f64
    {
        let mut virulence = base.clamp(MIN_VIRULENCE, MAX_VIRULENCE);
        for modifier in modifiers{
            virulence = (virulence * (1.0 - modifier)).clamp(MIN_VIRULENCE, MAX_VIRULENCE);
        }
        virulence
    }

    fn infection_chance(&self, source: &NodeState, target: &NodeState) -> f64
    {
        Self::modified_virulence(
            self.virulence,
            &[target.immune, target.mask, source.mask]
        )
    }

    fn is_infectious(source: &NodeState) -> bool
    {
        source.alive && source.infected > 0
    }

    fn is_susceptible(target: &NodeState) -> bool
    {
        target.alive && target.infected == 0
    }

    /// Returns true if `target` got infected
    pub fn try_to_infect(&mut self, source: &NodeState, target: &mut NodeState) -> bool
    {
        if !Self::is_infectious(source) || !Self::is_susceptible(target){
            return false;
        }
        let chance = self.infection_chance(source, target);
        if self.rng.gen::<f64>() < chance{
            infect(target);
            true
        } else {
            false
        }
    }

    /// Same rule as [`Disease::try_to_infect`] for many targets of one source.
    /// Entry `i` of the result tells whether target `i` got infected.
    pub fn try_to_infect_multiple<'a, I>(&mut self, source: &NodeState, targets: I) -> Vec<bool>
    where I: IntoIterator<Item = &'a mut NodeState>
    {
        if !Self::is_infectious(source){
            let count = targets.into_iter().count();
            tracing::warn!(
                "tried to infect {} targets from a source that is not infectious",
                count
            );
            return vec![false; count];
        }
        targets.into_iter()
            .map(|target| self.try_to_infect(source, target))
            .collect()
    }

    /// Resolves an ongoing infection once it lasted longer than a duration drawn
    /// for this step, or earlier with probability `chance_to_force`.
    /// Survivors gain immunity.
    pub fn conclude(
        &mut self,
        node: &mut NodeState,
        chance_to_force: f64,
        recovery_rate_modifier: f64
    ) -> Conclusion
    {
        if !Self::is_infectious(node){
            return Conclusion::NotInfected;
        }
        let duration = self.duration.sample(&mut self.rng);
        let forced = self.rng.gen::<f64>() < chance_to_force;
        if (node.infected as f64) < duration && !forced{
            node.infected += 1;
            return Conclusion::Ongoing;
        }

        let recovery_chance = (self.recovery_rate * recovery_rate_modifier).clamp(0.0, 1.0);
        if self.rng.gen::<f64>() < recovery_chance{
            node.infected = 0;
            self.give_immunity(node, None);
            Conclusion::Recovered
        } else {
            node.kill();
            Conclusion::Died
        }
    }

    /// Sets the immunity of `node`, drawn from the immunity distribution unless given
    pub fn give_immunity(&mut self, node: &mut NodeState, immunity: Option<f64>)
    {
        let immunity = match immunity{
            Some(immunity) => immunity,
            None => self.immunity.sample(&mut self.rng)
        };
        node.immune = immunity.clamp(0.0, 1.0);
    }

    /// Immunity shrinks by a drawn fraction of itself
    pub fn decay_immunity(&mut self, node: &mut NodeState)
    {
        let fraction = self.immunity_decay.sample(&mut self.rng).clamp(0.0, 1.0);
        node.immune = (node.immune * (1.0 - fraction)).max(0.0);
    }

    pub fn force_infect(&mut self, node: &mut NodeState)
    {
        if node.alive{
            infect(node);
        }
    }
}

/// infection breaks any protection the node had
fn infect(node: &mut NodeState)
{
    node.infected = 1;
    node.immune = 0.0;
}
