use{
    serde::{Serialize, Deserialize},
    crate::error::*,
    crate::misc_types::*,
};

/// Parameters of the random partition graph
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GraphOptions{
    pub community_n: usize,
    pub community_size_mean: f64,
    pub community_size_std: f64,
    /// edge probability within a community
    pub p_in: f64,
    /// edge probability between communities
    pub p_out: f64,
    /// immunity needed for a node to count as immune
    pub considered_immune_threshold: f64,
    pub seed: Option<u64>,
}

impl Default for GraphOptions{
    fn default() -> Self {
        Self{
            community_n: DEFAULT_COMMUNITY_N,
            community_size_mean: DEFAULT_COMMUNITY_SIZE_MEAN,
            community_size_std: DEFAULT_COMMUNITY_SIZE_STD,
            p_in: 0.15,
            p_out: 0.01,
            considered_immune_threshold: DEFAULT_IMMUNE_THRESHOLD,
            seed: None
        }
    }
}

impl GraphOptions{
    pub fn validate(&self) -> Result<()>
    {
        if self.community_n == 0 {
            return Err(EpidemicError::InvalidOption {
                name: "community_n",
                reason: "the population needs at least one community".to_owned()
            });
        }
        check_non_negative("community_size_mean", self.community_size_mean)?;
        check_non_negative("community_size_std", self.community_size_std)?;
        check_probability("p_in", self.p_in)?;
        check_probability("p_out", self.p_out)?;
        check_probability("considered_immune_threshold", self.considered_immune_threshold)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DiseaseOptions{
    pub virulence: f64,
    pub recovery_rate: f64,
    pub duration_mean: f64,
    pub duration_std: f64,
    pub immunity_mean: f64,
    pub immunity_std: f64,
    pub immunity_decay_mean: f64,
    pub immunity_decay_std: f64,
    pub seed: Option<u64>,
}

impl Default for DiseaseOptions{
    fn default() -> Self {
        Self{
            virulence: DEFAULT_VIRULENCE,
            recovery_rate: DEFAULT_RECOVERY_RATE,
            duration_mean: 10.0,
            duration_std: 2.0,
            immunity_mean: 0.7,
            immunity_std: 0.05,
            immunity_decay_mean: 0.05,
            immunity_decay_std: 0.01,
            seed: None
        }
    }
}

impl DiseaseOptions{
    pub fn validate(&self) -> Result<()>
    {
        check_probability("virulence", self.virulence)?;
        check_probability("recovery_rate", self.recovery_rate)?;
        check_non_negative("duration_mean", self.duration_mean)?;
        check_non_negative("duration_std", self.duration_std)?;
        check_non_negative("immunity_std", self.immunity_std)?;
        check_non_negative("immunity_decay_std", self.immunity_decay_std)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct HealthcareOptions{
    /// number of infected the healthcare system handles without penalty
    pub capacity: usize,
    /// lowest recovery rate modifier
    pub max_penalty: f64,
}

impl Default for HealthcareOptions{
    fn default() -> Self {
        Self{
            capacity: DEFAULT_HEALTHCARE_CAPACITY,
            max_penalty: 0.5
        }
    }
}

impl HealthcareOptions{
    pub fn validate(&self) -> Result<()>
    {
        check_probability("max_penalty", self.max_penalty)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ObservationOptions{
    pub test_rate: f64,
    /// number of steps a negative test stays valid
    pub test_validity_period: usize,
    pub seed: Option<u64>,
}

impl Default for ObservationOptions{
    fn default() -> Self {
        Self{
            test_rate: DEFAULT_TEST_RATE,
            test_validity_period: 5,
            seed: None
        }
    }
}

impl ObservationOptions{
    pub fn validate(&self) -> Result<()>
    {
        check_non_negative("test_rate", self.test_rate)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ActionOptions{
    pub vaccinate_efficiency: f64,
    pub isolate_efficiency: f64,
    pub reconnect_efficiency: f64,
    pub treatment_conclusion_chance: f64,
    pub treatment_recovery_rate_modifier: f64,
    pub mask_efficiency: f64,
    pub nothing_cost: f64,
    pub vaccinate_cost: f64,
    pub isolate_cost: f64,
    pub reconnect_cost: f64,
    pub treat_cost: f64,
    pub mask_cost: f64,
    pub remove_mask_cost: f64,
    pub seed: Option<u64>,
}

impl Default for ActionOptions{
    fn default() -> Self {
        Self{
            vaccinate_efficiency: 0.95,
            isolate_efficiency: 0.95,
            reconnect_efficiency: 0.95,
            treatment_conclusion_chance: 0.9,
            treatment_recovery_rate_modifier: 1.01,
            mask_efficiency: 0.5,
            nothing_cost: 0.0,
            vaccinate_cost: 1.0,
            isolate_cost: 1.0,
            reconnect_cost: 0.0,
            treat_cost: 2.0,
            mask_cost: 0.2,
            remove_mask_cost: 0.0,
            seed: None
        }
    }
}

impl ActionOptions{
    pub fn validate(&self) -> Result<()>
    {
        check_probability("vaccinate_efficiency", self.vaccinate_efficiency)?;
        check_probability("isolate_efficiency", self.isolate_efficiency)?;
        check_probability("reconnect_efficiency", self.reconnect_efficiency)?;
        check_probability("treatment_conclusion_chance", self.treatment_conclusion_chance)?;
        check_non_negative("treatment_recovery_rate_modifier", self.treatment_recovery_rate_modifier)?;
        check_probability("mask_efficiency", self.mask_efficiency)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScoringOptions{
    /// reward per contact of a node that is not infected
    pub yield_per_connection: f64,
    pub infection_penalty: f64,
    pub death_penalty: f64,
    pub action_cost_weight: f64,
}

impl Default for ScoringOptions{
    fn default() -> Self {
        Self{
            yield_per_connection: 0.01,
            infection_penalty: 0.5,
            death_penalty: 1.0,
            action_cost_weight: 1.0
        }
    }
}

/// Everything needed to build an [`Environment`](super::Environment)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct EnvironmentOptions{
    pub graph: GraphOptions,
    pub disease: DiseaseOptions,
    pub healthcare: HealthcareOptions,
    pub observation: ObservationOptions,
    pub actions: ActionOptions,
    pub scoring: ScoringOptions,
    pub simulation: SimulationOptions,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SimulationOptions{
    /// nodes infected at the very first step
    pub initial_infections: usize,
    /// chance per step of an infection from outside the population
    pub random_infection_chance: f64,
    pub seed: Option<u64>,
}

impl Default for SimulationOptions{
    fn default() -> Self {
        Self{
            initial_infections: DEFAULT_INITIAL_INFECTIONS,
            random_infection_chance: 0.01,
            seed: None
        }
    }
}

impl EnvironmentOptions{
    pub fn validate(&self) -> Result<()>
    {
        self.graph.validate()?;
        self.disease.validate()?;
        self.healthcare.validate()?;
        self.observation.validate()?;
        self.actions.validate()?;
        check_probability("random_infection_chance", self.simulation.random_infection_chance)
    }

    /// Same options, all seeds fixed. Handy for reproducible runs
    pub fn seeded(mut self, seed: u64) -> Self
    {
        self.graph.seed = Some(seed);
        self.disease.seed = Some(seed.wrapping_add(1));
        self.observation.seed = Some(seed.wrapping_add(2));
        self.actions.seed = Some(seed.wrapping_add(3));
        self.simulation.seed = Some(seed.wrapping_add(4));
        self
    }
}
