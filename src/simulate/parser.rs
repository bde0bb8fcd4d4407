use std::fmt::Display;

use{
    super::*,
    structopt::StructOpt,
    std::num::*,
    crate::{
        json_parsing::*,
        error::*,
        epidemic_model::EnvironmentOptions,
        replicates::PolicyConfig,
        misc_types::*,
    },
    serde::{Serialize, Deserialize},
    serde_json::Value,
};

#[derive(Debug, StructOpt, Clone)]
///Run replicates of the epidemic environment under a policy
pub struct Simulate{
    /// parameter file. Prints the default parameters if missing
    #[structopt(long)]
    json: Option<String>,

    #[structopt(long)]
    num_threads: Option<NonZeroUsize>,

    /// do not show a progress bar
    #[structopt(long)]
    quiet: bool,
}

impl Simulate{
    pub fn parse(&self) -> Result<(SimulateParams, Value)>
    {
        parse(self.json.as_ref())
    }

    pub fn execute(&self) -> Result<()>
    {
        let (opt, json) = self.parse()?;
        if self.json.is_none(){
            return Ok(());
        }
        run_simulation(opt, json, self.num_threads, !self.quiet)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SimulateParams{
    pub options: EnvironmentOptions,
    pub steps: NonZeroUsize,
    pub replicates: NonZeroUsize,
    pub policy: PolicyConfig,
    /// seeds the stream the replicates draw their seeds from
    pub replicate_seed: Option<u64>,
    /// also store every history with bincode
    pub write_histories: bool,
}

impl Default for SimulateParams{
    fn default() -> Self{
        let mut options = EnvironmentOptions::default().seeded(DEFAULT_ENV_SEED);
        options.graph.seed = Some(DEFAULT_GRAPH_SEED);
        Self{
            options,
            steps: DEFAULT_STEPS,
            replicates: DEFAULT_REPLICATES,
            policy: PolicyConfig::default(),
            replicate_seed: Some(DEFAULT_ENV_SEED),
            write_histories: false
        }
    }
}

impl SimulateParams{
    pub fn name<E>(&self, something_else: E, file_ending: E, num_threads: Option<NonZeroUsize>) -> String
    where E: Display
    {
        let k = match num_threads{
            None => "".to_owned(),
            Some(v) => format!("k{}", v)
        };
        let seed = |s: Option<u64>| s.map_or_else(|| "R".to_owned(), |s| s.to_string());
        let policy = match &self.policy{
            PolicyConfig::DoNothing => "none".to_owned(),
            PolicyConfig::RandomTargeting(p) => p.rules
                .iter()
                .map(|rule| format!("{}-{}{}", rule.action, rule.pool.name(), rule.per_step))
                .collect::<Vec<_>>()
                .join("+"),
        };
        format!(
            "ver{}_{}_C{}_V{}_T{}_St{}_Rep{}_P{}_GS{}_SS{}_THREADS{}.{}",
            crate::VERSION,
            something_else,
            self.options.graph.community_n,
            self.options.disease.virulence,
            self.options.observation.test_rate,
            self.steps,
            self.replicates,
            policy,
            seed(self.options.graph.seed),
            seed(self.replicate_seed),
            k,
            file_ending
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_survive_json() {
        let params = SimulateParams::default();
        let json = serde_json::to_string(&params).unwrap();
        let back: SimulateParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let params: SimulateParams = serde_json::from_str(
            r#"{"steps": 7, "policy": "DoNothing", "options": {"graph": {"community_n": 2}}}"#
        ).unwrap();
        assert_eq!(params.steps.get(), 7);
        assert_eq!(params.policy, PolicyConfig::DoNothing);
        assert_eq!(params.options.graph.community_n, 2);
        assert_eq!(params.replicates, DEFAULT_REPLICATES);
    }

    #[test]
    fn file_names_carry_the_setup() {
        let name = SimulateParams::default().name("summary", "dat", NonZeroUsize::new(4));
        assert!(name.ends_with("THREADSk4.dat"));
        assert!(name.contains("summary"));
    }
}
