use{
    std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    rayon::prelude::*,
    crate::{
        error::*,
        epidemic_model::*,
        misc_types::rng_from_seed,
        stats_methods::MetricSummary,
    },
    super::*,
};

/// Runs independent replicates of one environment in parallel.
///
/// Replicates are spread over the current rayon pool. Setting the flag from
/// [`ReplicateRunner::cancel_flag`] stops the batch before the next replicate starts.
pub struct ReplicateRunner{
    template: Environment,
    replicates: usize,
    steps: usize,
    seed: Option<u64>,
    show_progress: bool,
    cancel: Arc<AtomicBool>,
}

impl ReplicateRunner{
    pub fn new(template: Environment, replicates: usize, steps: usize) -> Self
    {
        Self{
            template,
            replicates,
            steps,
            seed: None,
            show_progress: false,
            cancel: Arc::new(AtomicBool::new(false))
        }
    }

    /// seed of the stream the replicate seeds are drawn from
    pub fn seed(mut self, seed: Option<u64>) -> Self
    {
        self.seed = seed;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self
    {
        self.show_progress = show;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool>
    {
        Arc::clone(&self.cancel)
    }

    /// Every replicate gets its own policy from `make_policy`
    pub fn run<P, F>(&self, make_policy: F) -> Result<ReplicateBatch>
    where F: Fn() -> P + Sync,
        P: Policy
    {
        let mut rng = rng_from_seed(self.seed);
        let environments = (0..self.replicates)
            .map(|_| self.template.replicate(&mut rng))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            "starting {} replicates of {} steps on {} threads",
            self.replicates,
            self.steps,
            rayon::current_num_threads()
        );
        let bar = self.show_progress
            .then(|| crate::indication_bar(self.replicates as u64));
        let steps = self.steps;
        let cancel = &self.cancel;

        let results: Vec<Option<Result<History>>> = environments
            .into_par_iter()
            .map(
                |mut env|
                {
                    if cancel.load(Ordering::Relaxed){
                        return None;
                    }
                    let mut policy = make_policy();
                    let result = run_policy(&mut env, steps, &mut policy)
                        .map(|_| env.into_history());
                    if let Some(bar) = bar.as_ref(){
                        bar.inc(1);
                    }
                    Some(result)
                }
            ).collect();
        if let Some(bar) = bar{
            bar.finish_and_clear();
        }

        let mut histories = Vec::with_capacity(results.len());
        for result in results.into_iter().flatten(){
            histories.push(result?);
        }
        if histories.len() < self.replicates{
            tracing::warn!("cancelled after {} of {} replicates", histories.len(), self.replicates);
            return Err(EpidemicError::Cancelled(histories.len()));
        }
        tracing::info!("finished {} replicates", histories.len());
        Ok(ReplicateBatch{histories})
    }
}

/// Histories of a finished batch, in replicate order
#[derive(Clone, Debug)]
pub struct ReplicateBatch{
    histories: Vec<History>,
}

impl ReplicateBatch{
    pub fn histories(&self) -> &[History]
    {
        &self.histories
    }

    pub fn len(&self) -> usize
    {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.histories.is_empty()
    }

    pub fn summary(&self, metric: &str) -> Option<MetricSummary>
    {
        MetricSummary::from_histories(metric, &self.histories)
    }

    /// One summary per logged metric, sorted by name
    pub fn summaries(&self) -> Vec<MetricSummary>
    {
        let names: Vec<String> = match self.histories.first(){
            Some(history) => history.metric_names().map(str::to_owned).collect(),
            None => return Vec::new()
        };
        names.iter()
            .filter_map(|name| self.summary(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Environment
    {
        let mut options = EnvironmentOptions::default().seeded(11);
        options.graph.community_n = 3;
        Environment::new(&options).unwrap()
    }

    #[test]
    fn runs_every_replicate() {
        let runner = ReplicateRunner::new(template(), 6, 12).seed(Some(5));
        let batch = runner.run(|| DoNothing).unwrap();
        assert_eq!(batch.len(), 6);
        assert!(batch.histories().iter().all(|h| h.len() == 12));
        let summary = batch.summary("total_infections").unwrap();
        assert_eq!(summary.samples, 6);
        assert_eq!(summary.per_step.len(), 12);
        assert_eq!(batch.summaries().len(), 30);
    }

    #[test]
    fn seeded_batches_repeat() {
        let a = ReplicateRunner::new(template(), 4, 8).seed(Some(9)).run(|| DoNothing).unwrap();
        let b = ReplicateRunner::new(template(), 4, 8).seed(Some(9)).run(|| DoNothing).unwrap();
        assert_eq!(a.histories(), b.histories());
    }

    #[test]
    fn cancelled_batch_is_an_error() {
        let runner = ReplicateRunner::new(template(), 4, 8);
        runner.cancel_flag().store(true, Ordering::Relaxed);
        match runner.run(|| DoNothing){
            Err(EpidemicError::Cancelled(done)) => assert_eq!(done, 0),
            other => panic!("expected cancellation, got {:?}", other.map(|b| b.len())),
        }
    }
}
