//all the methods of calculating averages and variances over replicates

use {
    serde::{Serialize, Deserialize},
    crate::epidemic_model::History,
};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct MyVariance
{
    pub mean: f64,
    pub var: f64
}

impl MyVariance{

    pub fn mean(&self) -> f64
    {
        self.mean
    }

    pub fn variance(&self) -> f64
    {
        self.var
    }

    pub fn std_error(&self, samples: usize) -> f64
    {
        if samples == 0{
            return 0.0;
        }
        (self.var / samples as f64).sqrt()
    }

    pub fn from_slice(slice: &[f64]) -> Self
    {
        let mean = calc_average(slice);
        let var = calc_variance(slice, mean);
        Self{
            mean,
            var
        }
    }
}

/// Empty slices average to 0
pub fn calc_average(slice: &[f64]) -> f64
{
    if slice.is_empty(){
        return 0.0;
    }
    slice.iter().sum::<f64>() / slice.len() as f64
}

pub fn calc_variance(slice: &[f64], average: f64) -> f64
{
    if slice.is_empty(){
        return 0.0;
    }
    let var_sum: f64 = slice.iter()
        .map(|val| {
            let dif = average - val;
            dif * dif
        })
        .sum();
    var_sum / slice.len() as f64
}

/// Mean and variance of one metric at every step, taken across replicates
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MetricSummary
{
    pub metric: String,
    pub samples: usize,
    pub per_step: Vec<MyVariance>,
}

impl MetricSummary{
    /// Histories shorter than the longest one only contribute to the steps they have.
    /// Returns `None` if no history logged `metric`
    pub fn from_histories(metric: &str, histories: &[History]) -> Option<Self>
    {
        let series: Vec<&[f64]> = histories.iter()
            .filter_map(|history| history.get(metric))
            .collect();
        if series.is_empty(){
            return None;
        }
        let steps = series.iter().map(|s| s.len()).max().unwrap_or(0);
        let mut column = Vec::with_capacity(series.len());
        let per_step = (0..steps)
            .map(
                |step|
                {
                    column.clear();
                    column.extend(series.iter().filter_map(|s| s.get(step)));
                    MyVariance::from_slice(&column)
                }
            ).collect();
        Some(Self{
            metric: metric.to_owned(),
            samples: series.len(),
            per_step
        })
    }

    /// Summary of the value at the last step
    pub fn last(&self) -> Option<MyVariance>
    {
        self.per_step.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epidemic_model::StepRecord;

    #[test]
    fn mean_and_variance() {
        let v = MyVariance::from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert!((v.mean() - 2.5).abs() < 1e-12);
        assert!((v.variance() - 1.25).abs() < 1e-12);
        assert_eq!(MyVariance::from_slice(&[]), MyVariance::default());
    }

    #[test]
    fn summary_over_histories() {
        let histories: Vec<History> = (0..3_usize)
            .map(
                |r|
                {
                    let mut history = History::new();
                    for step in 0..4{
                        history.log(&StepRecord{step, total_infections: r * step, ..StepRecord::default()});
                    }
                    history
                }
            ).collect();
        let summary = MetricSummary::from_histories("total_infections", &histories).unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.per_step.len(), 4);
        assert_eq!(summary.per_step[0].mean, 0.0);
        assert!((summary.last().unwrap().mean - 3.0).abs() < 1e-12);
        assert!(MetricSummary::from_histories("nope", &histories).is_none());
    }
}
