use {
    std::collections::HashMap,
    crate::error::*,
    super::*,
};

/// Overburdened healthcare lowers the chance to recover
#[derive(Clone, Debug)]
pub struct Healthcare{
    capacity: usize,
    max_penalty: f64,
    memo: HashMap<usize, f64>,
}

impl Healthcare{
    pub fn new(options: &HealthcareOptions) -> Result<Self>
    {
        options.validate()?;
        Ok(Self{
            capacity: options.capacity,
            max_penalty: options.max_penalty,
            memo: HashMap::new()
        })
    }

    pub fn capacity(&self) -> usize
    {
        self.capacity
    }

    /// Modifier for the recovery rate: 1 while the number of infected
    /// stays within capacity, `capacity / infected` beyond it but never
    /// below `max_penalty`
    pub fn recovery_rate_penalty(&mut self, n_current_infected: usize) -> f64
    {
        let capacity = self.capacity;
        let max_penalty = self.max_penalty;
        *self.memo
            .entry(n_current_infected)
            .or_insert_with(
                ||
                {
                    if n_current_infected <= capacity{
                        1.0
                    } else {
                        (capacity as f64 / n_current_infected as f64).max(max_penalty)
                    }
                }
            )
    }
}
