use crate::epidemic_model::StatusError;

#[derive(Debug, thiserror::Error)]
pub enum EpidemicError {
    #[error("invalid status: {0}")]
    Status(#[from] StatusError),
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption {
        name: &'static str,
        reason: String,
    },
    #[error("graph operation on nodes {0} and {1} failed: {2}")]
    Topology(usize, usize, String),
    #[error("replicate batch was cancelled after {0} runs")]
    Cancelled(usize),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, EpidemicError>;

/// Checks that `value` is a probability
pub fn check_probability(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EpidemicError::InvalidOption {
            name,
            reason: format!("{value} is not within [0, 1]"),
        })
    }
}

pub fn check_non_negative(name: &'static str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(EpidemicError::InvalidOption {
            name,
            reason: format!("{value} has to be finite and non-negative"),
        })
    }
}
