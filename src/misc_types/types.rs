use{
    serde::{Serialize, Deserialize},
    std::num::*,
    rand_pcg::Pcg64,
    rand::SeedableRng,
};

pub const DEFAULT_COMMUNITY_N: usize = 15;
pub const DEFAULT_COMMUNITY_SIZE_MEAN: f64 = 10.0;
pub const DEFAULT_COMMUNITY_SIZE_STD: f64 = 2.0;
pub const DEFAULT_IMMUNE_THRESHOLD: f64 = 0.3;
pub const DEFAULT_VIRULENCE: f64 = 0.06;
pub const DEFAULT_RECOVERY_RATE: f64 = 0.98;
pub const DEFAULT_HEALTHCARE_CAPACITY: usize = 10;
pub const DEFAULT_TEST_RATE: f64 = 0.2;
pub const DEFAULT_INITIAL_INFECTIONS: usize = 3;

pub const DEFAULT_GRAPH_SEED: u64 = 875629289;
pub const DEFAULT_ENV_SEED: u64 = 1489264107025;
pub const DEFAULT_STEPS: NonZeroUsize = unsafe{NonZeroUsize::new_unchecked(100)};
pub const DEFAULT_REPLICATES: NonZeroUsize = unsafe{NonZeroUsize::new_unchecked(32)};

/// lower bound of any effective transmission probability
pub const MIN_VIRULENCE: f64 = 1e-7;
/// upper bound of any effective transmission probability
pub const MAX_VIRULENCE: f64 = 0.999;

/// Which of the known node categories a policy draws its targets from
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetPool{
    KnownInfected,
    KnownClear,
    KnownImmune,
    Unknown,
    Isolated,
    Masked,
    Alive,
}

impl TargetPool{
    pub fn name(self) -> &'static str
    {
        match self{
            Self::KnownInfected => "infected",
            Self::KnownClear => "clear",
            Self::KnownImmune => "immune",
            Self::Unknown => "unknown",
            Self::Isolated => "isolated",
            Self::Masked => "masked",
            Self::Alive => "alive",
        }
    }
}

/// Seeded generator if a seed is given, otherwise one seeded from entropy
pub fn rng_from_seed(seed: Option<u64>) -> Pcg64
{
    match seed{
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_entropy()
    }
}
