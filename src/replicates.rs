pub mod policy;
pub use policy::*;

pub mod runner;
pub use runner::*;
