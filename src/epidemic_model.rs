pub mod status;
pub use status::*;
pub mod node_state;
pub use node_state::*;

pub mod options;
pub use options::*;

pub mod health_view;
pub use health_view::*;

pub mod graph;
pub use graph::*;

pub mod disease;
pub use disease::*;

pub mod healthcare;
pub use healthcare::*;

pub mod observation;
pub use observation::*;

pub mod actions;
pub use actions::*;

pub mod scoring;
pub use scoring::*;

pub mod history;
pub use history::*;

pub mod environment;
pub use environment::*;
