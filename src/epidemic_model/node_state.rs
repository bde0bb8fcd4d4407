use {
    serde::{Serialize, Deserialize},
    net_ensembles::Node,
    super::Status
};

pub type NodeId = usize;

/// True health of a person in the population plus the
/// observed [`Status`] that testing has produced so far.
#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct NodeState {
    pub alive: bool,
    /// 0 if healthy, otherwise the number of steps the node has been infected
    pub infected: u32,
    /// protection strength in [0,1]
    pub immune: f64,
    /// mask protection strength in [0,1], 0 means unmasked
    pub mask: f64,
    pub isolated: bool,
    /// neighbours cut off by isolation, needed for reconnecting
    pub removed_edges: Vec<NodeId>,
    pub status: Status,
    /// step of the most recent test, `None` if never tested
    pub last_tested: Option<usize>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            alive: true,
            infected: 0,
            immune: 0.0,
            mask: 0.0,
            isolated: false,
            removed_edges: Vec::new(),
            status: Status::unknown(),
            last_tested: None,
        }
    }
}

impl NodeState {
    pub fn is_infected(&self) -> bool {
        self.alive && self.infected > 0
    }

    pub fn is_clear(&self) -> bool {
        self.alive && self.infected == 0
    }

    pub fn is_immune(&self, threshold: f64) -> bool {
        self.is_clear() && self.immune > 0.0 && self.immune >= threshold
    }

    pub fn is_masked(&self) -> bool {
        self.alive && self.mask > 0.0
    }

    pub fn is_isolated(&self) -> bool {
        self.alive && self.isolated
    }

    pub fn was_tested_at(&self, step: usize) -> bool {
        self.last_tested == Some(step)
    }

    /// death voids every other health attribute
    pub fn kill(&mut self) {
        self.alive = false;
        self.infected = 0;
        self.immune = 0.0;
        self.isolated = false;
        self.removed_edges.clear();
    }
}

impl Node for NodeState {
    fn new_from_index(_index: usize) -> Self {
        NodeState::default()
    }
}
