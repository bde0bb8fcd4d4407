use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("a node cannot be observed as infected and clear at once")]
    InfectedAndClear,
    #[error("a node cannot be observed as infected and immune at once")]
    InfectedAndImmune,
}

/// Observed health of a node, i.e., what testing has revealed.
///
/// All flags are private; every mutation goes through [`Status::set`]
/// which applies the coupling rules atomically:
/// * infected forces clear and immune off
/// * clear on forces infected off, clear off forces infected on
/// * immune on forces clear on
/// * death switches everything else off
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct Status {
    alive: bool,
    infected: bool,
    clear: bool,
    immune: bool,
    isolated: bool,
}

/// A single observed fact about a node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusChange {
    Alive(bool),
    Infected(bool),
    Clear(bool),
    Immune(bool),
    Isolated(bool),
}

impl Default for Status {
    fn default() -> Self {
        Self::unknown()
    }
}

impl Status {
    pub fn new(
        alive: bool,
        infected: bool,
        clear: bool,
        immune: bool,
        isolated: bool,
    ) -> Result<Self, StatusError> {
        if infected && clear {
            return Err(StatusError::InfectedAndClear);
        }
        if infected && immune {
            return Err(StatusError::InfectedAndImmune);
        }
        let mut status = Self {
            alive: true,
            infected,
            clear,
            immune,
            isolated,
        };
        if !alive {
            status.set(StatusChange::Alive(false));
        }
        Ok(status)
    }

    /// Alive, but nothing is known about the infection state
    pub const fn unknown() -> Self {
        Self {
            alive: true,
            infected: false,
            clear: false,
            immune: false,
            isolated: false,
        }
    }

    /// Applies `change` together with its coupled flags.
    /// Once dead, every further change is ignored.
    pub fn set(&mut self, change: StatusChange) {
        if !self.alive {
            return;
        }
        match change {
            StatusChange::Alive(alive) => {
                self.alive = alive;
                if !alive {
                    self.infected = false;
                    self.clear = false;
                    self.immune = false;
                    self.isolated = false;
                }
            }
            StatusChange::Infected(infected) => {
                self.infected = infected;
                if infected {
                    self.clear = false;
                    self.immune = false;
                }
            }
            StatusChange::Clear(clear) => {
                self.clear = clear;
                self.infected = !clear;
                if !clear {
                    self.immune = false;
                }
            }
            StatusChange::Immune(immune) => {
                self.immune = immune;
                if immune {
                    self.clear = true;
                    self.infected = false;
                }
            }
            StatusChange::Isolated(isolated) => self.isolated = isolated,
        }
    }

    /// Forget everything learned by testing.
    /// Liveness and isolation are not learned by testing and are kept.
    pub fn reset_to_unknown(&mut self) {
        self.infected = false;
        self.clear = false;
        self.immune = false;
    }

    pub fn alive(&self) -> bool {
        self.alive
    }

    pub fn infected(&self) -> bool {
        self.infected
    }

    pub fn clear(&self) -> bool {
        self.clear
    }

    pub fn immune(&self) -> bool {
        self.immune
    }

    pub fn isolated(&self) -> bool {
        self.isolated
    }

    /// alive, but neither known infected nor known clear
    pub fn is_unknown(&self) -> bool {
        self.alive && !self.infected && !self.clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(status: &Status) {
        assert!(!(status.infected() && status.clear()));
        assert!(!(status.infected() && status.immune()));
        if !status.alive() {
            assert!(!status.infected() && !status.clear() && !status.immune() && !status.isolated());
        }
    }

    #[test]
    fn contradictory_construction_fails() {
        assert_eq!(
            Status::new(true, true, true, false, false),
            Err(StatusError::InfectedAndClear)
        );
        assert_eq!(
            Status::new(true, true, false, true, false),
            Err(StatusError::InfectedAndImmune)
        );
        assert!(Status::new(true, false, true, true, true).is_ok());
    }

    #[test]
    fn dead_construction_clears_flags() {
        let status = Status::new(false, false, true, true, true).unwrap();
        assert!(!status.alive());
        assert_consistent(&status);
    }

    #[test]
    fn coupled_setters() {
        let mut status = Status::unknown();
        assert!(status.is_unknown());

        status.set(StatusChange::Immune(true));
        assert!(status.immune() && status.clear() && !status.infected());

        status.set(StatusChange::Infected(true));
        assert!(status.infected() && !status.clear() && !status.immune());

        status.set(StatusChange::Clear(true));
        assert!(!status.infected() && status.clear());

        status.set(StatusChange::Clear(false));
        assert!(status.infected());

        status.set(StatusChange::Isolated(true));
        status.set(StatusChange::Alive(false));
        assert!(!status.isolated());
        assert_consistent(&status);
    }

    #[test]
    fn every_setter_sequence_is_consistent() {
        let changes = [
            StatusChange::Alive(true),
            StatusChange::Alive(false),
            StatusChange::Infected(true),
            StatusChange::Infected(false),
            StatusChange::Clear(true),
            StatusChange::Clear(false),
            StatusChange::Immune(true),
            StatusChange::Immune(false),
            StatusChange::Isolated(true),
            StatusChange::Isolated(false),
        ];
        // every sequence of length 3 over all changes
        for a in changes {
            for b in changes {
                for c in changes {
                    let mut status = Status::unknown();
                    for change in [a, b, c] {
                        status.set(change);
                        assert_consistent(&status);
                    }
                }
            }
        }
    }

    #[test]
    fn death_is_final() {
        for change in [
            StatusChange::Alive(true),
            StatusChange::Infected(true),
            StatusChange::Clear(true),
            StatusChange::Immune(true),
            StatusChange::Isolated(true),
        ] {
            let mut status = Status::unknown();
            status.set(StatusChange::Alive(false));
            status.set(change);
            assert!(!status.alive(), "{change:?}");
            assert_consistent(&status);
        }
    }

    #[test]
    fn reset_keeps_liveness_and_isolation() {
        let mut status = Status::new(true, false, true, true, true).unwrap();
        status.reset_to_unknown();
        assert!(status.is_unknown());
        assert!(status.isolated());
    }
}
