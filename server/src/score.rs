//! Authoritative score state shared by every connection.

use parking_lot::Mutex;
use shared::{Action, Command, ScoreSnapshot, Team};

/// The two team scores. Both are unsigned, so the floor at zero is enforced
/// by [`ScoreState::apply`] refusing to decrement past it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreState {
    pub score_a: u64,
    pub score_b: u64,
}

impl ScoreState {
    /// Both scores start at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a command in place and reports whether anything changed.
    pub fn apply(&mut self, command: &Command) -> bool {
        match command.action {
            Action::Increment => match self.team_mut(command.team) {
                Some(score) => {
                    *score = score.saturating_add(1);
                    true
                }
                None => false,
            },
            Action::Decrement => match self.team_mut(command.team) {
                Some(score) if *score > 0 => {
                    *score -= 1;
                    true
                }
                _ => false,
            },
            Action::Reset => {
                self.score_a = 0;
                self.score_b = 0;
                true
            }
            Action::Unknown => false,
        }
    }

    /// Copies the current scores into a wire snapshot.
    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot::new(self.score_a, self.score_b)
    }

    fn team_mut(&mut self, team: Team) -> Option<&mut u64> {
        match team {
            Team::A => Some(&mut self.score_a),
            Team::B => Some(&mut self.score_b),
            Team::Other => None,
        }
    }
}

/// Lock-guarded [`ScoreState`]. One instance lives for the whole server and
/// is handed to the command processor and the simulator.
#[derive(Debug, Default)]
pub struct SharedScore {
    state: Mutex<ScoreState>,
}

impl SharedScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-modify-write under the state lock. The returned snapshot is the
    /// state this call produced, even when `applied` is false.
    pub fn apply(&self, command: &Command) -> (ScoreSnapshot, bool) {
        let mut state = self.state.lock();
        let applied = state.apply(command);
        (state.snapshot(), applied)
    }

    /// Reads both scores under the lock, so the pair is always consistent.
    pub fn snapshot(&self) -> ScoreSnapshot {
        self.state.lock().snapshot()
    }
}
