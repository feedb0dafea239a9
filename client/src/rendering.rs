use shared::ScoreSnapshot;

/// Formats scoreboard updates as terminal lines.
#[derive(Debug, Default)]
pub struct Renderer {
    updates: u64,
    last: Option<ScoreSnapshot>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn last(&self) -> Option<ScoreSnapshot> {
        self.last
    }

    /// Records a snapshot and returns the line to print for it.
    ///
    /// Repeated identical snapshots are still shown, marked as unchanged.
    pub fn render(&mut self, snapshot: ScoreSnapshot) -> String {
        self.updates += 1;
        let unchanged = self.last == Some(snapshot);
        self.last = Some(snapshot);

        let mut line = format!(
            "[{:>4}] Team A {:>3} : {:<3} Team B",
            self.updates, snapshot.score_a, snapshot.score_b
        );
        if unchanged {
            line.push_str("  (unchanged)");
        }
        line
    }
}
