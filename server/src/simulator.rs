//! Periodic score generator for demos and as a keepalive source.

use log::{error, info};
use shared::{Command, Team};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::processor::CommandProcessor;

/// Team scored on the given tick: A on even ticks, B on odd ones.
pub fn team_for_tick(tick: u64) -> Team {
    if tick % 2 == 0 {
        Team::A
    } else {
        Team::B
    }
}

/// Increments one team every `period` through the same path as client commands.
pub struct Simulator {
    processor: Arc<CommandProcessor>,
    period: Duration,
    tick: u64,
}

impl Simulator {
    pub fn new(processor: Arc<CommandProcessor>, period: Duration) -> Self {
        Self {
            processor,
            period,
            tick: 0,
        }
    }

    /// Applies and broadcasts the next simulated point.
    pub async fn step(&mut self) {
        let command = Command::increment(team_for_tick(self.tick));
        self.tick += 1;

        if let Err(e) = self.processor.submit(&command).await {
            error!("Simulator failed to broadcast: {}", e);
        }
    }

    pub async fn run(mut self) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick since it fires immediately
        timer.tick().await;
        info!("Score simulator running every {:?}", self.period);

        loop {
            timer.tick().await;
            self.step().await;
        }
    }
}
