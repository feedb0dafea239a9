//! Terminal input parsing and random command generation

use rand::Rng;
use shared::{Command, Team};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown command '{0}' (try +a, -b, inc A, dec B, reset, quit)")]
    UnknownCommand(String),
    #[error("missing or unknown team in '{0}', expected A or B")]
    MissingTeam(String),
}

/// One line typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    Send(Command),
    Quit,
    Empty,
}

fn parse_team(token: &str) -> Option<Team> {
    match token {
        "a" | "A" => Some(Team::A),
        "b" | "B" => Some(Team::B),
        _ => None,
    }
}

/// Parses shorthand (`+a`, `-b`) or words (`inc A`, `decrement b`, `reset`).
pub fn parse_line(line: &str) -> Result<UserInput, InputError> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(UserInput::Empty);
    };
    let rest = words.next();

    let (verb, team) = match (head.chars().next(), head.get(1..)) {
        (Some('+'), Some(team)) if !team.is_empty() => ("inc", Some(team)),
        (Some('-'), Some(team)) if !team.is_empty() => ("dec", Some(team)),
        _ => (head, rest),
    };

    match verb.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => Ok(UserInput::Quit),
        "r" | "reset" => Ok(UserInput::Send(Command::reset())),
        "inc" | "increment" | "+" => team
            .and_then(parse_team)
            .map(|team| UserInput::Send(Command::increment(team)))
            .ok_or_else(|| InputError::MissingTeam(line.to_string())),
        "dec" | "decrement" | "-" => team
            .and_then(parse_team)
            .map(|team| UserInput::Send(Command::decrement(team)))
            .ok_or_else(|| InputError::MissingTeam(line.to_string())),
        _ => Err(InputError::UnknownCommand(line.to_string())),
    }
}

/// Picks a command for load generation. Resets are rare so scores can grow.
pub fn random_command<R: Rng>(rng: &mut R) -> Command {
    let team = if rng.gen_bool(0.5) { Team::A } else { Team::B };
    match rng.gen_range(0..20) {
        0 => Command::reset(),
        1..=6 => Command::decrement(team),
        _ => Command::increment(team),
    }
}
