//! Monitoring states and their severity order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monitoring state of a single result or a whole service.
///
/// The numeric monitoring codes (0..=3) are only used at the boundary to the
/// monitoring core. Comparisons go through [`State::worst`] and [`State::best`]:
/// CRIT is worse than UNKNOWN, which is worse than WARN, which is worse than OK.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    #[default]
    Ok,
    Warn,
    Crit,
    Unknown,
}

impl State {
    /// Monitoring code as understood by the core (0 = OK, 1 = WARN, 2 = CRIT, 3 = UNKNOWN).
    pub fn code(self) -> u8 {
        match self {
            State::Ok => 0,
            State::Warn => 1,
            State::Crit => 2,
            State::Unknown => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(State::Ok),
            1 => Some(State::Warn),
            2 => Some(State::Crit),
            3 => Some(State::Unknown),
            _ => None,
        }
    }

    fn severity(self) -> u8 {
        match self {
            State::Ok => 0,
            State::Warn => 1,
            State::Unknown => 2,
            State::Crit => 3,
        }
    }

    /// The worse of two states.
    pub fn worse(self, other: State) -> State {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// The better of two states.
    pub fn better(self, other: State) -> State {
        if other.severity() < self.severity() {
            other
        } else {
            self
        }
    }

    /// Worst state of all given states, OK for an empty input.
    pub fn worst<I: IntoIterator<Item = State>>(states: I) -> State {
        states.into_iter().fold(State::Ok, State::worse)
    }

    /// Best state of all given states, `None` for an empty input.
    pub fn best<I: IntoIterator<Item = State>>(states: I) -> Option<State> {
        states.into_iter().reduce(State::better)
    }

    /// Marker appended to texts of non-OK results: "", "(!)", "(!!)", "(?)".
    pub fn marker(self) -> &'static str {
        match self {
            State::Ok => "",
            State::Warn => "(!)",
            State::Crit => "(!!)",
            State::Unknown => "(?)",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Ok => "OK",
            State::Warn => "WARN",
            State::Crit => "CRIT",
            State::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worst_prefers_crit_over_unknown() {
        assert_eq!(State::worst([State::Ok, State::Unknown, State::Warn]), State::Unknown);
        assert_eq!(State::worst([State::Unknown, State::Crit]), State::Crit);
        assert_eq!(State::worst([]), State::Ok);
    }

    #[test]
    fn test_best() {
        assert_eq!(State::best([State::Crit, State::Warn]), Some(State::Warn));
        assert_eq!(State::best([State::Crit, State::Unknown]), Some(State::Unknown));
        assert_eq!(State::best(Vec::new()), None);
    }

    #[test]
    fn test_codes() {
        for state in [State::Ok, State::Warn, State::Crit, State::Unknown] {
            assert_eq!(State::from_code(state.code() as i64), Some(state));
        }
        assert_eq!(State::from_code(4), None);
    }
}
